use super::catalog::PatternCatalog;
use super::types::{ConfidenceLevel, Medication, RegionKind};

/// Confidence thresholds used by the scorer and reviewers
pub mod thresholds {
    /// At or above this: little to review.
    pub const HIGH: f32 = 0.80;

    /// At or above this: partial structure recovered.
    pub const MEDIUM: f32 = 0.50;
}

/// Score weights. Heuristic coverage, not a probability.
mod weights {
    pub const SECTION_BASE: f32 = 0.3;
    pub const KEYWORD_HIT: f32 = 0.2;
    pub const LENGTH_BONUS: f32 = 0.2;

    pub const LAYOUT_BASE: f32 = 0.3;
    pub const PER_ITEM: f32 = 0.1;
    pub const SECTIONS_CAP: f32 = 0.3;
    pub const MEDICATIONS_CAP: f32 = 0.3;
    pub const INSTRUCTIONS_CAP: f32 = 0.2;
    pub const PRESCRIPTION_AREA_BONUS: f32 = 0.2;
}

/// Plausible character-length band for a section's text.
const PLAUSIBLE_SECTION_CHARS: std::ops::RangeInclusive<usize> = 10..=200;

/// Most fields a medication can have populated, name included.
const MAX_COMPLETENESS: f32 = 6.0;

/// Section confidence from expected-keyword coverage and text length.
pub fn section_confidence(kind: RegionKind, text: &str, catalog: &PatternCatalog) -> f32 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    let lower = text.to_lowercase();
    let hits = catalog
        .section_keywords(kind)
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count();

    let mut confidence = weights::SECTION_BASE + weights::KEYWORD_HIT * hits as f32;

    if PLAUSIBLE_SECTION_CHARS.contains(&text.chars().count()) {
        confidence += weights::LENGTH_BONUS;
    }

    confidence.min(1.0)
}

/// Overall confidence for a page. Never decreases as any count grows.
pub fn layout_confidence(
    sections_found: usize,
    medications_found: usize,
    instructions_found: usize,
    prescription_area_found: bool,
) -> f32 {
    let capped = |count: usize, cap: f32| (count as f32 * weights::PER_ITEM).min(cap);

    let mut confidence = weights::LAYOUT_BASE
        + capped(sections_found, weights::SECTIONS_CAP)
        + capped(medications_found, weights::MEDICATIONS_CAP)
        + capped(instructions_found, weights::INSTRUCTIONS_CAP);

    if prescription_area_found {
        confidence += weights::PRESCRIPTION_AREA_BONUS;
    }

    confidence.clamp(0.0, 1.0)
}

/// Completeness-derived medication confidence.
pub fn completeness_confidence(medication: &Medication) -> f32 {
    (medication.completeness() as f32 / MAX_COMPLETENESS).clamp(0.0, 1.0)
}

/// Bucket a page confidence for reviewers.
pub fn confidence_level(confidence: f32, success: bool) -> ConfidenceLevel {
    if !success {
        ConfidenceLevel::Failed
    } else if confidence >= thresholds::HIGH {
        ConfidenceLevel::High
    } else if confidence >= thresholds::MEDIUM {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static PatternCatalog {
        PatternCatalog::shared()
    }

    fn med(fields: usize) -> Medication {
        let pick = |i: usize| if fields > i { "x".to_string() } else { String::new() };
        Medication {
            name: "Paracetamol".into(),
            dosage: pick(0),
            form: pick(1),
            frequency: pick(2),
            duration: pick(3),
            instructions: pick(4),
            raw_text: String::new(),
            confidence: 0.7,
        }
    }

    #[test]
    fn header_keywords_and_length_bonus() {
        // 0.3 base + 2 keywords + length bonus
        let conf = section_confidence(RegionKind::Header, "Dr. Smith Clinic", catalog());
        assert!((conf - 0.9).abs() < 1e-6, "Expected 0.9, got {conf}");
    }

    #[test]
    fn short_text_gets_no_length_bonus() {
        let conf = section_confidence(RegionKind::Footer, "phone", catalog());
        assert!((conf - 0.5).abs() < 1e-6, "Expected 0.5, got {conf}");
    }

    #[test]
    fn keyword_from_another_region_does_not_count() {
        let conf = section_confidence(RegionKind::Footer, "Dr. Smith Clinic", catalog());
        assert!((conf - 0.5).abs() < 1e-6, "Expected 0.5, got {conf}");
    }

    #[test]
    fn section_confidence_capped_at_one() {
        let text = "Name: John Doe Age: 40 Sex: M Date: 2024-01-01";
        let conf = section_confidence(RegionKind::PatientInfo, text, catalog());
        assert_eq!(conf, 1.0);
    }

    #[test]
    fn empty_section_scores_zero() {
        assert_eq!(section_confidence(RegionKind::Header, "   ", catalog()), 0.0);
    }

    #[test]
    fn overlong_section_loses_length_bonus() {
        let text = "clinic ".repeat(40);
        let conf = section_confidence(RegionKind::Header, &text, catalog());
        assert!((conf - 0.5).abs() < 1e-6, "Expected 0.5, got {conf}");
    }

    #[test]
    fn layout_confidence_bounds() {
        assert!((layout_confidence(0, 0, 0, false) - 0.3).abs() < 1e-6);
        assert_eq!(layout_confidence(100, 100, 100, true), 1.0);
        for s in 0..6 {
            for m in 0..6 {
                for i in 0..6 {
                    for p in [false, true] {
                        let conf = layout_confidence(s, m, i, p);
                        assert!((0.0..=1.0).contains(&conf));
                    }
                }
            }
        }
    }

    #[test]
    fn layout_confidence_monotonic_in_medications() {
        for s in 0..5 {
            for i in 0..5 {
                for p in [false, true] {
                    for m in 0..8 {
                        assert!(
                            layout_confidence(s, m + 1, i, p) >= layout_confidence(s, m, i, p),
                            "adding a medication lowered confidence at s={s} m={m} i={i} p={p}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn prescription_area_bonus_applies() {
        let without = layout_confidence(2, 1, 0, false);
        let with = layout_confidence(2, 1, 0, true);
        assert!((with - without - 0.2).abs() < 1e-6);
    }

    #[test]
    fn completeness_confidence_scales_with_fields() {
        assert!((completeness_confidence(&med(0)) - 1.0 / 6.0).abs() < 1e-6);
        assert_eq!(completeness_confidence(&med(5)), 1.0);
        assert!(completeness_confidence(&med(2)) < completeness_confidence(&med(3)));
    }

    #[test]
    fn confidence_levels() {
        assert_eq!(confidence_level(0.95, true), ConfidenceLevel::High);
        assert_eq!(confidence_level(0.6, true), ConfidenceLevel::Medium);
        assert_eq!(confidence_level(0.3, true), ConfidenceLevel::Low);
        assert_eq!(confidence_level(0.95, false), ConfidenceLevel::Failed);
    }

    #[test]
    fn threshold_constants_are_ordered() {
        assert!(thresholds::MEDIUM < thresholds::HIGH);
    }
}
