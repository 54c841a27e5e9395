//! Pattern Catalog: section keywords, medication-shape and field patterns,
//! instruction phrases and the medical abbreviation map.
//!
//! Built once and shared read-only by every pipeline stage. Regexes are
//! compiled at construction; each is used as a pure `text -> matches` function.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::types::RegionKind;

static SHARED: LazyLock<PatternCatalog> = LazyLock::new(PatternCatalog::new);

/// Medical shorthand found on prescriptions, lower-case.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("r/f", "as required"),
    ("rf", "as required"),
    ("bd", "twice daily"),
    ("tds", "three times daily"),
    ("qds", "four times daily"),
    ("od", "once daily"),
    ("sos", "as needed"),
    ("ac", "before meals"),
    ("pc", "after meals"),
    ("hs", "at bedtime"),
];

/// Words the catalog itself uses to describe a dose. Never a drug name.
const DOSE_VOCABULARY: &[&str] = &[
    "mg", "ml", "gm", "mcg", "gel", "cream", "ointment", "tablet", "tablets", "tab", "tabs",
    "cap", "caps", "capsule", "capsules", "syrup", "day", "days", "week", "weeks", "month",
    "months", "daily", "twice", "thrice", "once", "times", "time", "meal", "meals", "before",
    "after", "bedtime", "morning", "night", "evening", "apply", "take", "use", "rx", "food",
    "empty", "stomach", "breakfast", "lunch", "dinner", "water", "milk",
];

/// Stop-words rejected by the name heuristic.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "date", "age", "sex",
];

/// Endings typical of ordinary adjectives and nouns on address lines and headers.
const NON_MEDICAL_SUFFIXES: &[&str] = &[
    "ing", "ness", "less", "ful", "ous", "ical", "able", "ible", "ly", "ive", "one",
];

/// Endings typical of generic drug names. These override `NON_MEDICAL_SUFFIXES`.
const DRUG_SUFFIXES: &[&str] = &[
    "cin", "zole", "pril", "olol", "ine", "ate", "ide", "mycin", "cillin", "statin", "sartan",
    "sone", "done", "zone",
];

pub struct PatternCatalog {
    medication_shapes: Vec<Regex>,
    dosage: Regex,
    form: Regex,
    frequency: Regex,
    duration: Regex,
    instruction_abbreviation: Regex,
    instruction_phrases: Vec<Regex>,
    abbreviations: HashMap<&'static str, &'static str>,
    vocabulary: HashSet<&'static str>,
    stop_words: HashSet<&'static str>,
}

impl PatternCatalog {
    /// Process-wide catalog. Construction happens on first use.
    pub fn shared() -> &'static PatternCatalog {
        &SHARED
    }

    pub fn new() -> Self {
        let medication_shapes = vec![
            // Name followed by a dosage form: "Mupirocin gel", "Amoxil caps"
            Regex::new(r"(?i)\b[a-z]{3,}\s+(?:ointment|cream|gel|tablets?|tabs?|capsules?|caps?|syrup)\b").unwrap(),
            // Name followed by a strength: "Paracetamol 500mg", "Cetirizine 10 mg"
            Regex::new(r"(?i)\b[a-z]{3,}\s*\d+(?:\.\d+)?\s*(?:mg|ml|gm|g)\b").unwrap(),
            // Compact "as required" shorthand: "Mupirocin/rf", "Fusidic r/f"
            Regex::new(r"(?i)\b[a-z]{3,}(?:\s*/\s*|\s+)r/?f\b").unwrap(),
        ];

        let instruction_phrases = vec![
            Regex::new(r"(?i)\bapply\s+[^.\n]*").unwrap(),
            Regex::new(r"(?i)\btake\s+[^.\n]*").unwrap(),
            Regex::new(r"(?i)\buse\s+[^.\n]*").unwrap(),
            Regex::new(r"(?i)\b\d+\s*times?\s+daily\b").unwrap(),
            Regex::new(r"(?i)\bbefore\s+meals?\b").unwrap(),
            Regex::new(r"(?i)\bafter\s+meals?\b").unwrap(),
            Regex::new(r"(?i)\bat\s+bedtime\b").unwrap(),
        ];

        Self {
            medication_shapes,
            dosage: Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:mg|ml|gm|g)\b").unwrap(),
            form: Regex::new(r"(?i)\b(?:ointment|cream|gel|tablets?|capsules?|caps?|syrup)\b").unwrap(),
            frequency: Regex::new(r"(?i)\b(?:\d+\s*x\s*\d+|bd|tds|od|qds)\b").unwrap(),
            duration: Regex::new(r"(?i)\b\d+\s*(?:weeks?|days?|months?)\b").unwrap(),
            instruction_abbreviation: Regex::new(r"(?i)(?:\br/f\b|\b(?:rf|sos|ac|pc|hs)\b)").unwrap(),
            instruction_phrases,
            abbreviations: ABBREVIATIONS.iter().copied().collect(),
            vocabulary: DOSE_VOCABULARY
                .iter()
                .copied()
                .chain(ABBREVIATIONS.iter().map(|(abbr, _)| *abbr))
                .collect(),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Keywords expected in each region's text, lower-case.
    pub fn section_keywords(&self, kind: RegionKind) -> &'static [&'static str] {
        match kind {
            RegionKind::Header => &["dr.", "clinic", "hospital", "physician"],
            RegionKind::PatientInfo => &["name:", "age:", "sex:", "date:"],
            RegionKind::PrescriptionArea => &["rx", "r/", "medicines"],
            RegionKind::Footer => &["address", "phone", "appointment"],
        }
    }

    /// Expand a shorthand token ("bd", "R/F") to its meaning.
    pub fn expand_abbreviation(&self, token: &str) -> Option<&'static str> {
        self.abbreviations
            .get(token.to_lowercase().as_str())
            .copied()
    }

    pub fn medication_shapes(&self) -> &[Regex] {
        &self.medication_shapes
    }

    pub fn dosage(&self) -> &Regex {
        &self.dosage
    }

    pub fn form(&self) -> &Regex {
        &self.form
    }

    pub fn frequency(&self) -> &Regex {
        &self.frequency
    }

    pub fn duration(&self) -> &Regex {
        &self.duration
    }

    pub fn instruction_abbreviation(&self) -> &Regex {
        &self.instruction_abbreviation
    }

    pub fn instruction_phrases(&self) -> &[Regex] {
        &self.instruction_phrases
    }

    pub fn is_stop_word(&self, lower: &str) -> bool {
        self.stop_words.contains(lower)
    }

    /// Dose vocabulary and abbreviation keys.
    pub fn is_vocabulary(&self, lower: &str) -> bool {
        self.vocabulary.contains(lower)
    }

    pub fn has_drug_suffix(&self, lower: &str) -> bool {
        DRUG_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
    }

    pub fn has_non_medical_suffix(&self, lower: &str) -> bool {
        NON_MEDICAL_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static PatternCatalog {
        PatternCatalog::shared()
    }

    #[test]
    fn abbreviations_expand_case_insensitively() {
        assert_eq!(catalog().expand_abbreviation("bd"), Some("twice daily"));
        assert_eq!(catalog().expand_abbreviation("TDS"), Some("three times daily"));
        assert_eq!(catalog().expand_abbreviation("R/F"), Some("as required"));
        assert_eq!(catalog().expand_abbreviation("hs"), Some("at bedtime"));
        assert_eq!(catalog().expand_abbreviation("xyz"), None);
    }

    #[test]
    fn every_region_has_keywords() {
        for kind in RegionKind::ALL {
            let keywords = catalog().section_keywords(kind);
            assert!(!keywords.is_empty(), "{kind} has no keywords");
            assert!(keywords.iter().all(|k| *k == k.to_lowercase()));
        }
    }

    #[test]
    fn dosage_shape_matches_name_and_strength() {
        let shape = &catalog().medication_shapes()[1];
        let m = shape.find("Paracetamol 500mg bd x 5 days").unwrap();
        assert_eq!(m.as_str(), "Paracetamol 500mg");
        assert!(shape.find("Age: 40").is_none());
    }

    #[test]
    fn form_shape_matches_topicals() {
        let shape = &catalog().medication_shapes()[0];
        assert_eq!(shape.find("Mupirocin gel apply").unwrap().as_str(), "Mupirocin gel");
        assert_eq!(shape.find("AMOXIL CAPS").unwrap().as_str(), "AMOXIL CAPS");
        assert!(shape.find("angel").is_none());
    }

    #[test]
    fn form_shape_needs_space_before_form() {
        let shape = &catalog().medication_shapes()[0];
        for word in ["Handicap", "Nightcap", "Cudgel", "syrupy nightcap"] {
            assert!(shape.find(word).is_none(), "{word} matched");
        }
    }

    #[test]
    fn shorthand_shape_matches_slash_rf() {
        let shape = &catalog().medication_shapes()[2];
        assert_eq!(shape.find("Mupirocin/rf").unwrap().as_str(), "Mupirocin/rf");
        assert_eq!(shape.find("Fusidic r/f").unwrap().as_str(), "Fusidic r/f");
        assert!(shape.find("Smurf").is_none());
    }

    #[test]
    fn frequency_needs_word_boundaries() {
        assert!(catalog().frequency().find("after food").is_none());
        assert_eq!(catalog().frequency().find("1 tab bd").unwrap().as_str(), "bd");
        assert_eq!(catalog().frequency().find("2 x 3").unwrap().as_str(), "2 x 3");
    }

    #[test]
    fn instruction_abbreviation_ignores_embedded_letters() {
        assert!(catalog().instruction_abbreviation().find("Paracetamol").is_none());
        assert_eq!(
            catalog().instruction_abbreviation().find("1 tab sos").unwrap().as_str(),
            "sos"
        );
        assert_eq!(
            catalog().instruction_abbreviation().find("gel r/f").unwrap().as_str(),
            "r/f"
        );
    }

    #[test]
    fn dosage_rejects_words_starting_with_unit_letter() {
        assert!(catalog().dosage().find("2 gel").is_none());
        assert_eq!(catalog().dosage().find("2.5 ml").unwrap().as_str(), "2.5 ml");
    }

    #[test]
    fn vocabulary_includes_abbreviation_keys() {
        assert!(catalog().is_vocabulary("days"));
        assert!(catalog().is_vocabulary("tds"));
        assert!(!catalog().is_vocabulary("paracetamol"));
    }

    #[test]
    fn meal_timing_words_are_vocabulary() {
        for word in ["food", "empty", "stomach", "breakfast"] {
            assert!(catalog().is_vocabulary(word), "{word}");
        }
    }

    #[test]
    fn drug_suffixes_detected() {
        assert!(catalog().has_drug_suffix("azithromycin"));
        assert!(catalog().has_drug_suffix("omeprazole"));
        assert!(!catalog().has_drug_suffix("morning"));
        assert!(catalog().has_non_medical_suffix("morning"));
    }
}
