use image::DynamicImage;

use super::catalog::PatternCatalog;
use super::confidence::{
    completeness_confidence, confidence_level, layout_confidence, section_confidence,
};
use super::correction::correct_drug_name;
use super::dedup::Deduplicator;
use super::instructions::extract_instructions;
use super::lines::{GroupedLines, LineGrouper};
use super::medication::MedicationParser;
use super::segment::{crop_region, RegionSegmenter};
use super::types::{AnalysisResult, OcrEngine, Region, RegionKind, RegionTexts, Word};
use crate::pipeline_config::AnalyzerConfig;

/// Text-level fusion: everything after OCR.
///
/// Usable on its own by callers that run their own recognizer.
pub struct LayoutFusion {
    config: AnalyzerConfig,
    catalog: &'static PatternCatalog,
}

impl LayoutFusion {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            catalog: PatternCatalog::shared(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fuse already-recognized region texts and prescription-area word lists
    /// (one list per OCR variant).
    pub fn analyze_texts(&self, texts: &RegionTexts, word_lists: &[Vec<Word>]) -> AnalysisResult {
        let sections = texts
            .iter()
            .filter_map(|(&kind, text)| {
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!(region = %kind, "Region unavailable: no text");
                    return None;
                }
                Some(Region {
                    kind,
                    bounding_box: None,
                    raw_text: text.to_string(),
                    confidence: section_confidence(kind, text, self.catalog),
                })
            })
            .collect();

        let lines = LineGrouper::new(&self.config).from_word_lists(word_lists);
        self.fuse(sections, lines)
    }

    /// Sections must be in region order.
    pub(crate) fn fuse(&self, sections: Vec<Region>, lines: GroupedLines) -> AnalysisResult {
        if sections.is_empty() && lines.is_empty() {
            tracing::warn!("No region produced usable text");
            return AnalysisResult::failed();
        }

        let prescription_area = sections
            .iter()
            .find(|s| s.kind == RegionKind::PrescriptionArea);

        // Step 1: parse grouped lines, then the prescription area's own text
        let parser = MedicationParser::new(self.catalog, self.config.baseline_medication_confidence);
        let mut candidates = parser.parse_lines(lines.iter());
        if let Some(area) = prescription_area {
            candidates.extend(parser.parse_block(&area.raw_text));
        }
        let candidate_count = candidates.len();

        // Step 2: snap OCR-mangled names onto the lexicon
        if self.config.correct_drug_names {
            for candidate in &mut candidates {
                candidate.name = correct_drug_name(&candidate.name);
            }
        }

        // Step 3: collapse duplicates
        let mut medications = Deduplicator::new(&self.config).deduplicate(candidates);

        if self.config.completeness_confidence {
            for medication in &mut medications {
                medication.confidence = completeness_confidence(medication);
            }
        }

        // Step 4: free-standing instructions across all sections
        let instructions = extract_instructions(
            sections.iter().map(|s| s.raw_text.as_str()),
            self.catalog,
        );

        // Step 5: score
        let confidence = layout_confidence(
            sections.len(),
            medications.len(),
            instructions.len(),
            prescription_area.is_some(),
        );
        let confidence_level = confidence_level(confidence, true);
        let requires_review = confidence < self.config.review_threshold;

        tracing::info!(
            sections = sections.len(),
            lines = lines.len(),
            candidates = candidate_count,
            medications = medications.len(),
            instructions = instructions.len(),
            confidence,
            "Layout analysis complete"
        );

        AnalysisResult {
            success: true,
            layout_detected: !sections.is_empty(),
            sections,
            medications,
            instructions,
            confidence,
            confidence_level,
            requires_review,
        }
    }
}

/// Page analyzer: region OCR, line recovery, then fusion.
/// Holds the OCR engine as a trait object for dependency injection.
pub struct LayoutAnalyzer {
    engine: Box<dyn OcrEngine + Send + Sync>,
    fusion: LayoutFusion,
}

impl LayoutAnalyzer {
    pub fn new(engine: Box<dyn OcrEngine + Send + Sync>, config: AnalyzerConfig) -> Self {
        Self {
            engine,
            fusion: LayoutFusion::new(config),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        self.fusion.config()
    }

    /// Analyze one rasterized page. Never fails: an unreadable page comes
    /// back with `success = false` and zero confidence.
    pub fn analyze(&self, page: &DynamicImage) -> AnalysisResult {
        let config = self.fusion.config();
        let catalog = PatternCatalog::shared();

        let segmenter = RegionSegmenter::new(
            &*self.engine,
            &config.region_bounds,
            config.region_config,
            catalog,
        );
        let regions = segmenter.segment(page);

        // Join barrier: every region call has returned before lines are parsed
        let lines = match crop_region(page, RegionKind::PrescriptionArea, &config.region_bounds) {
            Ok((_, crop)) => LineGrouper::new(config).recognize_lines(
                &*self.engine,
                &crop,
                RegionKind::PrescriptionArea,
                &config.line_configs,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping line recovery");
                GroupedLines::default()
            }
        };

        self.fusion.fuse(regions.into_values().collect(), lines)
    }

    /// Same fusion on already-recognized text.
    pub fn analyze_texts(&self, texts: &RegionTexts, word_lists: &[Vec<Word>]) -> AnalysisResult {
        self.fusion.analyze_texts(texts, word_lists)
    }
}
