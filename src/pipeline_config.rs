//! Analyzer configuration.
//!
//! Every threshold the layout pipeline relies on lives here: region geometry,
//! OCR variants, word filtering, line quantization, name similarity and the
//! page cap. Defaults reproduce the empirically chosen values; callers with a
//! labeled prescription corpus can tune them from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::layout::types::{OcrConfig, RegionKind};
use crate::pipeline::layout::AnalysisError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Vertical slice of a page, as fractions of page height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub top: f32,
    pub bottom: f32,
}

impl Band {
    pub const fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }
}

/// Proportional page map, one band per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionBounds {
    pub header: Band,
    pub patient_info: Band,
    pub prescription_area: Band,
    pub footer: Band,
}

impl Default for RegionBounds {
    fn default() -> Self {
        Self {
            header: Band::new(0.0, 0.15),
            patient_info: Band::new(0.15, 0.30),
            prescription_area: Band::new(0.30, 0.75),
            footer: Band::new(0.75, 1.0),
        }
    }
}

impl RegionBounds {
    pub fn band(&self, kind: RegionKind) -> Band {
        match kind {
            RegionKind::Header => self.header,
            RegionKind::PatientInfo => self.patient_info,
            RegionKind::PrescriptionArea => self.prescription_area,
            RegionKind::Footer => self.footer,
        }
    }
}

/// Tunables for the whole layout pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Where each region sits on the page.
    pub region_bounds: RegionBounds,
    /// OCR variant used to read each region's text.
    pub region_config: OcrConfig,
    /// OCR variants re-run on the prescription area for word-level output.
    pub line_configs: Vec<OcrConfig>,
    /// Words below this OCR confidence (0-100 scale) are dropped.
    pub word_confidence_floor: f32,
    /// Words with fewer characters are dropped.
    pub min_word_chars: usize,
    /// Vertical quantization step for line bucketing, in pixels.
    pub line_height_px: u32,
    /// Names up to this length may match on length difference alone.
    pub similarity_short_len: usize,
    /// Maximum length difference for two short names to be similar.
    pub similarity_len_delta: usize,
    /// Confidence assigned to every medication candidate.
    pub baseline_medication_confidence: f32,
    /// Replace the baseline with completeness / 6 at output time.
    pub completeness_confidence: bool,
    /// Snap near-miss drug names onto the built-in lexicon.
    pub correct_drug_names: bool,
    /// Hard cap on pages per document; larger documents are rejected.
    pub max_pages: usize,
    /// Results below this confidence are flagged for manual review.
    pub review_threshold: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            region_bounds: RegionBounds::default(),
            region_config: OcrConfig::Block,
            line_configs: vec![
                OcrConfig::SparseBlock,
                OcrConfig::SingleWord,
                OcrConfig::SingleLine,
                OcrConfig::SingleColumn,
            ],
            word_confidence_floor: 30.0,
            min_word_chars: 2,
            line_height_px: 10,
            similarity_short_len: 8,
            similarity_len_delta: 2,
            baseline_medication_confidence: 0.7,
            completeness_confidence: false,
            correct_drug_names: true,
            max_pages: 10,
            review_threshold: 0.7,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading & validation
// ═══════════════════════════════════════════════════════════

impl AnalyzerConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject settings that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for kind in RegionKind::ALL {
            let band = self.region_bounds.band(kind);
            let in_range = (0.0..=1.0).contains(&band.top) && (0.0..=1.0).contains(&band.bottom);
            if !in_range || band.top >= band.bottom {
                return Err(AnalysisError::Config(format!(
                    "region {kind} has invalid band {:.2}..{:.2}",
                    band.top, band.bottom
                )));
            }
        }
        if self.line_height_px == 0 {
            return Err(AnalysisError::Config("line_height_px must be positive".into()));
        }
        if self.line_configs.is_empty() {
            return Err(AnalysisError::Config("line_configs must not be empty".into()));
        }
        if self.max_pages == 0 {
            return Err(AnalysisError::Config("max_pages must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.baseline_medication_confidence) {
            return Err(AnalysisError::Config(
                "baseline_medication_confidence must lie in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(AnalysisError::Config("review_threshold must lie in [0, 1]".into()));
        }
        if !(0.0..=100.0).contains(&self.word_confidence_floor) {
            return Err(AnalysisError::Config(
                "word_confidence_floor must lie in [0, 100]".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AnalyzerConfig::default().validate().unwrap();
    }

    #[test]
    fn default_bands_tile_the_page() {
        let bounds = RegionBounds::default();
        assert_eq!(bounds.header.top, 0.0);
        assert_eq!(bounds.header.bottom, bounds.patient_info.top);
        assert_eq!(bounds.patient_info.bottom, bounds.prescription_area.top);
        assert_eq!(bounds.prescription_area.bottom, bounds.footer.top);
        assert_eq!(bounds.footer.bottom, 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalyzerConfig::from_json_str(r#"{"line_height_px": 12}"#).unwrap();
        assert_eq!(config.line_height_px, 12);
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.line_configs.len(), 4);
    }

    #[test]
    fn ocr_variants_deserialize_snake_case() {
        let config =
            AnalyzerConfig::from_json_str(r#"{"line_configs": ["single_line", "sparse_block"]}"#)
                .unwrap();
        assert_eq!(
            config.line_configs,
            vec![OcrConfig::SingleLine, OcrConfig::SparseBlock]
        );
    }

    #[test]
    fn inverted_band_rejected() {
        let json = r#"{"region_bounds": {"footer": {"top": 0.9, "bottom": 0.8}}}"#;
        let err = AnalyzerConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
        assert!(err.to_string().contains("footer"));
    }

    #[test]
    fn zero_line_height_rejected() {
        let err = AnalyzerConfig::from_json_str(r#"{"line_height_px": 0}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn empty_variant_list_rejected() {
        let err = AnalyzerConfig::from_json_str(r#"{"line_configs": []}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = AnalyzerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, AnalysisError::Json(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rxlens.json");
        std::fs::write(&path, r#"{"max_pages": 3, "completeness_confidence": true}"#).unwrap();

        let config = AnalyzerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_pages, 3);
        assert!(config.completeness_confidence);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnalyzerConfig::from_json_file(Path::new("/nonexistent/rxlens.json")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AnalyzerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"region_config\":\"block\""));
        assert_eq!(AnalyzerConfig::from_json_str(&json).unwrap(), config);
    }
}
