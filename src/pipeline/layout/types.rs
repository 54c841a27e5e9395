use std::collections::BTreeMap;
use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::OcrError;

/// Coarse semantic region of a prescription page, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Header,
    PatientInfo,
    PrescriptionArea,
    Footer,
}

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [
        RegionKind::Header,
        RegionKind::PatientInfo,
        RegionKind::PrescriptionArea,
        RegionKind::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Header => "header",
            RegionKind::PatientInfo => "patient_info",
            RegionKind::PrescriptionArea => "prescription_area",
            RegionKind::Footer => "footer",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OCR engine configuration variant.
///
/// Each variant maps to a Tesseract page-segmentation mode; other engines
/// may interpret them however suits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrConfig {
    /// Uniform block of text. Used for whole-region reads.
    Block,
    /// Sparse text, no particular order. Best recall on handwriting.
    SparseBlock,
    SingleWord,
    SingleLine,
    /// Single column of variably sized text.
    SingleColumn,
}

impl OcrConfig {
    pub fn tesseract_args(&self) -> &'static str {
        match self {
            OcrConfig::Block => "--psm 6 --oem 3",
            OcrConfig::SparseBlock => "--psm 11 --oem 3",
            OcrConfig::SingleWord => "--psm 8 --oem 1",
            OcrConfig::SingleLine => "--psm 7 --oem 3",
            OcrConfig::SingleColumn => "--psm 4 --oem 3",
        }
    }
}

impl fmt::Display for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tesseract_args())
    }
}

/// Pixel rectangle on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One recognized word. Confidence is on the engine's 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bounding_box: BoundingBox,
    pub confidence: f32,
}

/// A detected page section with its recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(rename = "name")]
    pub kind: RegionKind,
    /// `None` when the text was supplied directly rather than cropped.
    pub bounding_box: Option<BoundingBox>,
    #[serde(rename = "text")]
    pub raw_text: String,
    pub confidence: f32,
}

/// A structured medication entry. Empty strings mean "not found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub form: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub raw_text: String,
    pub confidence: f32,
}

impl Medication {
    /// Populated structured fields (excluding name).
    pub fn populated_details(&self) -> usize {
        [
            &self.dosage,
            &self.form,
            &self.frequency,
            &self.duration,
            &self.instructions,
        ]
        .iter()
        .filter(|field| !field.is_empty())
        .count()
    }

    /// Completeness score: one point per populated field, name included.
    pub fn completeness(&self) -> usize {
        self.populated_details() + usize::from(!self.name.is_empty())
    }
}

/// Reviewer-facing bucket for an analysis confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Failed,
}

/// Outcome of analyzing a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub layout_detected: bool,
    pub sections: Vec<Region>,
    pub medications: Vec<Medication>,
    pub instructions: Vec<String>,
    #[serde(rename = "confidence_score")]
    pub confidence: f32,
    pub confidence_level: ConfidenceLevel,
    pub requires_review: bool,
}

impl AnalysisResult {
    /// The `NoUsableContent` outcome.
    pub fn failed() -> Self {
        Self {
            success: false,
            layout_detected: false,
            sections: Vec::new(),
            medications: Vec::new(),
            instructions: Vec::new(),
            confidence: 0.0,
            confidence_level: ConfidenceLevel::Failed,
            requires_review: true,
        }
    }

    pub fn section(&self, kind: RegionKind) -> Option<&Region> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

/// Already-recognized text per region, for callers running their own OCR.
pub type RegionTexts = BTreeMap<RegionKind, String>;

/// OCR collaborator. Implementations own their per-call timeout.
pub trait OcrEngine {
    fn recognize_text(&self, image: &DynamicImage, config: OcrConfig) -> Result<String, OcrError>;

    fn recognize_words(
        &self,
        image: &DynamicImage,
        config: OcrConfig,
    ) -> Result<Vec<Word>, OcrError>;
}
