pub mod types;
pub mod catalog;
pub mod ocr;
pub mod segment;
pub mod lines;
pub mod medication;
pub mod correction;
pub mod dedup;
pub mod instructions;
pub mod confidence;
pub mod orchestrator;
pub mod document;

pub use types::*;
pub use catalog::*;
pub use ocr::*;
pub use confidence::*;
pub use orchestrator::*;
pub use document::*;

use thiserror::Error;

/// Failure reported by an OCR collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrError {
    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("OCR call timed out")]
    Timeout,

    #[error("Image rejected by OCR engine: {0}")]
    InvalidImage(String),
}

/// Why a region (or one OCR variant on it) produced nothing usable.
///
/// Always recovered locally: the region or variant is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("OCR failed for {region} ({config}): {source}")]
    Ocr {
        region: RegionKind,
        config: OcrConfig,
        #[source]
        source: OcrError,
    },

    #[error("No text recognized in {region}")]
    EmptyText { region: RegionKind },

    #[error("Region {region} has no pixels on this page")]
    EmptyCrop { region: RegionKind },
}

/// Document-level errors. `LayoutAnalyzer::analyze` itself never fails.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Document has {count} pages, limit is {max}")]
    TooManyPages { count: usize, max: usize },

    #[error("Document has no pages")]
    NoPages,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Page worker failed: {0}")]
    Worker(String),
}
