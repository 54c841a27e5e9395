//! Multi-page documents: page cap, parallel pages, cross-page merge.

use std::collections::HashSet;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::dedup::Deduplicator;
use super::orchestrator::LayoutAnalyzer;
use super::types::{AnalysisResult, Medication};
use super::AnalysisError;
use crate::pipeline_config::AnalyzerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// 1-based, in input order.
    pub page_number: usize,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub success: bool,
    pub pages: Vec<PageAnalysis>,
    pub medications: Vec<Medication>,
    pub instructions: Vec<String>,
    /// Mean over successful pages; 0.0 when none succeeded.
    #[serde(rename = "confidence_score")]
    pub confidence: f32,
}

/// Analyze every page of a document.
///
/// Documents over `max_pages` are rejected before any OCR runs. Pages run on
/// the blocking pool in parallel; all of them are joined before merging.
pub async fn analyze_document(
    analyzer: Arc<LayoutAnalyzer>,
    pages: Vec<DynamicImage>,
) -> Result<DocumentAnalysis, AnalysisError> {
    let max = analyzer.config().max_pages;
    if pages.is_empty() {
        return Err(AnalysisError::NoPages);
    }
    if pages.len() > max {
        return Err(AnalysisError::TooManyPages { count: pages.len(), max });
    }

    tracing::info!(pages = pages.len(), "Starting document analysis");

    let handles: Vec<_> = pages
        .into_iter()
        .map(|page| {
            let analyzer = Arc::clone(&analyzer);
            tokio::task::spawn_blocking(move || analyzer.analyze(&page))
        })
        .collect();

    let mut analyses = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let result = handle
            .await
            .map_err(|e| AnalysisError::Worker(format!("page {}: {e}", index + 1)))?;
        analyses.push(PageAnalysis {
            page_number: index + 1,
            result,
        });
    }

    Ok(merge_pages(analyses, analyzer.config()))
}

/// Combine per-page results in page order.
pub fn merge_pages(pages: Vec<PageAnalysis>, config: &AnalyzerConfig) -> DocumentAnalysis {
    let successful: Vec<&AnalysisResult> = pages
        .iter()
        .map(|p| &p.result)
        .filter(|r| r.success)
        .collect();

    let confidence = if successful.is_empty() {
        0.0
    } else {
        successful.iter().map(|r| r.confidence).sum::<f32>() / successful.len() as f32
    };

    let medications = Deduplicator::new(config).deduplicate(
        successful
            .iter()
            .flat_map(|r| r.medications.iter().cloned())
            .collect(),
    );

    let mut seen = HashSet::new();
    let instructions = successful
        .iter()
        .flat_map(|r| r.instructions.iter())
        .filter(|i| seen.insert(i.as_str()))
        .cloned()
        .collect();

    let success = !successful.is_empty();
    tracing::info!(
        pages = pages.len(),
        successful = successful.len(),
        confidence,
        "Document analysis complete"
    );

    DocumentAnalysis {
        success,
        medications,
        instructions,
        confidence,
        pages,
    }
}
