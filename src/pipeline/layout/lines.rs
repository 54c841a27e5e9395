//! Line Grouper: rebuilds text lines from word-level OCR output.
//!
//! Words are filtered by confidence and length, bucketed by `top / line_height`
//! so small vertical jitter lands in the same bucket, then ordered left to
//! right. Each OCR variant is grouped on its own; the combined line list is
//! de-duplicated before it reaches the medication parser.

use std::collections::{BTreeMap, HashSet};

use image::DynamicImage;

use super::types::{OcrConfig, OcrEngine, RegionKind, Word};
use super::RegionError;
use crate::pipeline_config::AnalyzerConfig;

/// De-duplicated lines in first-seen order. Iterate as often as needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedLines {
    lines: Vec<String>,
}

impl GroupedLines {
    fn from_candidates(candidates: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let lines = candidates
            .into_iter()
            .filter(|line| seen.insert(line.clone()))
            .collect();
        Self { lines }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub struct LineGrouper {
    confidence_floor: f32,
    min_chars: usize,
    line_height: u32,
}

impl LineGrouper {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            confidence_floor: config.word_confidence_floor,
            min_chars: config.min_word_chars,
            line_height: config.line_height_px.max(1),
        }
    }

    /// Group one variant's words into lines, top to bottom.
    pub fn group(&self, words: &[Word]) -> Vec<String> {
        let mut buckets: BTreeMap<u32, Vec<&Word>> = BTreeMap::new();

        for word in words.iter().filter(|w| self.keeps(w)) {
            buckets
                .entry(word.bounding_box.y / self.line_height)
                .or_default()
                .push(word);
        }

        buckets
            .into_values()
            .map(|mut bucket| {
                bucket.sort_by_key(|w| w.bounding_box.x);
                bucket
                    .iter()
                    .map(|w| w.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Group several variants' word lists and merge their lines.
    pub fn from_word_lists(&self, word_lists: &[Vec<Word>]) -> GroupedLines {
        GroupedLines::from_candidates(word_lists.iter().flat_map(|words| self.group(words)))
    }

    /// Re-run OCR on a region crop with each variant and group the results.
    /// A failing variant is skipped; if all fail the region has no lines.
    pub fn recognize_lines(
        &self,
        engine: &dyn OcrEngine,
        crop: &DynamicImage,
        region: RegionKind,
        configs: &[OcrConfig],
    ) -> GroupedLines {
        let mut word_lists = Vec::with_capacity(configs.len());

        for &config in configs {
            match recognize_variant(engine, crop, region, config) {
                Ok(words) => {
                    tracing::debug!(region = %region, config = ?config, words = words.len(), "Variant recognized");
                    word_lists.push(words);
                }
                Err(e) => {
                    tracing::warn!(region = %region, config = ?config, error = %e, "OCR variant failed, trying next");
                }
            }
        }

        self.from_word_lists(&word_lists)
    }

    fn keeps(&self, word: &Word) -> bool {
        word.confidence >= self.confidence_floor && word.text.trim().chars().count() >= self.min_chars
    }
}

fn recognize_variant(
    engine: &dyn OcrEngine,
    crop: &DynamicImage,
    region: RegionKind,
    config: OcrConfig,
) -> Result<Vec<Word>, RegionError> {
    engine
        .recognize_words(crop, config)
        .map_err(|source| RegionError::Ocr { region, config, source })
}
