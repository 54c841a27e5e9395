//! Deduplicator: collapses repeated detections of the same medication.
//!
//! Several OCR variants and both parser passes surface the same drug. The most
//! complete detection of a name survives and ties keep the earlier one. No two
//! survivors have similar names, so a second run changes nothing.

use super::types::Medication;
use crate::pipeline_config::AnalyzerConfig;

pub struct Deduplicator {
    short_len: usize,
    len_delta: usize,
}

impl Deduplicator {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            short_len: config.similarity_short_len,
            len_delta: config.similarity_len_delta,
        }
    }

    /// Case-insensitive: identical, substring, or two short names of
    /// near-equal length.
    pub fn names_similar(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();

        if a == b || a.contains(&b) || b.contains(&a) {
            return true;
        }

        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        len_a <= self.short_len && len_b <= self.short_len && len_a.abs_diff(len_b) <= self.len_delta
    }

    /// Drop nameless candidates, then merge similar names.
    ///
    /// Candidates are visited most complete first, ties in discovery order.
    /// A candidate similar to any entry already kept is absorbed by the first
    /// such entry. Survivors come back in the discovery order of the earliest
    /// candidate each one absorbed.
    pub fn deduplicate(&self, candidates: Vec<Medication>) -> Vec<Medication> {
        let candidates: Vec<Medication> = candidates
            .into_iter()
            .filter(|m| !m.name.trim().is_empty())
            .collect();

        let mut ranked: Vec<usize> = (0..candidates.len()).collect();
        // stable, so equal completeness keeps discovery order
        ranked.sort_by_key(|&i| std::cmp::Reverse(candidates[i].completeness()));

        // (survivor index, earliest discovery index in its group)
        let mut kept: Vec<(usize, usize)> = Vec::new();
        for i in ranked {
            let absorbed_by = kept
                .iter_mut()
                .find(|entry| self.names_similar(&candidates[entry.0].name, &candidates[i].name));
            match absorbed_by {
                Some((k, first_seen)) => {
                    tracing::trace!(
                        kept = %candidates[*k].name,
                        dropped = %candidates[i].name,
                        "Dropping less complete duplicate"
                    );
                    *first_seen = (*first_seen).min(i);
                }
                None => kept.push((i, i)),
            }
        }

        kept.sort_by_key(|&(_, first_seen)| first_seen);
        let keep: Vec<usize> = kept.into_iter().map(|(k, _)| k).collect();

        let mut slots: Vec<Option<Medication>> = candidates.into_iter().map(Some).collect();
        keep.into_iter().filter_map(|k| slots[k].take()).collect()
    }
}
