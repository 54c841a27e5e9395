//! Instruction Extractor: free-standing directions found anywhere on the page.

use std::collections::HashSet;

use super::catalog::PatternCatalog;

/// Shortest phrase worth reporting.
const MIN_INSTRUCTION_CHARS: usize = 3;

/// Every instruction phrase in `texts`, in reading order, first occurrence only.
///
/// Within one text matches are ordered by position; texts are visited in the
/// order given. Overlapping phrases ("take ... after meals" and "after meals")
/// are reported separately.
pub fn extract_instructions<'t, I>(texts: I, catalog: &PatternCatalog) -> Vec<String>
where
    I: IntoIterator<Item = &'t str>,
{
    let mut seen = HashSet::new();
    let mut instructions = Vec::new();

    for text in texts {
        let mut matches: Vec<(usize, usize, &str)> = catalog
            .instruction_phrases()
            .iter()
            .enumerate()
            .flat_map(|(rank, pattern)| {
                pattern
                    .find_iter(text)
                    .map(move |m| (m.start(), rank, m.as_str().trim()))
            })
            .collect();
        matches.sort_unstable_by_key(|&(start, rank, _)| (start, rank));

        for (_, _, phrase) in matches {
            if phrase.chars().count() < MIN_INSTRUCTION_CHARS {
                continue;
            }
            if seen.insert(phrase.to_string()) {
                instructions.push(phrase.to_string());
            }
        }
    }

    instructions
}
