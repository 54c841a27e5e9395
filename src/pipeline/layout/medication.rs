//! Medication Parser: turns prescription-area lines into medication candidates.
//!
//! Two independent passes per line, in this order:
//! 1. Shape patterns from the catalog ("Paracetamol 500mg", "Mupirocin gel",
//!    "Fusidic r/f"). Fields are read from the match start up to the next
//!    name-led match on the line, or the end of line.
//! 2. Every token that passes [`looks_like_medication_name`], with fields read
//!    from a window of two words either side. The window stops at the next
//!    plausible name, and looks back only when no name precedes the token.
//!
//! A candidate survives only with a name and at least one other field.

use super::catalog::PatternCatalog;
use super::types::Medication;

/// Words either side of a heuristic hit used as its field context.
const CONTEXT_WORDS: usize = 2;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

/// Accepted letter count for a drug name.
const NAME_LETTERS: std::ops::RangeInclusive<usize> = 3..=20;

pub struct MedicationParser<'a> {
    catalog: &'a PatternCatalog,
    baseline_confidence: f32,
}

impl<'a> MedicationParser<'a> {
    pub fn new(catalog: &'a PatternCatalog, baseline_confidence: f32) -> Self {
        Self {
            catalog,
            baseline_confidence: baseline_confidence.clamp(0.0, 1.0),
        }
    }

    /// Parse every line in order, returning candidates in discovery order.
    pub fn parse_lines<'l, I>(&self, lines: I) -> Vec<Medication>
    where
        I: IntoIterator<Item = &'l str>,
    {
        lines
            .into_iter()
            .flat_map(|line| self.parse_line(line))
            .collect()
    }

    /// Parse a multi-line block; each line is handled independently.
    pub fn parse_block(&self, text: &str) -> Vec<Medication> {
        self.parse_lines(text.lines())
    }

    pub fn parse_line(&self, line: &str) -> Vec<Medication> {
        let line = line.trim();
        if line.chars().count() < 3 {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        let matches: Vec<regex::Match<'_>> = self
            .catalog
            .medication_shapes()
            .iter()
            .flat_map(|shape| shape.find_iter(line))
            .collect();

        for m in &matches {
            let span = m.as_str().trim();
            let end = self.next_named_match(&matches, m.end()).unwrap_or(line.len());
            let context = &line[m.start()..end];
            if let Some(medication) = self.build_candidate(span, span, context) {
                candidates.push(medication);
            }
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let plausible: Vec<bool> = words
            .iter()
            .map(|word| looks_like_medication_name(strip_punctuation(word), self.catalog))
            .collect();

        for (i, word) in words.iter().enumerate() {
            if !plausible[i] {
                continue;
            }
            let token = strip_punctuation(word);

            // Words before this name belong to an earlier name on the line.
            let start = if plausible[..i].iter().any(|&p| p) {
                i
            } else {
                i.saturating_sub(CONTEXT_WORDS)
            };
            let window_end = (i + CONTEXT_WORDS + 1).min(words.len());
            let end = (i + 1..window_end).find(|&j| plausible[j]).unwrap_or(window_end);

            let context = words[start..end].join(" ");
            if let Some(medication) = self.build_candidate(token, &context, &context) {
                candidates.push(medication);
            }
        }

        candidates
    }

    /// Start of the first shape match at or after `from` that is led by a
    /// usable name. Bounds the field context of the match before it.
    fn next_named_match(&self, matches: &[regex::Match<'_>], from: usize) -> Option<usize> {
        matches
            .iter()
            .filter(|m| m.start() >= from)
            .filter(|m| first_alphabetic_token(m.as_str()).is_some_and(|t| self.is_candidate_name(t)))
            .map(|m| m.start())
            .min()
    }

    fn is_candidate_name(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        !self.catalog.is_vocabulary(&lower) && !self.catalog.is_stop_word(&lower)
    }

    /// Extract structured fields. `name_source` supplies the name, `context`
    /// the remaining fields, `raw_text` is kept verbatim for review.
    fn build_candidate(&self, name_source: &str, raw_text: &str, context: &str) -> Option<Medication> {
        let token = first_alphabetic_token(name_source)?;
        if !self.is_candidate_name(token) {
            return None;
        }
        let name = title_case(token);

        let dosage = self
            .catalog
            .dosage()
            .find(context)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let form = self
            .catalog
            .form()
            .find(context)
            .map(|m| normalize_form(m.as_str()))
            .unwrap_or_default();

        let frequency = self
            .catalog
            .frequency()
            .find(context)
            .map(|m| self.expand(m.as_str()))
            .unwrap_or_default();

        let duration = self
            .catalog
            .duration()
            .find(context)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let instructions = self
            .catalog
            .instruction_abbreviation()
            .find(context)
            .map(|m| self.expand(m.as_str()))
            .unwrap_or_default();

        let medication = Medication {
            name,
            dosage,
            form,
            frequency,
            duration,
            instructions,
            raw_text: raw_text.to_string(),
            confidence: self.baseline_confidence,
        };

        if medication.populated_details() == 0 {
            tracing::trace!(name = %medication.name, "Dropping bare name without details");
            return None;
        }
        Some(medication)
    }

    fn expand(&self, token: &str) -> String {
        let lower = token.to_lowercase();
        self.catalog
            .expand_abbreviation(&lower)
            .map(str::to_string)
            .unwrap_or(lower)
    }
}

/// Heuristic: could this token be a drug name?
///
/// Rejects short tokens, stop-words, dose vocabulary, tokens without letters,
/// ordinary-word endings (unless they also carry a drug ending), and tokens
/// without both a vowel and a consonant or with an implausible letter count.
pub fn looks_like_medication_name(token: &str, catalog: &PatternCatalog) -> bool {
    if token.chars().count() < 3 {
        return false;
    }

    let lower = token.to_lowercase();
    if catalog.is_stop_word(&lower) || catalog.is_vocabulary(&lower) {
        return false;
    }

    if !lower.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    if catalog.has_non_medical_suffix(&lower) && !catalog.has_drug_suffix(&lower) {
        return false;
    }

    let vowels = lower.chars().filter(|c| VOWELS.contains(c)).count();
    let consonants = lower
        .chars()
        .filter(|c| c.is_ascii_alphabetic() && !VOWELS.contains(c))
        .count();

    vowels > 0 && consonants > 0 && NAME_LETTERS.contains(&(vowels + consonants))
}

/// Trim leading/trailing punctuation, keeping inner slashes and digits.
fn strip_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

fn first_alphabetic_token(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_alphabetic())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

pub(crate) fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn normalize_form(form: &str) -> String {
    let lower = form.to_lowercase();
    match lower.as_str() {
        "cap" | "caps" | "capsules" => "capsule".to_string(),
        "tablets" => "tablet".to_string(),
        _ => lower,
    }
}
