//! Drug-name correction against a small lexicon of common generics.
//!
//! OCR drops or swaps letters in long drug names ("Paracetmol"). A parsed name
//! is replaced only when it is at least 5 letters, is not already a lexicon
//! entry, and has exactly one closest lexicon entry within edit distance 2.

use super::medication::title_case;

const MIN_CORRECTABLE_CHARS: usize = 5;
const MAX_EDIT_DISTANCE: u32 = 2;

/// Generic drug names, lower-case. Sorted for binary search.
const DRUG_LEXICON: &[&str] = &[
    "allopurinol", "amlodipine", "amoxicillin", "atorvastatin", "azithromycin",
    "betamethasone", "bisoprolol", "budesonide", "carbamazepine", "carvedilol", "cefalexin",
    "cefuroxime", "cetirizine", "ciprofloxacin", "citalopram", "clarithromycin",
    "clindamycin", "clobetasol", "clopidogrel", "clotrimazole", "codeine", "colchicine",
    "diclofenac", "digoxin", "domperidone", "doxycycline", "duloxetine", "enalapril",
    "escitalopram", "estradiol", "finasteride", "fluconazole", "fluoxetine", "fluticasone",
    "furosemide", "fusidic", "gabapentin", "hydrochlorothiazide", "hydrocortisone",
    "ibuprofen", "insulin", "ketoconazole", "levetiracetam", "levocetirizine",
    "levothyroxine", "lisinopril", "loratadine", "losartan", "metformin", "methotrexate",
    "metoprolol", "metronidazole", "miconazole", "montelukast", "morphine", "mupirocin",
    "naproxen", "nitrofurantoin", "olanzapine", "omeprazole", "ondansetron", "pantoprazole",
    "paracetamol", "perindopril", "phenytoin", "prednisolone", "prednisone", "quetiapine",
    "ramipril", "ranitidine", "risperidone", "rivaroxaban", "salbutamol", "sertraline",
    "simvastatin", "spironolactone", "sulfasalazine", "tamsulosin", "terbinafine",
    "tramadol", "trimethoprim", "valproate", "venlafaxine", "warfarin",
];

/// Correct a parsed medication name. Returns the name unchanged when no
/// unambiguous close lexicon entry exists; corrections come back title-cased.
pub fn correct_drug_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let length = lower.chars().count();
    if length < MIN_CORRECTABLE_CHARS {
        return name.to_string();
    }

    if DRUG_LEXICON.binary_search(&lower.as_str()).is_ok() {
        return name.to_string();
    }

    let mut best_term: Option<&str> = None;
    let mut best_distance = MAX_EDIT_DISTANCE + 1;
    let mut ambiguous = false;

    for &term in DRUG_LEXICON {
        if length.abs_diff(term.len()) > MAX_EDIT_DISTANCE as usize {
            continue;
        }

        let distance = edit_distance(&lower, term);
        if distance < best_distance {
            best_distance = distance;
            best_term = Some(term);
            ambiguous = false;
        } else if distance == best_distance && best_term.is_some() {
            ambiguous = true;
        }
    }

    match best_term {
        Some(term) if !ambiguous => {
            tracing::debug!(from = %name, to = term, distance = best_distance, "Corrected drug name");
            title_case(term)
        }
        _ => name.to_string(),
    }
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    if a_chars.is_empty() {
        return n as u32;
    }
    if n == 0 {
        return a_chars.len() as u32;
    }

    let mut prev: Vec<u32> = (0..=n as u32).collect();
    let mut curr = vec![0u32; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = u32::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
