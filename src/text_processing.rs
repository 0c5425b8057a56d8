//! # Text Processing Module
//!
//! This module provides the text normalization shared by every other component
//! of the crate, plus the whole-word matching helpers used by recipe search and
//! the dietary/seasonal filters.
//!
//! ## Features
//!
//! - Accent, case and punctuation insensitive normalization (`"Épinards"` == `"epinards"`)
//! - Ligature folding (`œ` -> `oe`, `æ` -> `ae`) so `"œufs"` and `"oeufs"` compare equal
//! - Whole-word phrase matching that tolerates French/English plural suffixes
//! - Compound-noun guard: `"pomme"` does not match `"pommes de terre"`, while
//!   `"champignon"` still matches `"champignons de Paris"`

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Suffixes accepted after a term word when matching a plural form
pub const PLURAL_SUFFIXES: [&str; 3] = ["s", "x", "aux"];

/// Compound nouns naming another ingredient than their plural head word.
///
/// Normalized; a shorter term that only reaches the head through a plural
/// suffix does not match them (`"pomme"` vs `"pommes de terre"`).
pub const COMPOUND_NOUNS: [&str; 6] = [
    "pommes de terre",
    "pommes de pin",
    "choux de bruxelles",
    "noix de coco",
    "noix de cajou",
    "noix de muscade",
];

/// Words ignored by the word-by-word fallback
pub const STOP_WORDS: [&str; 12] = [
    "de", "du", "des", "d", "la", "le", "les", "l", "a", "au", "aux", "et",
];

/// Normalize free text for matching and grouping.
///
/// Lower-cases, strips diacritics, replaces every character that is not a
/// letter, digit or whitespace with a space, collapses whitespace and trims.
/// The function is total and idempotent.
///
/// ```rust
/// use just_recipes::text_processing::normalize;
///
/// assert_eq!(normalize("Épinards"), "epinards");
/// assert_eq!(normalize("  Huile   d'olive! "), "huile d olive");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace('œ', "oe").replace('æ', "ae");

    let mut cleaned = String::with_capacity(lowered.len());
    for ch in lowered.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() || ch.is_whitespace() {
            cleaned.push(ch);
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Normalized form used for matching.
///
/// Hyphenated compounds are joined into a single word before normalizing, so
/// `"pear"` does not match inside `"pear-shaped-squash"` and `"chou"` does not
/// match `"chou-fleur"`.
///
/// ```rust
/// use just_recipes::text_processing::match_key;
///
/// assert_eq!(match_key("Chou-fleur rôti"), "choufleur roti");
/// ```
pub fn match_key(text: &str) -> String {
    normalize(&text.replace(['-', '\u{2010}', '\u{2011}'], ""))
}

/// How a single term word lined up with a word of the searched text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMatch {
    /// Same word
    Exact,
    /// Term word followed by a plural suffix
    Inflected,
    /// No match
    Miss,
}

/// Compare a term word against a text word, both already normalized
pub fn match_word(term_word: &str, text_word: &str) -> WordMatch {
    if term_word == text_word {
        return WordMatch::Exact;
    }

    if let Some(rest) = text_word.strip_prefix(term_word) {
        if PLURAL_SUFFIXES.contains(&rest) {
            return WordMatch::Inflected;
        }
    }

    // cheval -> chevaux, bocal -> bocaux
    if let Some(stem) = term_word.strip_suffix("al") {
        if !stem.is_empty() && text_word.strip_prefix(stem) == Some("aux") {
            return WordMatch::Inflected;
        }
    }

    WordMatch::Miss
}

/// One occurrence of a phrase inside a word sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseOccurrence {
    /// Index of the first matched word
    pub start: usize,
    /// Index one past the last matched word
    pub end: usize,
    /// Whether any word needed a plural suffix to match
    pub inflected: bool,
}

/// Find every whole-word occurrence of `term_words` inside `text_words`
pub fn phrase_occurrences(term_words: &[&str], text_words: &[&str]) -> Vec<PhraseOccurrence> {
    if term_words.is_empty() || term_words.len() > text_words.len() {
        return Vec::new();
    }

    let mut occurrences = Vec::new();
    for start in 0..=(text_words.len() - term_words.len()) {
        let mut inflected = false;
        let mut matched = true;

        for (offset, term_word) in term_words.iter().enumerate() {
            match match_word(term_word, text_words[start + offset]) {
                WordMatch::Exact => {}
                WordMatch::Inflected => inflected = true,
                WordMatch::Miss => {
                    matched = false;
                    break;
                }
            }
        }

        if matched {
            occurrences.push(PhraseOccurrence {
                start,
                end: start + term_words.len(),
                inflected,
            });
        }
    }
    occurrences
}

/// Exact whole-word phrase containment; both arguments must be normalized.
///
/// ```rust
/// use just_recipes::text_processing::contains_exact_phrase;
///
/// assert!(contains_exact_phrase("2 pommes de terre", "pommes"));
/// assert!(!contains_exact_phrase("2 pommes de terre", "pomme"));
/// ```
pub fn contains_exact_phrase(normalized_text: &str, normalized_term: &str) -> bool {
    let term_words: Vec<&str> = normalized_term.split(' ').filter(|w| !w.is_empty()).collect();
    let text_words: Vec<&str> = normalized_text.split(' ').filter(|w| !w.is_empty()).collect();

    phrase_occurrences(&term_words, &text_words)
        .iter()
        .any(|occurrence| !occurrence.inflected)
}

/// Whole-word phrase match where each word may carry a plural suffix.
///
/// An occurrence that needed a plural suffix and is only the head of one of
/// the [`COMPOUND_NOUNS`] is rejected: it names another ingredient.
///
/// ```rust
/// use just_recipes::text_processing::matches_inflected_phrase;
///
/// assert!(matches_inflected_phrase("tomates cerises", "tomate"));
/// assert!(matches_inflected_phrase("champignons de paris", "champignon"));
/// assert!(matches_inflected_phrase("pommes de terre", "pomme de terre"));
/// assert!(!matches_inflected_phrase("pommes de terre", "pomme"));
/// ```
pub fn matches_inflected_phrase(normalized_text: &str, normalized_term: &str) -> bool {
    let term_words: Vec<&str> = normalized_term.split(' ').filter(|w| !w.is_empty()).collect();
    let text_words: Vec<&str> = normalized_text.split(' ').filter(|w| !w.is_empty()).collect();

    phrase_occurrences(&term_words, &text_words)
        .iter()
        .any(|occurrence| {
            !occurrence.inflected || !inside_compound_noun(&text_words, occurrence)
        })
}

/// Whether an occurrence covers only the start of a longer compound noun
fn inside_compound_noun(text_words: &[&str], occurrence: &PhraseOccurrence) -> bool {
    let matched_len = occurrence.end - occurrence.start;
    COMPOUND_NOUNS.iter().any(|compound| {
        let compound_words: Vec<&str> = compound.split(' ').collect();
        compound_words.len() > matched_len
            && text_words
                .get(occurrence.start..occurrence.start + compound_words.len())
                .is_some_and(|window| window == compound_words.as_slice())
    })
}

/// Word-by-word fallback for multi-word terms.
///
/// Every content word of the term must appear as a whole (possibly plural)
/// word of the text. Stop words are ignored; a term made only of stop words
/// never matches.
pub fn matches_all_words(normalized_text: &str, normalized_term: &str) -> bool {
    let text_words: Vec<&str> = normalized_text.split(' ').filter(|w| !w.is_empty()).collect();
    let content_words: Vec<&str> = normalized_term
        .split(' ')
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .collect();

    if content_words.is_empty() {
        return false;
    }

    content_words.iter().all(|term_word| {
        text_words
            .iter()
            .any(|text_word| match_word(term_word, text_word) != WordMatch::Miss)
    })
}
