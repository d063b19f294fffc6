//! Cell interpretation
//!
//! Derives the short `string`, the `context` and the omission / replacement /
//! paraphrase flags of an occurrence from its raw cell text.
//!
//! Reference text cells are matched against the lemma's forms. Translation
//! cells are free text carrying annotation keywords.

use crate::import::names::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;

/// Reference cell content meaning "omitted"
pub const OMISSION_MARKER: &str = "ZERO";
/// Reference cell with text but no known form
pub const AMBIGUOUS_MARKER: &str = "?";
/// Empty reference cell
pub const EMPTY_MARKER: &str = "??";

pub const STRING_MAX_CHARS: usize = 20;
pub const CONTEXT_MAX_CHARS: usize = 50;

static ZERO_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bzero\b").expect("valid regex"));

static REPLACE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\breplace(?:ment|d)?\b").expect("valid regex"));

static PARAPHRASE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bparaphras(?:e|ing|ed)\b").expect("valid regex"));

static ASIDE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Values derived from a cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedCell {
    pub string: Option<String>,
    pub context: String,
    pub zero: bool,
    pub replace: bool,
    pub paraphrase: bool,
}

/// Derive a cell of either kind
pub fn derive_cell(cell: &str, forms: &str, is_reference: bool) -> DerivedCell {
    if is_reference {
        derive_reference_cell(cell, forms)
    } else {
        derive_translation_cell(cell)
    }
}

/// Reference text cell: find which form of the lemma it uses
pub fn derive_reference_cell(cell: &str, forms: &str) -> DerivedCell {
    let trimmed = cell.trim();
    let context = truncate_chars(trimmed, CONTEXT_MAX_CHARS);

    if trimmed == OMISSION_MARKER {
        return DerivedCell {
            string: None,
            context,
            zero: true,
            ..DerivedCell::default()
        };
    }

    let string = if trimmed.is_empty() {
        EMPTY_MARKER.to_string()
    } else {
        let lower = trimmed.to_lowercase();
        normalize_forms(forms)
            .into_iter()
            .find(|form| lower.contains(form.as_str()))
            .map(|form| truncate_chars(&form, STRING_MAX_CHARS))
            .unwrap_or_else(|| AMBIGUOUS_MARKER.to_string())
    };

    DerivedCell {
        string: Some(string),
        context,
        ..DerivedCell::default()
    }
}

/// Translation cell: pull the annotation keywords out and keep the rest
pub fn derive_translation_cell(cell: &str) -> DerivedCell {
    let mut derived = DerivedCell::default();
    let mut text = cell.to_string();

    if ZERO_TOKEN.is_match(&text) {
        derived.zero = true;
        text = ZERO_TOKEN.replace_all(&text, " ").into_owned();
    }
    if REPLACE_TOKEN.is_match(&text) {
        derived.replace = true;
        text = REPLACE_TOKEN.replace_all(&text, " ").into_owned();
    }
    if PARAPHRASE_TOKEN.is_match(&text) {
        derived.paraphrase = true;
        text = PARAPHRASE_TOKEN.replace_all(&text, " ").into_owned();
    }

    let text = text.replace('/', " ");
    let text = ASIDE.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    if !text.is_empty() {
        derived.string = Some(truncate_chars(text, STRING_MAX_CHARS));
    }
    derived
}

/// Lowercased forms without parentheses or spaces, longest first
pub fn normalize_forms(forms: &str) -> Vec<String> {
    let mut normalized: Vec<String> = forms
        .split(',')
        .map(|f| {
            f.chars()
                .filter(|c| !matches!(c, '(' | ')') && !c.is_whitespace())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|f| !f.is_empty())
        .collect();

    normalized.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    normalized.dedup();
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_form_wins() {
        let derived = derive_reference_cell("she said so", "say, said");
        assert_eq!(derived.string.as_deref(), Some("said"));
        assert_eq!(derived.context, "she said so");
        assert!(!derived.zero);
    }

    #[test]
    fn test_form_match_is_case_insensitive() {
        let derived = derive_reference_cell("SAID Caddy", "(Say, Said)");
        assert_eq!(derived.string.as_deref(), Some("said"));
    }

    #[test]
    fn test_omission_marker() {
        let derived = derive_reference_cell("ZERO", "say, said");
        assert_eq!(derived.string, None);
        assert!(derived.zero);
    }

    #[test]
    fn test_omission_marker_is_case_sensitive() {
        let derived = derive_reference_cell("zero", "say, said");
        assert_eq!(derived.string.as_deref(), Some(AMBIGUOUS_MARKER));
        assert!(!derived.zero);
    }

    #[test]
    fn test_empty_and_ambiguous_markers() {
        assert_eq!(
            derive_reference_cell("  ", "say").string.as_deref(),
            Some(EMPTY_MARKER)
        );
        assert_eq!(
            derive_reference_cell("told", "say").string.as_deref(),
            Some(AMBIGUOUS_MARKER)
        );
    }

    #[test]
    fn test_context_truncated() {
        let long = "a".repeat(80);
        let derived = derive_reference_cell(&long, "say");
        assert_eq!(derived.context.chars().count(), CONTEXT_MAX_CHARS);
    }

    #[test]
    fn test_replacement_with_aside() {
        let derived = derive_translation_cell("replacement (abc)");
        assert!(derived.replace);
        assert!(!derived.zero);
        assert_eq!(derived.string, None);
    }

    #[test]
    fn test_translation_flags_and_cleanup() {
        let derived = derive_translation_cell("Zero");
        assert!(derived.zero);
        assert_eq!(derived.string, None);

        let derived = derive_translation_cell("paraphrasing  sakė/tarė (archaic)");
        assert!(derived.paraphrase);
        assert_eq!(derived.string.as_deref(), Some("sakė tarė"));

        let derived = derive_translation_cell("replaced: pasakojo");
        assert!(derived.replace);
        assert_eq!(derived.string.as_deref(), Some(": pasakojo"));
    }

    #[test]
    fn test_keyword_inside_word_is_kept() {
        let derived = derive_translation_cell("zeroth");
        assert!(!derived.zero);
        assert_eq!(derived.string.as_deref(), Some("zeroth"));
    }

    #[test]
    fn test_translation_string_truncated() {
        let derived = derive_translation_cell("ilgas ilgas ilgas ilgas ilgas");
        assert_eq!(derived.string.as_deref(), Some("ilgas ilgas ilgas il"));
        assert!(derived.context.is_empty());
    }

    #[test]
    fn test_normalize_forms() {
        assert_eq!(normalize_forms("(say, Said ,says)"), vec!["said", "says", "say"]);
        assert!(normalize_forms("").is_empty());
    }
}
