//! Table names, chapter names and slugs
//!
//! Table naming conventions:
//! - occurrence sheets: `"<Chapter name> #<order>"`, the `#N` suffix is optional
//! - sentence sheets: `"<Chapter name>[_ ]<TEXTCODE>"`
//! - names starting with `_` or `sheet` (any case) are scratch sheets

use once_cell::sync::Lazy;
use regex::Regex;

static CHAPTER_ORDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*#\s*(\d+)\s*$").expect("valid regex"));

static SENTENCE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)[_ ]([A-Za-z]+)$").expect("valid regex"));

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Chapter identity parsed from a table name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterName {
    pub name: String,
    pub slug: String,
    /// `None` when the table name has no `#N` suffix
    pub display_order: Option<i64>,
}

impl ChapterName {
    pub fn parse(table_name: &str) -> Self {
        let table_name = table_name.trim();
        let (name, display_order) = match CHAPTER_ORDER.captures(table_name) {
            Some(caps) => (
                caps[1].trim().to_string(),
                caps[2].parse::<i64>().ok(),
            ),
            None => (table_name.to_string(), None),
        };

        Self {
            slug: slugify(&name),
            name,
            display_order,
        }
    }
}

/// Lowercase, runs of anything but ASCII letters and digits become `-`
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Scratch and meta sheets are never imported
pub fn is_skipped_table(table_name: &str) -> bool {
    let lower = table_name.trim().to_lowercase();
    lower.starts_with('_') || lower.starts_with("sheet")
}

/// Split a sentence table name into (chapter name, text code)
pub fn parse_sentence_table(table_name: &str) -> Option<(String, String)> {
    let caps = SENTENCE_TABLE.captures(table_name.trim())?;
    let chapter = caps[1].trim().to_string();
    if chapter.is_empty() {
        return None;
    }
    Some((chapter, caps[2].to_uppercase()))
}

/// Leading integer of `value`, e.g. `"12 (approx)"` -> 12
pub fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let end = value
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse::<i64>().ok()
}

pub fn starts_with_digit(value: &str) -> bool {
    value.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

/// Truncate to at most `max` characters
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((i, _)) => value[..i].to_string(),
        None => value.to_string(),
    }
}
