//! Occurrence records built from a parsed block
//!
//! [`OccurrenceFields`] holds every stored field of an occurrence that the
//! spreadsheet decides. Existing rows are compared with freshly built ones
//! field by field through [`OccurrenceFields::diff`].

use crate::import::block::ParsedBlock;
use crate::import::cleaner::{derive_cell, DerivedCell};
use crate::import::log::ImportLog;
use crate::import::names::truncate_chars;
use crate::import::segmenter::ANCHOR_COL;
use crate::ods::SheetRow;
use dral_common::db::Occurrence;

pub const CELL_MAX_CHARS: usize = 80;
pub const CELL_STYLE_MAX_CHARS: usize = 10;

/// Spreadsheet-derived fields of one occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceFields {
    pub cell: String,
    pub cell_style: String,
    pub cell_line: i64,
    pub cell_col: i64,
    pub freq: i64,
    pub string: Option<String>,
    pub context: String,
    pub zero: bool,
    pub replace: bool,
    pub paraphrase: bool,
    pub lemma_group: i64,
    pub sentence_index: i64,
}

impl OccurrenceFields {
    pub fn from_occurrence(occurrence: &Occurrence) -> Self {
        Self {
            cell: occurrence.cell.clone(),
            cell_style: occurrence.cell_style.clone(),
            cell_line: occurrence.cell_line,
            cell_col: occurrence.cell_col,
            freq: occurrence.freq,
            string: occurrence.string.clone(),
            context: occurrence.context.clone(),
            zero: occurrence.zero,
            replace: occurrence.replace,
            paraphrase: occurrence.paraphrase,
            lemma_group: occurrence.lemma_group,
            sentence_index: occurrence.sentence_index,
        }
    }

    /// Names of the fields whose value differs in `other`
    pub fn diff(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.cell != other.cell {
            changed.push("cell");
        }
        if self.cell_style != other.cell_style {
            changed.push("cell_style");
        }
        if self.cell_line != other.cell_line {
            changed.push("cell_line");
        }
        if self.cell_col != other.cell_col {
            changed.push("cell_col");
        }
        if self.freq != other.freq {
            changed.push("freq");
        }
        if self.string != other.string {
            changed.push("string");
        }
        if self.context != other.context {
            changed.push("context");
        }
        if self.zero != other.zero {
            changed.push("zero");
        }
        if self.replace != other.replace {
            changed.push("replace");
        }
        if self.paraphrase != other.paraphrase {
            changed.push("paraphrase");
        }
        if self.lemma_group != other.lemma_group {
            changed.push("lemma_group");
        }
        if self.sentence_index != other.sentence_index {
            changed.push("sentence_index");
        }
        changed
    }

    pub fn apply_derived(&mut self, derived: DerivedCell) {
        self.string = derived.string;
        self.context = derived.context;
        self.zero = derived.zero;
        self.replace = derived.replace;
        self.paraphrase = derived.paraphrase;
    }
}

/// An occurrence built for one text code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltOccurrence {
    pub code: String,
    pub fields: OccurrenceFields,
}

/// Build one occurrence per text row and column of `block`
///
/// Columns run from the anchor column to the block's usable width.
pub fn build_occurrences(
    block: &ParsedBlock,
    reference_code: &str,
    table: &str,
    log: &mut ImportLog,
) -> Vec<BuiltOccurrence> {
    let sentence_indexes = sentence_indexes(block, table, log);
    let mut built = Vec::new();

    for line in &block.lines {
        let is_reference = line.code.eq_ignore_ascii_case(reference_code);
        let groups = style_groups(&line.row, block.width);

        for (offset, col) in (ANCHOR_COL..block.width).enumerate() {
            let cell = line.row.text(col);
            let style = line.row.style(col);

            let mut fields = OccurrenceFields {
                cell: truncate_chars(cell, CELL_MAX_CHARS),
                cell_style: truncate_chars(style, CELL_STYLE_MAX_CHARS),
                cell_line: line.row.line as i64,
                cell_col: col as i64,
                freq: block.freq,
                lemma_group: groups[offset],
                sentence_index: sentence_indexes[offset],
                ..OccurrenceFields::default()
            };
            // Derive from the stored (truncated) cell, as `clean` does
            let derived = derive_cell(&fields.cell, &block.forms, is_reference);
            fields.apply_derived(derived);

            built.push(BuiltOccurrence {
                code: line.code.clone(),
                fields,
            });
        }
    }

    built
}

/// 0-based first-seen ordinal of each column's style among the row's styles
fn style_groups(row: &SheetRow, width: usize) -> Vec<i64> {
    let mut seen: Vec<&str> = Vec::new();
    (ANCHOR_COL..width)
        .map(|col| {
            let style = row.style(col);
            let index = match seen.iter().position(|s| *s == style) {
                Some(index) => index,
                None => {
                    seen.push(style);
                    seen.len() - 1
                }
            };
            index as i64
        })
        .collect()
}

fn sentence_indexes(block: &ParsedBlock, table: &str, log: &mut ImportLog) -> Vec<i64> {
    (ANCHOR_COL..block.width)
        .map(|col| {
            let Some(locations) = &block.locations else {
                return 0;
            };
            let value = locations.text(col);
            match value.trim().parse::<i64>() {
                Ok(index) => index,
                Err(_) => {
                    if !value.is_empty() {
                        log.warning(format!(
                            "{}, line {}: sentence index '{}' is not a number, using 0",
                            table, locations.line, value
                        ));
                    }
                    0
                }
            }
        })
        .collect()
}
