//! Lemma block parsing
//!
//! Reads the lemma, its forms and the per-text rows out of a [`Block`].
//!
//! Row roles inside a block:
//! - frequency row: column 2 starts with a digit, column 1 is the lemma
//! - forms row: column 1 is wrapped in parentheses, e.g. `(say, said)`
//! - text rows: column 3 names the text code, blank means the reference text
//! - locations row: blank column 3 and a numeric anchor, holds sentence indexes
//!
//! Every problem found here is a warning. A block without a lemma or forms
//! is skipped, the rest of the table still imports.

use crate::import::log::ImportLog;
use crate::import::names::{leading_int, starts_with_digit, truncate_chars};
use crate::import::segmenter::{is_locations_row, Block, CODE_COL, FREQ_COL, LEMMA_COL};
use crate::ods::SheetRow;
use std::collections::BTreeSet;

/// Maximum length of a lemma string
pub const LEMMA_MAX_CHARS: usize = 20;

/// One text's row in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// Upper-cased text code
    pub code: String,
    pub row: SheetRow,
}

/// Block contents ready for occurrence building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    pub start_line: usize,
    pub lemma: String,
    /// Normalised forms, `", "` separated
    pub forms: String,
    pub freq: i64,
    /// Text rows in sheet order
    pub lines: Vec<TextLine>,
    pub locations: Option<SheetRow>,
    /// Usable column count shared by all text rows
    pub width: usize,
}

/// Parses the blocks of one table, in order
///
/// Holds the previous block's text codes for the consistency check.
#[derive(Debug)]
pub struct BlockParser {
    table: String,
    reference_code: String,
    previous_codes: Option<BTreeSet<String>>,
}

impl BlockParser {
    pub fn new(table: impl Into<String>, reference_code: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            reference_code: reference_code.into().to_uppercase(),
            previous_codes: None,
        }
    }

    /// Parse `block`, `None` when it has to be skipped
    pub fn parse(&mut self, block: &Block, log: &mut ImportLog) -> Option<ParsedBlock> {
        let start_line = block.start_line();
        let mut lemma: Option<(String, i64)> = None;
        let mut forms: Option<String> = None;
        let mut lines: Vec<TextLine> = Vec::new();
        let mut locations: Option<SheetRow> = None;

        for row in &block.rows {
            let is_freq_row = starts_with_digit(row.text(FREQ_COL));

            if is_freq_row {
                let candidate = row.text(LEMMA_COL).to_string();
                match &lemma {
                    None => {
                        let freq = leading_int(row.text(FREQ_COL)).unwrap_or(0);
                        lemma = Some((candidate, freq));
                    }
                    Some((first, _)) => log.warning(format!(
                        "{}, line {}: more than one lemma in block ('{}' and '{}'), keeping '{}'",
                        self.table, row.line, first, candidate, first
                    )),
                }
            } else if forms.is_none() {
                forms = parse_forms(row.text(LEMMA_COL));
            }

            if !row.text(CODE_COL).is_empty() {
                self.push_line(&mut lines, row.text(CODE_COL).to_uppercase(), row, log);
            } else if is_locations_row(row) {
                if locations.is_some() {
                    log.warning(format!(
                        "{}, line {}: second locations row in block ignored",
                        self.table, row.line
                    ));
                } else {
                    locations = Some(row.clone());
                }
            } else {
                let code = self.reference_code.clone();
                self.push_line(&mut lines, code, row, log);
            }
        }

        self.check_codes(&lines, start_line, log);

        let Some((lemma, freq)) = lemma else {
            log.warning(format!(
                "{}, line {}: no lemma found, block skipped",
                self.table, start_line
            ));
            return None;
        };
        let Some(forms) = forms else {
            log.warning(format!(
                "{}, line {}: no forms found for lemma '{}', block skipped",
                self.table, start_line, lemma
            ));
            return None;
        };

        let width = lines.iter().map(|l| l.row.len()).min().unwrap_or(0);
        let widest = lines.iter().map(|l| l.row.len()).max().unwrap_or(0);
        if widest != width {
            log.warning(format!(
                "{}, line {}: rows of lemma '{}' have different lengths ({} to {}), using {}",
                self.table, start_line, lemma, width, widest, width
            ));
        }

        Some(ParsedBlock {
            start_line,
            lemma: truncate_chars(lemma.trim(), LEMMA_MAX_CHARS),
            forms,
            freq,
            lines,
            locations,
            width,
        })
    }

    fn push_line(&self, lines: &mut Vec<TextLine>, code: String, row: &SheetRow, log: &mut ImportLog) {
        if lines.iter().any(|l| l.code == code) {
            log.warning(format!(
                "{}, line {}: second row for text '{}' in block ignored",
                self.table, row.line, code
            ));
            return;
        }
        lines.push(TextLine {
            code,
            row: row.clone(),
        });
    }

    fn check_codes(&mut self, lines: &[TextLine], start_line: usize, log: &mut ImportLog) {
        let codes: BTreeSet<String> = lines.iter().map(|l| l.code.clone()).collect();

        if let Some(previous) = &self.previous_codes {
            let difference: Vec<&str> = previous
                .symmetric_difference(&codes)
                .map(String::as_str)
                .collect();
            if !difference.is_empty() {
                log.warning(format!(
                    "{}, line {}: texts differ from previous block ({})",
                    self.table,
                    start_line,
                    difference.join(", ")
                ));
            }
        }

        self.previous_codes = Some(codes);
    }
}

/// `"(say,says , said)"` -> `"say, says, said"`
pub fn parse_forms(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix('(')?.strip_suffix(')')?;
    let forms: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    Some(forms.join(", "))
}
