//! Lemma block segmentation
//!
//! Groups the rows of one occurrence table into blocks, one block per lemma.
//!
//! Only two columns decide block boundaries:
//! - the anchor column ([`ANCHOR_COL`]): rows with nothing there are separators
//! - the text code column ([`CODE_COL`]): a blank code with a numeric anchor
//!   is a locations row, and a locations row opens a new block

use crate::import::names::starts_with_digit;
use crate::ods::SheetRow;

/// Column holding the lemma (frequency row) or the forms
pub const LEMMA_COL: usize = 1;
/// Column holding the frequency
pub const FREQ_COL: usize = 2;
/// Column holding the text code
pub const CODE_COL: usize = 3;
/// First data column; non-empty means the row belongs to a block
pub const ANCHOR_COL: usize = 4;

/// Consecutive rows describing one lemma
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub rows: Vec<SheetRow>,
}

impl Block {
    /// 1-based sheet line of the first row
    pub fn start_line(&self) -> usize {
        self.rows.first().map(|r| r.line).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Is `row` the locations row that opens a block?
pub fn is_locations_row(row: &SheetRow) -> bool {
    row.text(CODE_COL).is_empty() && starts_with_digit(row.text(ANCHOR_COL))
}

/// Incremental block builder fed one row at a time
#[derive(Debug, Default)]
pub struct BlockSegmenter {
    current: Block,
}

impl BlockSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row, returning the previous block when `row` starts a new one
    pub fn push(&mut self, row: SheetRow) -> Option<Block> {
        if row.text(ANCHOR_COL).is_empty() {
            return None;
        }

        if is_locations_row(&row) {
            let flushed = self.take();
            self.current.rows.push(row);
            return flushed;
        }

        self.current.rows.push(row);
        None
    }

    /// Flush the last block at the end of the table
    pub fn finish(&mut self) -> Option<Block> {
        self.take()
    }

    fn take(&mut self) -> Option<Block> {
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ods::SheetCell;

    fn row(line: usize, values: &[&str]) -> SheetRow {
        SheetRow::new(line, values.iter().map(|v| SheetCell::new(*v, "")).collect())
    }

    #[test]
    fn test_locations_row_flushes_previous_block() {
        let r1 = row(1, &["", "", "", "", "1"]);
        let r2 = row(2, &["", "", "", "RU", "word"]);
        let r3 = row(3, &["", "", "", "", "2"]);

        let mut segmenter = BlockSegmenter::new();
        assert_eq!(segmenter.push(r1.clone()), None);
        assert_eq!(segmenter.push(r2.clone()), None);

        let flushed = segmenter.push(r3.clone()).expect("block flushed");
        assert_eq!(flushed.rows, vec![r1, r2]);
        assert_eq!(flushed.start_line(), 1);

        let last = segmenter.finish().expect("last block");
        assert_eq!(last.rows, vec![r3]);
        assert_eq!(segmenter.finish(), None);
    }

    #[test]
    fn test_rows_without_anchor_are_ignored() {
        let mut segmenter = BlockSegmenter::new();
        segmenter.push(row(1, &["", "", "", "", "1"]));
        segmenter.push(row(2, &["note", "", "", "EN"]));
        segmenter.push(row(3, &[]));
        segmenter.push(row(4, &["", "", "", "EN", "said"]));

        let block = segmenter.finish().unwrap();
        assert_eq!(block.rows.len(), 2);
        assert_eq!(block.rows[1].line, 4);
    }

    #[test]
    fn test_text_anchor_with_blank_code_does_not_split() {
        let mut segmenter = BlockSegmenter::new();
        segmenter.push(row(1, &["", "", "", "", "1"]));
        assert_eq!(segmenter.push(row(2, &["say", "3", "", "", "she said so"])), None);

        let block = segmenter.finish().unwrap();
        assert_eq!(block.rows.len(), 2);
    }

    #[test]
    fn test_leading_rows_before_first_locations_row_form_a_block() {
        let mut segmenter = BlockSegmenter::new();
        segmenter.push(row(1, &["", "", "", "EN", "header"]));
        let flushed = segmenter.push(row(2, &["", "", "", "", "1"]));
        assert_eq!(flushed.map(|b| b.rows.len()), Some(1));
    }
}
