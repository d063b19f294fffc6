//! Import statistics
//!
//! Counters are kept per table and merged into the run totals only once the
//! table's transaction has committed.

use serde::{Deserialize, Serialize};

/// What an upsert did to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Created,
    Updated,
    Unchanged,
}

/// Create / update / delete counts for one kind of record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl RecordStats {
    pub fn display_string(&self, label: &str) -> String {
        format!(
            "{}: {} created, {} updated, {} deleted, {} unchanged",
            label, self.created, self.updated, self.deleted, self.unchanged
        )
    }

    pub fn record(&mut self, change: RecordChange) {
        match change {
            RecordChange::Created => self.created += 1,
            RecordChange::Updated => self.updated += 1,
            RecordChange::Unchanged => self.unchanged += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn absorb(&mut self, other: &RecordStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
    }
}

/// Totals of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub tables_imported: usize,
    pub tables_skipped: usize,
    pub blocks_imported: usize,
    pub blocks_skipped: usize,
    pub cells: RecordStats,
    pub lemmas: RecordStats,
    pub chapters: RecordStats,
    pub styles: RecordStats,
    pub sentences: RecordStats,
    pub texts: RecordStats,
}

impl ImportStats {
    pub fn absorb(&mut self, other: &ImportStats) {
        self.tables_imported += other.tables_imported;
        self.tables_skipped += other.tables_skipped;
        self.blocks_imported += other.blocks_imported;
        self.blocks_skipped += other.blocks_skipped;
        self.cells.absorb(&other.cells);
        self.lemmas.absorb(&other.lemmas);
        self.chapters.absorb(&other.chapters);
        self.styles.absorb(&other.styles);
        self.sentences.absorb(&other.sentences);
        self.texts.absorb(&other.texts);
    }

    /// One line per non-empty counter group
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Tables: {} imported, {} skipped",
            self.tables_imported, self.tables_skipped
        )];
        if self.blocks_imported + self.blocks_skipped > 0 {
            lines.push(format!(
                "Blocks: {} imported, {} skipped",
                self.blocks_imported, self.blocks_skipped
            ));
        }
        for (label, stats) in [
            ("Cells", &self.cells),
            ("Lemmas", &self.lemmas),
            ("Chapters", &self.chapters),
            ("Styles", &self.styles),
            ("Sentences", &self.sentences),
            ("Texts", &self.texts),
        ] {
            if !stats.is_empty() {
                lines.push(stats.display_string(label));
            }
        }
        lines
    }
}
