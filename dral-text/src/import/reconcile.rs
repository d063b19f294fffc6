//! In-memory reconciliation of occurrences
//!
//! The snapshot holds every existing occurrence of the chapter being
//! imported, keyed by [`OccurrenceKey`]. Each freshly built record is
//! matched against it; whatever is never matched is deleted afterwards.

use crate::import::occurrence::OccurrenceFields;
use std::collections::{HashMap, HashSet};

/// Natural key of an occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccurrenceKey {
    pub chapter_slug: String,
    /// `"string (forms)"` of the lemma
    pub lemma_key: String,
    pub text_id: i64,
    pub cell_col: i64,
}

/// Existing occurrence as loaded from the store
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub id: i64,
    pub fields: OccurrenceFields,
    /// Seen again in the current import
    pub keep: bool,
}

/// What to do with an incoming record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// No existing row, queue for creation
    Create,
    /// Existing row with different values
    Update { id: i64, changed: Vec<&'static str> },
    Unchanged,
    /// Key already handled in this import, drop the record
    Duplicate,
}

#[derive(Debug, Default)]
pub struct OccurrenceSnapshot {
    entries: HashMap<OccurrenceKey, SnapshotEntry>,
    seen: HashSet<OccurrenceKey>,
}

impl OccurrenceSnapshot {
    pub fn new(existing: Vec<(OccurrenceKey, i64, OccurrenceFields)>) -> Self {
        let entries = existing
            .into_iter()
            .map(|(key, id, fields)| {
                (
                    key,
                    SnapshotEntry {
                        id,
                        fields,
                        keep: false,
                    },
                )
            })
            .collect();

        Self {
            entries,
            seen: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match `fields` against the snapshot and mark the existing row as kept
    pub fn reconcile(&mut self, key: &OccurrenceKey, fields: &OccurrenceFields) -> Reconciled {
        if !self.seen.insert(key.clone()) {
            return Reconciled::Duplicate;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.keep = true;
                let changed = entry.fields.diff(fields);
                if changed.is_empty() {
                    Reconciled::Unchanged
                } else {
                    entry.fields = fields.clone();
                    Reconciled::Update {
                        id: entry.id,
                        changed,
                    }
                }
            }
            None => Reconciled::Create,
        }
    }

    /// Ids of existing rows not seen in this import
    pub fn unkept_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .entries
            .values()
            .filter(|e| !e.keep)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
