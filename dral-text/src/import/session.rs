//! Per-table import state machine
//!
//! INIT → STYLES → ROWS → POST → DONE, or FAILED from any state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Table import state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableState {
    /// Chapter upserted, existing rows loaded
    Init,
    /// Sheet styles reconciled
    Styles,
    /// Rows streamed into blocks and occurrences
    Rows,
    /// Bulk create, delete unkept, purge orphans
    Post,
    /// Committed
    Done,
    /// Rolled back
    Failed,
}

/// Import of one spreadsheet table
#[derive(Debug, Clone)]
pub struct TableSession {
    pub table: String,
    pub state: TableState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TableSession {
    pub fn new(table: impl Into<String>) -> Self {
        let session = Self {
            table: table.into(),
            state: TableState::Init,
            started_at: Utc::now(),
            ended_at: None,
        };
        debug!("Table '{}': {:?}", session.table, session.state);
        session
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: TableState) {
        debug!(
            "Table '{}': {:?} -> {:?}",
            self.table, self.state, new_state
        );
        self.state = new_state;

        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TableState::Done | TableState::Failed)
    }

    /// Milliseconds since the session started
    pub fn elapsed_ms(&self) -> i64 {
        (self.ended_at.unwrap_or_else(Utc::now) - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut session = TableSession::new("BENJY #1");
        assert_eq!(session.state, TableState::Init);
        assert!(!session.is_terminal());

        for state in [TableState::Styles, TableState::Rows, TableState::Post] {
            session.transition_to(state);
            assert!(session.ended_at.is_none());
        }

        session.transition_to(TableState::Done);
        assert!(session.is_terminal());
        assert!(session.ended_at.is_some());
        assert!(session.elapsed_ms() >= 0);
    }
}
