//! Spreadsheet import and reconciliation
//!
//! [`Importer::run`] executes one [`Action`] and always returns an
//! [`ImportOutcome`]: errors end up in its `error` field and message list,
//! never as a panic or an early return to the caller.
//!
//! Pipeline for occurrence sheets:
//! reader → [`segmenter`] → [`block`] → [`occurrence`] / [`cleaner`] → [`reconcile`]

pub mod block;
pub mod cleaner;
pub mod log;
pub mod maintenance;
pub mod names;
pub mod occurrence;
pub mod occurrences;
pub mod reconcile;
pub mod segmenter;
pub mod sentences;
pub mod session;
pub mod stats;
pub mod texts;

use crate::error::ImportResult;
use crate::ods::{SheetItem, SheetReader, SheetRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::info;

pub use log::{ImportLog, ImportMessage, Severity};
pub use stats::{ImportStats, RecordStats};

/// Operations of the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Occurrence sheets
    Import,
    /// Sentence sheets
    ImportSentences,
    /// Text metadata sheet
    ImportTexts,
    /// Recompute derived occurrence fields
    Clean,
    /// Delete all imported data
    Clear,
}

static ACTIONS: &[(&str, Action)] = &[
    ("import", Action::Import),
    ("import_sentences", Action::ImportSentences),
    ("import_texts", Action::ImportTexts),
    ("clean", Action::Clean),
    ("clear", Action::Clear),
];

impl Action {
    /// Resolve a command name, `-` and `_` are interchangeable
    pub fn from_name(name: &str) -> Option<Action> {
        let name = name.trim().to_lowercase().replace('-', "_");
        ACTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| *action)
    }

    pub fn name(&self) -> &'static str {
        ACTIONS
            .iter()
            .find(|(_, a)| a == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    /// Whether the action reads a spreadsheet
    pub fn needs_file(&self) -> bool {
        matches!(
            self,
            Action::Import | Action::ImportSentences | Action::ImportTexts
        )
    }
}

/// Result of one importer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub action: Action,
    pub file: Option<PathBuf>,
    /// Message of the error that stopped the run
    pub error: Option<String>,
    pub messages: Vec<ImportMessage>,
    pub stats: ImportStats,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs import actions against one database
#[derive(Debug, Clone)]
pub struct Importer {
    pool: SqlitePool,
    reference_code: String,
}

impl Importer {
    pub fn new(pool: SqlitePool, reference_code: impl Into<String>) -> Self {
        Self {
            pool,
            reference_code: reference_code.into().trim().to_uppercase(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn reference_code(&self) -> &str {
        &self.reference_code
    }

    /// Run `action`, reading `file` for the import actions
    pub async fn run(&self, action: Action, file: Option<&Path>) -> ImportOutcome {
        let started_at = Utc::now();
        let mut log = ImportLog::new();
        let mut stats = ImportStats::default();

        match file {
            Some(path) => info!("Starting {} of {}", action.name(), path.display()),
            None => info!("Starting {}", action.name()),
        }

        let result = self.dispatch(action, file, &mut log, &mut stats).await;

        let error = match result {
            Ok(()) => None,
            Err(e) => {
                let message = e.to_string();
                log.record_error(message.clone());
                Some(message)
            }
        };

        for line in stats.display_lines() {
            info!("{}", line);
        }

        ImportOutcome {
            action,
            file: file.map(Path::to_path_buf),
            error,
            messages: log.into_messages(),
            stats,
            started_at,
            ended_at: Utc::now(),
        }
    }

    async fn dispatch(
        &self,
        action: Action,
        file: Option<&Path>,
        log: &mut ImportLog,
        stats: &mut ImportStats,
    ) -> ImportResult<()> {
        if action.needs_file() && file.is_none() {
            return log.warn(
                Severity::Fatal,
                format!("{} needs a spreadsheet file", action.name()),
            );
        }

        match (action, file) {
            (Action::Import, Some(path)) => {
                occurrences::import_occurrences(&self.pool, path, &self.reference_code, log, stats)
                    .await
            }
            (Action::ImportSentences, Some(path)) => {
                sentences::import_sentences(&self.pool, path, log, stats).await
            }
            (Action::ImportTexts, Some(path)) => texts::import_texts(&self.pool, path, log, stats).await,
            (Action::Clean, _) => {
                maintenance::clean(&self.pool, &self.reference_code, log, stats).await
            }
            (Action::Clear, _) => maintenance::clear(&self.pool, log, stats).await,
            (_, None) => Ok(()),
        }
    }
}

/// Next row of the current table, `None` at its end
pub(crate) fn next_table_row(reader: &mut SheetReader<'_>) -> ImportResult<Option<SheetRow>> {
    while let Some(item) = reader.next_item()? {
        match item {
            SheetItem::Row(row) => return Ok(Some(row)),
            SheetItem::TableEnd { .. } => return Ok(None),
            SheetItem::TableStart { .. } => {}
        }
    }
    Ok(None)
}

/// Consume the rest of the current table
pub(crate) fn skip_table(reader: &mut SheetReader<'_>) -> ImportResult<()> {
    while next_table_row(reader)?.is_some() {}
    Ok(())
}
