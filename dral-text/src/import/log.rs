//! Import message log
//!
//! Every diagnostic raised during an import is recorded here in order, so
//! the caller gets the full list back, and is also emitted as a tracing
//! event.
//!
//! A `Fatal` message turns into `Err(ImportError::Fatal)`, so importers stop
//! with `log.warn(Severity::Fatal, ..)?`.

use crate::error::{ImportError, ImportResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Progress note
    Info,
    /// Something was skipped or looks wrong, import continues
    Warning,
    /// The file cannot be imported
    Fatal,
}

/// One logged message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMessage {
    pub severity: Severity,
    pub message: String,
    pub logged_at: DateTime<Utc>,
}

/// Ordered message list for one import run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportLog {
    messages: Vec<ImportMessage>,
}

impl ImportLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message
    ///
    /// Returns `Err(ImportError::Fatal)` for [`Severity::Fatal`].
    pub fn warn(&mut self, severity: Severity, message: impl Into<String>) -> ImportResult<()> {
        let message = message.into();

        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Fatal => error!("{}", message),
        }

        self.messages.push(ImportMessage {
            severity,
            message: message.clone(),
            logged_at: Utc::now(),
        });

        if severity == Severity::Fatal {
            return Err(ImportError::Fatal(message));
        }
        Ok(())
    }

    pub fn info(&mut self, message: impl Into<String>) {
        // Only Fatal can fail
        let _ = self.warn(Severity::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let _ = self.warn(Severity::Warning, message);
    }

    /// Record an error that ended the run without going through `warn`
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        let already_logged = self
            .messages
            .last()
            .map(|m| m.severity == Severity::Fatal && m.message == message)
            .unwrap_or(false);
        if !already_logged {
            let _ = self.warn(Severity::Fatal, message);
        }
    }

    pub fn messages(&self) -> &[ImportMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ImportMessage> {
        self.messages
    }

    /// Count messages by severity
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }
}
