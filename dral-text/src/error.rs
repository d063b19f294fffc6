//! Error types for dral-text
//!
//! `Fatal` is the only variant raised on purpose by the importers: it aborts
//! the current file. Every other variant wraps an unexpected failure of a
//! collaborator (store, XML, archive).

use thiserror::Error;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Fatal import warning: the whole file is abandoned
    #[error("{0}")]
    Fatal(String),

    /// Malformed spreadsheet XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Unreadable `.ods` archive
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
