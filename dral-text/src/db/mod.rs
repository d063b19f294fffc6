//! Repository functions for the import pipeline
//!
//! Every function takes `&mut SqliteConnection` so the importers can run a
//! whole table inside one transaction, while read-only callers pass a pooled
//! connection.

pub mod chapters;
pub mod lemmas;
pub mod occurrences;
pub mod reports;
pub mod sentences;
pub mod styles;
pub mod texts;
