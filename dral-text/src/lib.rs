//! dral-text library interface
//!
//! Imports DRaL spreadsheets (OpenDocument `.ods` or extracted
//! `content.xml`) into the relational store and reconciles them with what
//! earlier imports left there.
//!
//! Exposed for the `dral-text` binary and for integration testing.

pub mod db;
pub mod error;
pub mod import;
pub mod ods;
pub mod pagination;

pub use crate::error::{ImportError, ImportResult};
pub use crate::import::{Action, ImportOutcome, Importer};
