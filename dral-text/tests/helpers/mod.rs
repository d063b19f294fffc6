//! Test Helper Utilities
//!
//! Shared utilities for testing dral-text

#![allow(dead_code)]

pub mod db_utils;
pub mod sheets;

pub use db_utils::{count_rows, create_test_importer};
pub use sheets::{document, table, write_sheet};
