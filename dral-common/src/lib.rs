//! # DRaL Common Library
//!
//! Shared code for the DRaL text tools:
//! - Database schema and row models
//! - Configuration loading (CLI > environment > TOML > defaults)
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use config::Settings;
pub use error::{Error, Result};
