//! Database Test Utilities

use dral_common::db::init_database;
use dral_text::Importer;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Reference text code used by every test importer
pub const REFERENCE: &str = "EN";

/// Create a temporary database and an importer on it
///
/// Returns (TempDir, Importer) - TempDir must be kept alive for duration of test
pub async fn create_test_importer() -> (TempDir, Importer) {
    let temp_dir = TempDir::new().expect("temp dir");
    let pool = init_database(&temp_dir.path().join("dral.db"))
        .await
        .expect("database");

    (temp_dir, Importer::new(pool, REFERENCE))
}

/// Number of rows in `table`
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count")
}
