//! Unit tests for database initialization
//!
//! - Automatic database creation on first run
//! - Idempotent schema creation on existing databases
//! - Foreign key enforcement on every pooled connection

use dral_common::db::init::init_database;
use dral_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("dral.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dral.db");

    let pool1 = init_database(&db_path).await.expect("first open");
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("dral.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "chapters",
        "lemmas",
        "occurrences",
        "schema_version",
        "sentences",
        "sheet_styles",
        "texts",
    ] {
        assert!(tables.iter().any(|t| t == expected), "Missing table: {}", expected);
    }
}

#[tokio::test]
async fn test_schema_version_recorded() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("dral.db")).await.unwrap();

    let version = get_schema_version(&pool).await.unwrap();
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_reopen_keeps_baseline_version() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dral.db");

    init_database(&db_path).await.unwrap().close().await;
    let pool = init_database(&db_path).await.unwrap();

    let versions: Vec<i32> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);
    assert_eq!(CURRENT_SCHEMA_VERSION, 1);

    let has_production_year: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('texts') WHERE name = 'production_year'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(has_production_year);
}

#[tokio::test]
async fn test_referenced_lemma_cannot_be_deleted() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("dral.db")).await.unwrap();

    sqlx::query("INSERT INTO texts (id, code) VALUES (1, 'EN')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO chapters (id, slug, name) VALUES (1, 'benjy', 'BENJY')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO lemmas (id, string, forms, text_id) VALUES (1, 'say', 'say, said', 1)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO occurrences (cell, cell_col, lemma_id, chapter_id, text_id) VALUES ('said', 4, 1, 1, 1)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = sqlx::query("DELETE FROM lemmas WHERE id = 1").execute(&pool).await;
    assert!(result.is_err(), "Deleting a referenced lemma should be blocked");

    let result = sqlx::query("DELETE FROM chapters WHERE id = 1").execute(&pool).await;
    assert!(result.is_err(), "Deleting a referenced chapter should be blocked");
}
