//! Database initialization
//!
//! Opens (or creates) the SQLite database and makes sure every table the
//! importers need exists. Safe to call on every start.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Milliseconds a connection waits on a locked database before failing
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys are a per-connection pragma, so they go in the connect options
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_texts_table(pool).await?;
    create_chapters_table(pool).await?;
    create_lemmas_table(pool).await?;
    create_occurrences_table(pool).await?;
    create_sentences_table(pool).await?;
    create_sheet_styles_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Language variants of the corpus (translations and the reference original)
async fn create_texts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS texts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            pointer TEXT,
            reference TEXT,
            original_publication_year INTEGER,
            production_year INTEGER,
            authors TEXT,
            language TEXT,
            public_note TEXT,
            internal_note TEXT,
            is_public INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chapters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            display_order INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_lemmas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lemmas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            string TEXT NOT NULL,
            forms TEXT NOT NULL DEFAULT '',
            text_id INTEGER NOT NULL REFERENCES texts(id) ON DELETE RESTRICT,
            UNIQUE(string, forms)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One spreadsheet cell per (chapter, lemma, column, text)
async fn create_occurrences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cell TEXT NOT NULL DEFAULT '',
            cell_style TEXT NOT NULL DEFAULT '',
            cell_line INTEGER NOT NULL DEFAULT 0,
            cell_col INTEGER NOT NULL DEFAULT 0,
            freq INTEGER NOT NULL DEFAULT 0,
            string TEXT,
            context TEXT NOT NULL DEFAULT '',
            is_zero INTEGER NOT NULL DEFAULT 0,
            is_replace INTEGER NOT NULL DEFAULT 0,
            is_paraphrase INTEGER NOT NULL DEFAULT 0,
            lemma_group INTEGER NOT NULL DEFAULT 0,
            sentence_index INTEGER NOT NULL DEFAULT 0,
            lemma_id INTEGER NOT NULL REFERENCES lemmas(id) ON DELETE RESTRICT,
            chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE RESTRICT,
            text_id INTEGER NOT NULL REFERENCES texts(id) ON DELETE RESTRICT,
            UNIQUE(chapter_id, lemma_id, cell_col, text_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_occurrences_lemma ON occurrences(lemma_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_occurrences_text ON occurrences(text_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sentences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE RESTRICT,
            text_id INTEGER NOT NULL REFERENCES texts(id) ON DELETE RESTRICT,
            sentence_index INTEGER NOT NULL,
            string TEXT NOT NULL DEFAULT '',
            UNIQUE(chapter_id, text_id, sentence_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Cell styles (background colours) used in a chapter's sheet
async fn create_sheet_styles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sheet_styles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            color TEXT NOT NULL DEFAULT '',
            UNIQUE(chapter_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
