//! Text database operations

use crate::error::ImportResult;
use crate::import::names::truncate_chars;
use dral_common::db::Text;
use sqlx::SqliteConnection;
use tracing::debug;

/// Maximum length of a text code
pub const CODE_MAX_CHARS: usize = 20;

const TEXT_COLUMNS: &str = "id, code, pointer, reference, original_publication_year, \
     production_year, authors, language, public_note, internal_note, is_public";

/// Text codes are stored upper-cased and truncated
pub fn normalize_code(code: &str) -> String {
    truncate_chars(code.trim(), CODE_MAX_CHARS).to_uppercase()
}

pub async fn load_text_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> ImportResult<Option<Text>> {
    let text = sqlx::query_as::<_, Text>(&format!(
        "SELECT {} FROM texts WHERE code = ?",
        TEXT_COLUMNS
    ))
    .bind(normalize_code(code))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(text)
}

/// Fetch the text with `code`, creating a bare one when missing
pub async fn get_or_create_text(conn: &mut SqliteConnection, code: &str) -> ImportResult<Text> {
    if let Some(text) = load_text_by_code(conn, code).await? {
        return Ok(text);
    }

    let code = normalize_code(code);
    let id = sqlx::query("INSERT INTO texts (code) VALUES (?)")
        .bind(&code)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    debug!("Text '{}' created", code);

    Ok(Text {
        id,
        code,
        pointer: None,
        reference: None,
        original_publication_year: None,
        production_year: None,
        authors: None,
        language: None,
        public_note: None,
        internal_note: None,
        is_public: false,
    })
}

/// Insert `text` (its id is ignored), returning the new id
pub async fn insert_text(conn: &mut SqliteConnection, text: &Text) -> ImportResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO texts (
            code, pointer, reference, original_publication_year, production_year,
            authors, language, public_note, internal_note, is_public
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(normalize_code(&text.code))
    .bind(&text.pointer)
    .bind(&text.reference)
    .bind(text.original_publication_year)
    .bind(text.production_year)
    .bind(&text.authors)
    .bind(&text.language)
    .bind(&text.public_note)
    .bind(&text.internal_note)
    .bind(text.is_public)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Write every metadata field of `text` (the code is not changed)
pub async fn update_text(conn: &mut SqliteConnection, text: &Text) -> ImportResult<()> {
    sqlx::query(
        r#"
        UPDATE texts SET
            pointer = ?, reference = ?, original_publication_year = ?, production_year = ?,
            authors = ?, language = ?, public_note = ?, internal_note = ?, is_public = ?
        WHERE id = ?
        "#,
    )
    .bind(&text.pointer)
    .bind(&text.reference)
    .bind(text.original_publication_year)
    .bind(text.production_year)
    .bind(&text.authors)
    .bind(&text.language)
    .bind(&text.public_note)
    .bind(&text.internal_note)
    .bind(text.is_public)
    .bind(text.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn list_texts(conn: &mut SqliteConnection) -> ImportResult<Vec<Text>> {
    let texts = sqlx::query_as::<_, Text>(&format!(
        "SELECT {} FROM texts ORDER BY code",
        TEXT_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await?;

    Ok(texts)
}

/// Delete texts no occurrence, sentence or lemma refers to
pub async fn delete_unreferenced_texts(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM texts
        WHERE NOT EXISTS (SELECT 1 FROM occurrences o WHERE o.text_id = texts.id)
          AND NOT EXISTS (SELECT 1 FROM sentences s WHERE s.text_id = texts.id)
          AND NOT EXISTS (SELECT 1 FROM lemmas l WHERE l.text_id = texts.id)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
