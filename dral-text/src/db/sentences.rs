//! Sentence database operations

use crate::error::ImportResult;
use dral_common::db::Sentence;
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Sentences of one (chapter, text), keyed by index
pub async fn load_sentences(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    text_id: i64,
) -> ImportResult<HashMap<i64, Sentence>> {
    let sentences = sqlx::query_as::<_, Sentence>(
        r#"
        SELECT id, chapter_id, text_id, sentence_index, string
        FROM sentences
        WHERE chapter_id = ? AND text_id = ?
        "#,
    )
    .bind(chapter_id)
    .bind(text_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(sentences
        .into_iter()
        .map(|s| (s.sentence_index, s))
        .collect())
}

pub async fn insert_sentence(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    text_id: i64,
    sentence_index: i64,
    string: &str,
) -> ImportResult<i64> {
    let id = sqlx::query(
        "INSERT INTO sentences (chapter_id, text_id, sentence_index, string) VALUES (?, ?, ?, ?)",
    )
    .bind(chapter_id)
    .bind(text_id)
    .bind(sentence_index)
    .bind(string)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_sentence_string(
    conn: &mut SqliteConnection,
    id: i64,
    string: &str,
) -> ImportResult<()> {
    sqlx::query("UPDATE sentences SET string = ? WHERE id = ?")
        .bind(string)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete the sentences of (chapter, text) past `last_index`
pub async fn delete_sentences_after(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    text_id: i64,
    last_index: i64,
) -> ImportResult<u64> {
    let result = sqlx::query(
        "DELETE FROM sentences WHERE chapter_id = ? AND text_id = ? AND sentence_index > ?",
    )
    .bind(chapter_id)
    .bind(text_id)
    .bind(last_index)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_all_sentences(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query("DELETE FROM sentences").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
