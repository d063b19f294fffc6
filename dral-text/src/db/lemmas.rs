//! Lemma database operations

use crate::error::ImportResult;
use dral_common::db::{lemma_key, Lemma};
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Every lemma id keyed by `"string (forms)"`
pub async fn load_lemma_index(conn: &mut SqliteConnection) -> ImportResult<HashMap<String, i64>> {
    let lemmas = sqlx::query_as::<_, Lemma>("SELECT id, string, forms, text_id FROM lemmas")
        .fetch_all(&mut *conn)
        .await?;

    Ok(lemmas.into_iter().map(|l| (l.key(), l.id)).collect())
}

pub async fn insert_lemma(
    conn: &mut SqliteConnection,
    string: &str,
    forms: &str,
    text_id: i64,
) -> ImportResult<i64> {
    let id = sqlx::query("INSERT INTO lemmas (string, forms, text_id) VALUES (?, ?, ?)")
        .bind(string)
        .bind(forms)
        .bind(text_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    tracing::debug!("Lemma '{}' created", lemma_key(string, forms));
    Ok(id)
}

/// Delete lemmas no occurrence refers to
pub async fn delete_orphan_lemmas(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query(
        "DELETE FROM lemmas WHERE NOT EXISTS (SELECT 1 FROM occurrences o WHERE o.lemma_id = lemmas.id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_all_lemmas(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query("DELETE FROM lemmas").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
