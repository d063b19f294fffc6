//! Sheet style database operations

use crate::error::ImportResult;
use dral_common::db::SheetStyle;
use sqlx::SqliteConnection;
use std::collections::HashMap;

pub async fn load_styles(
    conn: &mut SqliteConnection,
    chapter_id: i64,
) -> ImportResult<HashMap<String, SheetStyle>> {
    let styles = sqlx::query_as::<_, SheetStyle>(
        "SELECT id, chapter_id, name, color FROM sheet_styles WHERE chapter_id = ?",
    )
    .bind(chapter_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(styles.into_iter().map(|s| (s.name.clone(), s)).collect())
}

pub async fn insert_style(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    name: &str,
    color: &str,
) -> ImportResult<i64> {
    let id = sqlx::query("INSERT INTO sheet_styles (chapter_id, name, color) VALUES (?, ?, ?)")
        .bind(chapter_id)
        .bind(name)
        .bind(color)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok(id)
}

pub async fn update_style_color(
    conn: &mut SqliteConnection,
    id: i64,
    color: &str,
) -> ImportResult<()> {
    sqlx::query("UPDATE sheet_styles SET color = ? WHERE id = ?")
        .bind(color)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn delete_all_styles(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query("DELETE FROM sheet_styles").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
