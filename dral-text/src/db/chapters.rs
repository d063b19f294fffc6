//! Chapter database operations

use crate::error::ImportResult;
use crate::import::names::ChapterName;
use crate::import::stats::RecordChange;
use dral_common::db::Chapter;
use sqlx::SqliteConnection;
use tracing::debug;

pub async fn load_chapter_by_slug(
    conn: &mut SqliteConnection,
    slug: &str,
) -> ImportResult<Option<Chapter>> {
    let chapter = sqlx::query_as::<_, Chapter>(
        "SELECT id, slug, name, display_order FROM chapters WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(chapter)
}

/// Fetch the chapter by slug, creating or updating it from `parsed`
///
/// An existing chapter keeps its display order when `parsed` has none.
pub async fn upsert_chapter(
    conn: &mut SqliteConnection,
    parsed: &ChapterName,
) -> ImportResult<(Chapter, RecordChange)> {
    if let Some(mut chapter) = load_chapter_by_slug(conn, &parsed.slug).await? {
        let mut change = RecordChange::Unchanged;
        let display_order = parsed.display_order.unwrap_or(chapter.display_order);
        if chapter.name != parsed.name || chapter.display_order != display_order {
            sqlx::query("UPDATE chapters SET name = ?, display_order = ? WHERE id = ?")
                .bind(&parsed.name)
                .bind(display_order)
                .bind(chapter.id)
                .execute(&mut *conn)
                .await?;
            debug!(
                "Chapter '{}' updated (order {} -> {})",
                chapter.slug, chapter.display_order, display_order
            );
            chapter.name = parsed.name.clone();
            chapter.display_order = display_order;
            change = RecordChange::Updated;
        }
        return Ok((chapter, change));
    }

    let display_order = parsed.display_order.unwrap_or(0);
    let id = sqlx::query("INSERT INTO chapters (slug, name, display_order) VALUES (?, ?, ?)")
        .bind(&parsed.slug)
        .bind(&parsed.name)
        .bind(display_order)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    debug!("Chapter '{}' created", parsed.slug);

    let chapter = Chapter {
        id,
        slug: parsed.slug.clone(),
        name: parsed.name.clone(),
        display_order,
    };
    Ok((chapter, RecordChange::Created))
}

/// Delete chapters with neither occurrences nor sentences
///
/// Sheet styles go with their chapter.
pub async fn delete_orphan_chapters(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM chapters
        WHERE NOT EXISTS (SELECT 1 FROM occurrences o WHERE o.chapter_id = chapters.id)
          AND NOT EXISTS (SELECT 1 FROM sentences s WHERE s.chapter_id = chapters.id)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_all_chapters(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query("DELETE FROM chapters").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
