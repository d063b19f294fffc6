//! Read-only queries for reporting front ends
//!
//! - `list_occurrences`: filtered, paginated occurrence listing
//! - `omission_report`: how often each lemma is omitted in one text

use crate::error::ImportResult;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Occurrence listing filters, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccurrenceFilter {
    /// Text code
    pub text: Option<String>,
    /// Lemma string
    pub lemma: Option<String>,
    /// Chapter slug
    pub chapter: Option<String>,
}

/// One listed occurrence
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OccurrenceListRow {
    pub id: i64,
    pub chapter: String,
    pub lemma: String,
    pub forms: String,
    pub text: String,
    pub cell: String,
    pub cell_style: String,
    pub cell_line: i64,
    pub cell_col: i64,
    pub freq: i64,
    pub string: Option<String>,
    #[sqlx(rename = "is_zero")]
    pub zero: bool,
    #[sqlx(rename = "is_replace")]
    pub replace: bool,
    #[sqlx(rename = "is_paraphrase")]
    pub paraphrase: bool,
    pub lemma_group: i64,
    pub sentence_index: i64,
}

/// One page of the occurrence listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrencePage {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub rows: Vec<OccurrenceListRow>,
}

const LIST_FROM: &str = r#"
    FROM occurrences o
    JOIN chapters c ON c.id = o.chapter_id
    JOIN lemmas l ON l.id = o.lemma_id
    JOIN texts t ON t.id = o.text_id
    WHERE 1 = 1"#;

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OccurrenceFilter) {
    if let Some(text) = &filter.text {
        builder.push(" AND t.code = ").push_bind(text.trim().to_uppercase());
    }
    if let Some(lemma) = &filter.lemma {
        builder.push(" AND l.string = ").push_bind(lemma.clone());
    }
    if let Some(chapter) = &filter.chapter {
        builder.push(" AND c.slug = ").push_bind(chapter.clone());
    }
}

/// Occurrences matching `filter`, page `page` (clamped)
///
/// Sorted by chapter order, lemma, text, sentence index, then id.
pub async fn list_occurrences(
    conn: &mut SqliteConnection,
    filter: &OccurrenceFilter,
    page: i64,
) -> ImportResult<OccurrencePage> {
    let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*)");
    count.push(LIST_FROM);
    push_filter(&mut count, filter);
    let total_results: i64 = count
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let p = calculate_pagination(total_results, page);

    let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"SELECT o.id, c.slug AS chapter, l.string AS lemma, l.forms AS forms, t.code AS text,
           o.cell, o.cell_style, o.cell_line, o.cell_col, o.freq, o.string,
           o.is_zero, o.is_replace, o.is_paraphrase,
           o.lemma_group, o.sentence_index"#,
    );
    select.push(LIST_FROM);
    push_filter(&mut select, filter);
    select
        .push(" ORDER BY c.display_order, l.string, t.code, o.sentence_index, o.id LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(p.offset);

    let rows = select
        .build_query_as::<OccurrenceListRow>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(OccurrencePage {
        total_results,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        rows,
    })
}

/// Relative omission of one lemma in one text
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OmissionRow {
    pub lemma: String,
    pub text: String,
    pub freq: i64,
    pub omitted: i64,
    pub ratio_omitted: f64,
}

/// Per-lemma omission counts for the text `code`, most frequent first
pub async fn omission_report(
    conn: &mut SqliteConnection,
    code: &str,
) -> ImportResult<Vec<OmissionRow>> {
    let rows = sqlx::query_as::<_, OmissionRow>(
        r#"
        SELECT l.string AS lemma,
               t.code AS text,
               COUNT(*) AS freq,
               SUM(o.is_zero) AS omitted,
               CAST(SUM(o.is_zero) AS REAL) / COUNT(*) AS ratio_omitted
        FROM occurrences o
        JOIN lemmas l ON l.id = o.lemma_id
        JOIN texts t ON t.id = o.text_id
        WHERE t.code = ?
        GROUP BY l.id, t.id
        ORDER BY freq DESC, l.string
        "#,
    )
    .bind(code.trim().to_uppercase())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}
