//! Occurrence database operations
//!
//! New occurrences are written in multi-row INSERTs of [`INSERT_CHUNK_ROWS`]
//! rows, keeping each statement under SQLite's bound parameter limit.

use crate::error::ImportResult;
use crate::import::occurrence::OccurrenceFields;
use crate::import::reconcile::OccurrenceKey;
use dral_common::db::{lemma_key, Occurrence};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection};

/// Rows per INSERT statement (15 parameters each)
pub const INSERT_CHUNK_ROWS: usize = 60;

/// Rows per `DELETE .. WHERE id IN (..)` statement
const DELETE_CHUNK_IDS: usize = 500;

/// An occurrence waiting to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOccurrence {
    pub fields: OccurrenceFields,
    pub lemma_id: i64,
    pub chapter_id: i64,
    pub text_id: i64,
}

/// Stored values needed to recompute an occurrence's derived fields
#[derive(Debug, Clone)]
pub struct StoredCell {
    pub id: i64,
    pub text_id: i64,
    pub forms: String,
    pub fields: OccurrenceFields,
}

const OCCURRENCE_COLUMNS: &str = "o.id, o.cell, o.cell_style, o.cell_line, o.cell_col, o.freq, \
     o.string, o.context, o.is_zero, o.is_replace, o.is_paraphrase, o.lemma_group, \
     o.sentence_index, o.lemma_id, o.chapter_id, o.text_id";

/// Every occurrence of a chapter, keyed for reconciliation
pub async fn load_chapter_snapshot(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    chapter_slug: &str,
) -> ImportResult<Vec<(OccurrenceKey, i64, OccurrenceFields)>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}, l.string AS lemma_string, l.forms AS lemma_forms
        FROM occurrences o
        JOIN lemmas l ON l.id = o.lemma_id
        WHERE o.chapter_id = ?
        "#,
        OCCURRENCE_COLUMNS
    ))
    .bind(chapter_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut snapshot = Vec::with_capacity(rows.len());
    for row in rows {
        let occurrence = Occurrence::from_row(&row)?;
        let lemma_string: String = row.try_get("lemma_string")?;
        let lemma_forms: String = row.try_get("lemma_forms")?;
        let key = OccurrenceKey {
            chapter_slug: chapter_slug.to_string(),
            lemma_key: lemma_key(&lemma_string, &lemma_forms),
            text_id: occurrence.text_id,
            cell_col: occurrence.cell_col,
        };
        snapshot.push((key, occurrence.id, OccurrenceFields::from_occurrence(&occurrence)));
    }

    Ok(snapshot)
}

/// Every occurrence with its lemma's forms
pub async fn load_stored_cells(conn: &mut SqliteConnection) -> ImportResult<Vec<StoredCell>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}, l.forms AS lemma_forms
        FROM occurrences o
        JOIN lemmas l ON l.id = o.lemma_id
        ORDER BY o.id
        "#,
        OCCURRENCE_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        let occurrence = Occurrence::from_row(&row)?;
        cells.push(StoredCell {
            id: occurrence.id,
            text_id: occurrence.text_id,
            forms: row.try_get("lemma_forms")?,
            fields: OccurrenceFields::from_occurrence(&occurrence),
        });
    }

    Ok(cells)
}

/// Write every spreadsheet-derived field of occurrence `id`
pub async fn update_occurrence(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &OccurrenceFields,
) -> ImportResult<()> {
    sqlx::query(
        r#"
        UPDATE occurrences SET
            cell = ?, cell_style = ?, cell_line = ?, cell_col = ?, freq = ?,
            string = ?, context = ?, is_zero = ?, is_replace = ?, is_paraphrase = ?,
            lemma_group = ?, sentence_index = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.cell)
    .bind(&fields.cell_style)
    .bind(fields.cell_line)
    .bind(fields.cell_col)
    .bind(fields.freq)
    .bind(&fields.string)
    .bind(&fields.context)
    .bind(fields.zero)
    .bind(fields.replace)
    .bind(fields.paraphrase)
    .bind(fields.lemma_group)
    .bind(fields.sentence_index)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert `occurrences`, returning the number of rows written
pub async fn bulk_insert_occurrences(
    conn: &mut SqliteConnection,
    occurrences: &[NewOccurrence],
) -> ImportResult<u64> {
    let mut inserted = 0;

    for chunk in occurrences.chunks(INSERT_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO occurrences (cell, cell_style, cell_line, cell_col, freq, string, \
             context, is_zero, is_replace, is_paraphrase, lemma_group, sentence_index, \
             lemma_id, chapter_id, text_id) ",
        );
        builder.push_values(chunk, |mut b, o| {
            b.push_bind(&o.fields.cell)
                .push_bind(&o.fields.cell_style)
                .push_bind(o.fields.cell_line)
                .push_bind(o.fields.cell_col)
                .push_bind(o.fields.freq)
                .push_bind(&o.fields.string)
                .push_bind(&o.fields.context)
                .push_bind(o.fields.zero)
                .push_bind(o.fields.replace)
                .push_bind(o.fields.paraphrase)
                .push_bind(o.fields.lemma_group)
                .push_bind(o.fields.sentence_index)
                .push_bind(o.lemma_id)
                .push_bind(o.chapter_id)
                .push_bind(o.text_id);
        });

        inserted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(inserted)
}

pub async fn delete_occurrences(conn: &mut SqliteConnection, ids: &[i64]) -> ImportResult<u64> {
    let mut deleted = 0;

    for chunk in ids.chunks(DELETE_CHUNK_IDS) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM occurrences WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        deleted += builder.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(deleted)
}

pub async fn delete_all_occurrences(conn: &mut SqliteConnection) -> ImportResult<u64> {
    let result = sqlx::query("DELETE FROM occurrences").execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
