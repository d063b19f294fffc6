//! Text metadata import
//!
//! The first non-empty row of each table is a header naming text fields.
//! Every following row with a code creates or updates that text.

use crate::db::texts;
use crate::error::ImportResult;
use crate::import::log::ImportLog;
use crate::import::names::{is_skipped_table, leading_int};
use crate::import::stats::ImportStats;
use crate::import::{next_table_row, skip_table};
use crate::ods::{read_content_xml, SheetItem, SheetReader, SheetRow};
use dral_common::db::Text;
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;

/// A text field a header cell can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Code,
    Pointer,
    Reference,
    OriginalPublicationYear,
    ProductionYear,
    Authors,
    Language,
    PublicNote,
    InternalNote,
    IsPublic,
}

static TEXT_FIELDS: &[(&str, TextField)] = &[
    ("code", TextField::Code),
    ("pointer", TextField::Pointer),
    ("reference", TextField::Reference),
    ("original_publication_year", TextField::OriginalPublicationYear),
    ("year", TextField::OriginalPublicationYear),
    ("production_year", TextField::ProductionYear),
    ("authors", TextField::Authors),
    ("language", TextField::Language),
    ("public_note", TextField::PublicNote),
    ("internal_note", TextField::InternalNote),
    ("is_public", TextField::IsPublic),
];

impl TextField {
    /// Resolve a header cell, e.g. `"Production Year"`
    pub fn from_header(header: &str) -> Option<TextField> {
        let normalized = header.trim().to_lowercase().replace([' ', '-'], "_");
        TEXT_FIELDS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, field)| *field)
    }
}

pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "yes" | "y" | "true" | "x"
    )
}

pub async fn import_texts(
    pool: &SqlitePool,
    path: &Path,
    log: &mut ImportLog,
    stats: &mut ImportStats,
) -> ImportResult<()> {
    let xml = read_content_xml(path)?;
    let mut reader = SheetReader::new(&xml);

    while let Some(item) = reader.next_item()? {
        let SheetItem::TableStart { name } = item else {
            continue;
        };

        if is_skipped_table(&name) {
            log.info(format!("Table '{}' skipped", name));
            skip_table(&mut reader)?;
            stats.tables_skipped += 1;
            continue;
        }

        let mut tx = pool.begin().await?;
        let table_stats = import_text_table(&mut tx, &mut reader, &name, log).await?;
        tx.commit().await?;

        log.info(format!("{}: {}", name, table_stats.texts.display_string("texts")));
        stats.absorb(&table_stats);
    }

    Ok(())
}

async fn import_text_table(
    conn: &mut SqliteConnection,
    reader: &mut SheetReader<'_>,
    table: &str,
    log: &mut ImportLog,
) -> ImportResult<ImportStats> {
    let mut stats = ImportStats::default();
    let mut columns: Option<Vec<(usize, TextField)>> = None;

    while let Some(row) = next_table_row(reader)? {
        if row.is_empty() {
            continue;
        }

        if columns.is_none() {
            columns = Some(header_columns(&row, table, log));
            continue;
        }
        let Some(columns) = &columns else {
            continue;
        };

        let Some(code_col) = columns
            .iter()
            .find(|(_, f)| *f == TextField::Code)
            .map(|(col, _)| *col)
        else {
            log.warning(format!("{}: no 'code' column, table skipped", table));
            break;
        };

        let code = texts::normalize_code(row.text(code_col));
        if code.is_empty() {
            continue;
        }

        let existing = texts::load_text_by_code(conn, &code).await?;
        let mut text = existing.clone().unwrap_or_else(|| blank_text(&code));
        apply_row(&mut text, &row, columns, table, log);

        match existing {
            Some(existing) if existing == text => stats.texts.unchanged += 1,
            Some(_) => {
                texts::update_text(conn, &text).await?;
                stats.texts.updated += 1;
            }
            None => {
                texts::insert_text(conn, &text).await?;
                stats.texts.created += 1;
            }
        }
    }

    stats.tables_imported += 1;
    Ok(stats)
}

fn header_columns(row: &SheetRow, table: &str, log: &mut ImportLog) -> Vec<(usize, TextField)> {
    let mut columns = Vec::new();
    for (col, cell) in row.cells.iter().enumerate() {
        if cell.text.is_empty() {
            continue;
        }
        match TextField::from_header(&cell.text) {
            Some(field) => columns.push((col, field)),
            None => log.warning(format!(
                "{}, line {}: unknown column '{}' ignored",
                table, row.line, cell.text
            )),
        }
    }
    columns
}

fn blank_text(code: &str) -> Text {
    Text {
        id: 0,
        code: code.to_string(),
        pointer: None,
        reference: None,
        original_publication_year: None,
        production_year: None,
        authors: None,
        language: None,
        public_note: None,
        internal_note: None,
        is_public: false,
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn apply_row(
    text: &mut Text,
    row: &SheetRow,
    columns: &[(usize, TextField)],
    table: &str,
    log: &mut ImportLog,
) {
    for (col, field) in columns {
        let value = row.text(*col);
        match field {
            TextField::Code => {}
            TextField::Pointer => text.pointer = optional(value),
            TextField::Reference => text.reference = optional(value),
            TextField::Authors => text.authors = optional(value),
            TextField::Language => text.language = optional(value),
            TextField::PublicNote => text.public_note = optional(value),
            TextField::InternalNote => text.internal_note = optional(value),
            TextField::IsPublic => text.is_public = parse_bool(value),
            TextField::OriginalPublicationYear => {
                text.original_publication_year = parse_year(value, row.line, table, log)
            }
            TextField::ProductionYear => {
                text.production_year = parse_year(value, row.line, table, log)
            }
        }
    }
}

fn parse_year(value: &str, line: usize, table: &str, log: &mut ImportLog) -> Option<i64> {
    if value.is_empty() {
        return None;
    }
    let year = leading_int(value);
    if year.is_none() {
        log.warning(format!(
            "{}, line {}: '{}' is not a year",
            table, line, value
        ));
    }
    year
}
