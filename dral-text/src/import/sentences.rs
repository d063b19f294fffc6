//! Sentence import
//!
//! Each table named `"<Chapter>[_ ]<TEXTCODE>"` holds the numbered sentences
//! of one chapter in one text: column 0 is the sentence number, column 1
//! the sentence.

use crate::db::{chapters, sentences, texts};
use crate::error::ImportResult;
use crate::import::log::ImportLog;
use crate::import::names::{is_skipped_table, parse_sentence_table, truncate_chars, ChapterName};
use crate::import::stats::ImportStats;
use crate::import::{next_table_row, skip_table};
use crate::ods::{read_content_xml, SheetItem, SheetReader};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::path::Path;

/// Maximum length of a stored sentence
pub const SENTENCE_MAX_CHARS: usize = 500;

pub async fn import_sentences(
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

        let Some((chapter_name, code)) = parse_sentence_table(&name) else {
            log.warning(format!(
                "Table '{}' skipped: name is not '<chapter> <text code>'",
                name
            ));
            skip_table(&mut reader)?;
            stats.tables_skipped += 1;
            continue;
        };

        let mut tx = pool.begin().await?;
        let table_stats =
            import_sentence_table(&mut tx, &mut reader, &name, &chapter_name, &code, log).await?;
        tx.commit().await?;

        log.info(format!(
            "{}: {}",
            name,
            table_stats.sentences.display_string("sentences")
        ));
        stats.absorb(&table_stats);
    }

    Ok(())
}

async fn import_sentence_table(
    conn: &mut SqliteConnection,
    reader: &mut SheetReader<'_>,
    table: &str,
    chapter_name: &str,
    code: &str,
    log: &mut ImportLog,
) -> ImportResult<ImportStats> {
    let mut stats = ImportStats::default();

    // Sentence sheets never carry the chapter order
    let parsed = ChapterName {
        display_order: None,
        ..ChapterName::parse(chapter_name)
    };
    let (chapter, change) = chapters::upsert_chapter(conn, &parsed).await?;
    stats.chapters.record(change);
    let text = texts::get_or_create_text(conn, code).await?;
    let existing = sentences::load_sentences(conn, chapter.id, text.id).await?;

    let mut seen = HashSet::new();
    let mut last_index = 0;

    while let Some(row) = next_table_row(reader)? {
        let number = row.text(0);
        if number.is_empty() {
            continue;
        }

        let Ok(index) = number.parse::<i64>() else {
            log.warning(format!(
                "{}, line {}: sentence number '{}' is not a number",
                table, row.line, number
            ));
            continue;
        };

        if !seen.insert(index) {
            log.warning(format!(
                "{}, line {}: sentence {} appears twice, keeping the first",
                table, row.line, index
            ));
            continue;
        }
        last_index = last_index.max(index);

        let string = truncate_chars(row.text(1), SENTENCE_MAX_CHARS);
        match existing.get(&index) {
            Some(sentence) if sentence.string == string => stats.sentences.unchanged += 1,
            Some(sentence) => {
                sentences::update_sentence_string(conn, sentence.id, &string).await?;
                stats.sentences.updated += 1;
            }
            None => {
                sentences::insert_sentence(conn, chapter.id, text.id, index, &string).await?;
                stats.sentences.created += 1;
            }
        }
    }

    stats.sentences.deleted +=
        sentences::delete_sentences_after(conn, chapter.id, text.id, last_index).await? as usize;
    stats.tables_imported += 1;

    Ok(stats)
}
