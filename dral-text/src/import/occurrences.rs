//! Occurrence import
//!
//! Each table of the spreadsheet is one chapter. A table is imported inside
//! a single transaction: it either lands completely or not at all.
//!
//! Per table:
//! 1. INIT: upsert the chapter, load its occurrences and all lemmas
//! 2. STYLES: reconcile the document's cell styles for the chapter
//! 3. ROWS: segment rows into blocks, build and reconcile occurrences
//! 4. POST: insert new rows, delete unseen rows, purge orphan lemmas/chapters

use crate::db::{chapters, lemmas, occurrences, styles, texts};
use crate::error::ImportResult;
use crate::import::block::{BlockParser, ParsedBlock};
use crate::import::log::ImportLog;
use crate::import::names::{is_skipped_table, truncate_chars, ChapterName};
use crate::import::occurrence::build_occurrences;
use crate::import::reconcile::{OccurrenceKey, OccurrenceSnapshot, Reconciled};
use crate::import::segmenter::{Block, BlockSegmenter};
use crate::import::session::{TableSession, TableState};
use crate::import::stats::ImportStats;
use crate::import::{next_table_row, skip_table};
use crate::ods::{read_content_xml, SheetItem, SheetReader};
use dral_common::db::{lemma_key, Chapter, Text};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

pub const STYLE_NAME_MAX_CHARS: usize = 10;
pub const STYLE_COLOR_MAX_CHARS: usize = 15;

/// Import every occurrence table of the spreadsheet at `path`
pub async fn import_occurrences(
    pool: &SqlitePool,
    path: &Path,
    reference_code: &str,
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

        let table_stats = import_table(pool, &mut reader, &name, reference_code, log).await?;
        stats.absorb(&table_stats);
    }

    Ok(())
}

async fn import_table(
    pool: &SqlitePool,
    reader: &mut SheetReader<'_>,
    name: &str,
    reference_code: &str,
    log: &mut ImportLog,
) -> ImportResult<ImportStats> {
    let mut session = TableSession::new(name);
    let mut tx = pool.begin().await?;

    let stats = match run_table(&mut tx, reader, &mut session, reference_code, log).await {
        Ok(stats) => stats,
        Err(e) => {
            // Dropping the transaction rolls the table back
            session.transition_to(TableState::Failed);
            return Err(e);
        }
    };

    if let Err(e) = tx.commit().await {
        session.transition_to(TableState::Failed);
        return Err(e.into());
    }
    session.transition_to(TableState::Done);

    info!(
        "Table '{}' imported in {} ms ({} blocks)",
        name,
        session.elapsed_ms(),
        stats.blocks_imported
    );
    log.info(format!(
        "{}: {}; {}",
        name,
        stats.cells.display_string("cells"),
        stats.lemmas.display_string("lemmas")
    ));

    Ok(stats)
}

async fn run_table(
    conn: &mut SqliteConnection,
    reader: &mut SheetReader<'_>,
    session: &mut TableSession,
    reference_code: &str,
    log: &mut ImportLog,
) -> ImportResult<ImportStats> {
    let (chapter, chapter_change) =
        chapters::upsert_chapter(conn, &ChapterName::parse(&session.table)).await?;
    let reference = texts::get_or_create_text(conn, reference_code).await?;
    let snapshot = OccurrenceSnapshot::new(
        occurrences::load_chapter_snapshot(conn, chapter.id, &chapter.slug).await?,
    );
    let lemmas = lemmas::load_lemma_index(conn).await?;
    debug!(
        "Table '{}': {} existing occurrences, {} lemmas",
        session.table,
        snapshot.len(),
        lemmas.len()
    );

    let mut table = TableImport::new(&session.table, chapter, reference, lemmas, snapshot);
    table.stats.chapters.record(chapter_change);

    session.transition_to(TableState::Styles);
    table.reconcile_styles(conn, reader.styles()).await?;

    session.transition_to(TableState::Rows);
    let mut segmenter = BlockSegmenter::new();
    while let Some(row) = next_table_row(reader)? {
        if let Some(block) = segmenter.push(row) {
            table.import_block(conn, &block, log).await?;
        }
    }
    if let Some(block) = segmenter.finish() {
        table.import_block(conn, &block, log).await?;
    }

    session.transition_to(TableState::Post);
    table.finish(conn).await
}

/// Working state of one table import
struct TableImport {
    table: String,
    chapter: Chapter,
    reference: Text,
    lemmas: HashMap<String, i64>,
    snapshot: OccurrenceSnapshot,
    text_ids: HashMap<String, i64>,
    pending: Vec<occurrences::NewOccurrence>,
    parser: BlockParser,
    stats: ImportStats,
}

impl TableImport {
    fn new(
        table: &str,
        chapter: Chapter,
        reference: Text,
        lemmas: HashMap<String, i64>,
        snapshot: OccurrenceSnapshot,
    ) -> Self {
        let mut text_ids = HashMap::new();
        text_ids.insert(reference.code.clone(), reference.id);

        Self {
            table: table.to_string(),
            parser: BlockParser::new(table, reference.code.clone()),
            chapter,
            reference,
            lemmas,
            snapshot,
            text_ids,
            pending: Vec::new(),
            stats: ImportStats::default(),
        }
    }

    async fn reconcile_styles(
        &mut self,
        conn: &mut SqliteConnection,
        document_styles: &BTreeMap<String, String>,
    ) -> ImportResult<()> {
        let mut existing = styles::load_styles(conn, self.chapter.id).await?;

        for (name, color) in document_styles {
            let name = truncate_chars(name, STYLE_NAME_MAX_CHARS);
            let color = truncate_chars(color, STYLE_COLOR_MAX_CHARS);

            match existing.get_mut(&name) {
                Some(style) if style.color == color => self.stats.styles.unchanged += 1,
                Some(style) => {
                    styles::update_style_color(conn, style.id, &color).await?;
                    style.color = color;
                    self.stats.styles.updated += 1;
                }
                None => {
                    let id = styles::insert_style(conn, self.chapter.id, &name, &color).await?;
                    existing.insert(
                        name.clone(),
                        dral_common::db::SheetStyle {
                            id,
                            chapter_id: self.chapter.id,
                            name,
                            color,
                        },
                    );
                    self.stats.styles.created += 1;
                }
            }
        }

        Ok(())
    }

    async fn import_block(
        &mut self,
        conn: &mut SqliteConnection,
        block: &Block,
        log: &mut ImportLog,
    ) -> ImportResult<()> {
        let Some(parsed) = self.parser.parse(block, log) else {
            self.stats.blocks_skipped += 1;
            return Ok(());
        };

        let lemma_id = self.lemma_id(conn, &parsed).await?;
        let lemma_key = lemma_key(&parsed.lemma, &parsed.forms);

        for built in build_occurrences(&parsed, &self.reference.code, &self.table, log) {
            let text_id = self.text_id(conn, &built.code).await?;
            let key = OccurrenceKey {
                chapter_slug: self.chapter.slug.clone(),
                lemma_key: lemma_key.clone(),
                text_id,
                cell_col: built.fields.cell_col,
            };

            match self.snapshot.reconcile(&key, &built.fields) {
                Reconciled::Create => {
                    self.pending.push(occurrences::NewOccurrence {
                        fields: built.fields,
                        lemma_id,
                        chapter_id: self.chapter.id,
                        text_id,
                    });
                }
                Reconciled::Update { id, changed } => {
                    debug!("Occurrence {} changed: {}", id, changed.join(", "));
                    occurrences::update_occurrence(conn, id, &built.fields).await?;
                    self.stats.cells.updated += 1;
                }
                Reconciled::Unchanged => self.stats.cells.unchanged += 1,
                Reconciled::Duplicate => log.warning(format!(
                    "{}, line {}: duplicate cell for '{}', text '{}', column {} dropped",
                    self.table, built.fields.cell_line, lemma_key, built.code, built.fields.cell_col
                )),
            }
        }

        self.stats.blocks_imported += 1;
        Ok(())
    }

    async fn lemma_id(
        &mut self,
        conn: &mut SqliteConnection,
        parsed: &ParsedBlock,
    ) -> ImportResult<i64> {
        let key = lemma_key(&parsed.lemma, &parsed.forms);
        if let Some(id) = self.lemmas.get(&key) {
            return Ok(*id);
        }

        let id = lemmas::insert_lemma(conn, &parsed.lemma, &parsed.forms, self.reference.id).await?;
        self.lemmas.insert(key, id);
        self.stats.lemmas.created += 1;
        Ok(id)
    }

    async fn text_id(&mut self, conn: &mut SqliteConnection, code: &str) -> ImportResult<i64> {
        let code = texts::normalize_code(code);
        if let Some(id) = self.text_ids.get(&code) {
            return Ok(*id);
        }

        let text = texts::get_or_create_text(conn, &code).await?;
        self.text_ids.insert(code, text.id);
        Ok(text.id)
    }

    async fn finish(mut self, conn: &mut SqliteConnection) -> ImportResult<ImportStats> {
        let inserted = occurrences::bulk_insert_occurrences(conn, &self.pending).await?;
        self.stats.cells.created += inserted as usize;

        let unkept = self.snapshot.unkept_ids();
        let deleted = occurrences::delete_occurrences(conn, &unkept).await?;
        self.stats.cells.deleted += deleted as usize;

        self.stats.lemmas.deleted += lemmas::delete_orphan_lemmas(conn).await? as usize;
        self.stats.chapters.deleted += chapters::delete_orphan_chapters(conn).await? as usize;
        self.stats.tables_imported += 1;

        debug!(
            "Table '{}': {} inserted, {} deleted",
            self.table, inserted, deleted
        );

        Ok(self.stats)
    }
}
