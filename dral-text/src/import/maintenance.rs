//! Whole-database maintenance
//!
//! - `clean`: recompute derived occurrence fields from the stored cells
//! - `clear`: delete every imported record

use crate::db::{chapters, lemmas, occurrences, sentences, styles, texts};
use crate::error::ImportResult;
use crate::import::cleaner::derive_cell;
use crate::import::log::ImportLog;
use crate::import::stats::ImportStats;
use sqlx::SqlitePool;
use tracing::debug;

/// Recompute `string`, `context` and the flags of every occurrence
///
/// Runs in one transaction. Only rows whose derived values change are
/// written.
pub async fn clean(
    pool: &SqlitePool,
    reference_code: &str,
    log: &mut ImportLog,
    stats: &mut ImportStats,
) -> ImportResult<()> {
    let mut tx = pool.begin().await?;

    let reference_id = texts::load_text_by_code(&mut tx, reference_code)
        .await?
        .map(|t| t.id);
    if reference_id.is_none() {
        log.warning(format!(
            "Reference text '{}' not found, every cell is read as a translation",
            reference_code
        ));
    }

    let cells = occurrences::load_stored_cells(&mut tx).await?;
    let mut run = ImportStats::default();

    for stored in cells {
        let is_reference = Some(stored.text_id) == reference_id;
        let mut fields = stored.fields.clone();
        fields.apply_derived(derive_cell(&stored.fields.cell, &stored.forms, is_reference));

        let changed = stored.fields.diff(&fields);
        if changed.is_empty() {
            run.cells.unchanged += 1;
            continue;
        }

        debug!("Occurrence {} cleaned: {}", stored.id, changed.join(", "));
        occurrences::update_occurrence(&mut tx, stored.id, &fields).await?;
        run.cells.updated += 1;
    }

    tx.commit().await?;

    log.info(run.cells.display_string("Cells"));
    stats.absorb(&run);
    Ok(())
}

/// Delete all occurrences, sentences, styles, lemmas, chapters and texts
pub async fn clear(
    pool: &SqlitePool,
    log: &mut ImportLog,
    stats: &mut ImportStats,
) -> ImportResult<()> {
    let mut tx = pool.begin().await?;
    let mut run = ImportStats::default();

    run.cells.deleted = occurrences::delete_all_occurrences(&mut tx).await? as usize;
    run.sentences.deleted = sentences::delete_all_sentences(&mut tx).await? as usize;
    run.styles.deleted = styles::delete_all_styles(&mut tx).await? as usize;
    run.lemmas.deleted = lemmas::delete_all_lemmas(&mut tx).await? as usize;
    run.chapters.deleted = chapters::delete_all_chapters(&mut tx).await? as usize;
    run.texts.deleted = texts::delete_unreferenced_texts(&mut tx).await? as usize;

    tx.commit().await?;

    for line in run.display_lines().into_iter().skip(1) {
        log.info(line);
    }
    stats.absorb(&run);
    Ok(())
}
