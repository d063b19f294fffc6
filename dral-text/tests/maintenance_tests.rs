//! Integration tests for clean and clear

mod helpers;

use helpers::sheets::two_lemma_rows;
use helpers::{count_rows, create_test_importer, document, table, write_sheet};
use dral_text::{Action, Importer};
use std::path::Path;

async fn import_chapter(importer: &Importer, dir: &Path) {
    let path = write_sheet(
        dir,
        "content.xml",
        &document(&[table("BENJY #1", &two_lemma_rows())]),
    );
    let outcome = importer.run(Action::Import, Some(&path)).await;
    assert!(outcome.is_success(), "{:?}", outcome.error);
}

#[tokio::test]
async fn test_clean_after_import_changes_nothing() {
    let (dir, importer) = create_test_importer().await;
    import_chapter(&importer, dir.path()).await;

    let outcome = importer.run(Action::Clean, None).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.cells.unchanged, 12);
    assert_eq!(outcome.stats.cells.updated, 0);
}

#[tokio::test]
async fn test_clean_agrees_with_import_on_truncated_cells() {
    let (dir, importer) = create_test_importer().await;
    let long_cell = format!("{} she said so", "x".repeat(80));
    let rows = vec![
        vec!["", "", "", "", "1"],
        vec!["", "say", "1", "", long_cell.as_str()],
        vec!["", "(say, said)", "", "LT", "sakė"],
    ];
    let path = write_sheet(dir.path(), "content.xml", &document(&[table("BENJY #1", &rows)]));

    let first = importer.run(Action::Import, Some(&path)).await;
    assert!(first.is_success(), "{:?}", first.error);

    let stored: (String, Option<String>) = sqlx::query_as(
        "SELECT o.cell, o.string FROM occurrences o JOIN texts t ON t.id = o.text_id \
         WHERE t.code = 'EN'",
    )
    .fetch_one(importer.pool())
    .await
    .unwrap();
    assert_eq!(stored.0.chars().count(), 80);
    assert_ne!(stored.1.as_deref(), Some("said"));

    let cleaned = importer.run(Action::Clean, None).await;
    assert_eq!(cleaned.stats.cells.updated, 0);
    assert_eq!(cleaned.stats.cells.unchanged, 2);

    let again = importer.run(Action::Import, Some(&path)).await;
    assert_eq!(again.stats.cells.updated, 0);
    assert_eq!(again.stats.cells.unchanged, 2);
}

#[tokio::test]
async fn test_clean_restores_derived_fields() {
    let (dir, importer) = create_test_importer().await;
    import_chapter(&importer, dir.path()).await;

    let damaged = sqlx::query(
        "UPDATE occurrences SET string = 'stale', context = '', is_zero = 0 \
         WHERE cell IN ('ZERO', 'she said so')",
    )
    .execute(importer.pool())
    .await
    .unwrap()
    .rows_affected();
    assert_eq!(damaged, 2);

    let outcome = importer.run(Action::Clean, None).await;
    assert_eq!(outcome.stats.cells.updated, 2);
    assert_eq!(outcome.stats.cells.unchanged, 10);

    let (string, zero): (Option<String>, bool) =
        sqlx::query_as("SELECT string, is_zero FROM occurrences WHERE cell = 'ZERO'")
            .fetch_one(importer.pool())
            .await
            .unwrap();
    assert_eq!(string, None);
    assert!(zero);

    let string: Option<String> =
        sqlx::query_scalar("SELECT string FROM occurrences WHERE cell = 'she said so'")
            .fetch_one(importer.pool())
            .await
            .unwrap();
    assert_eq!(string.as_deref(), Some("said"));

    let again = importer.run(Action::Clean, None).await;
    assert_eq!(again.stats.cells.updated, 0);
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let (dir, importer) = create_test_importer().await;
    import_chapter(&importer, dir.path()).await;
    let sentences = write_sheet(
        dir.path(),
        "sentences.xml",
        &document(&[table("BENJY_EN", &[vec!["1", "one"], vec!["2", "two"]])]),
    );
    importer.run(Action::ImportSentences, Some(&sentences)).await;

    let outcome = importer.run(Action::Clear, None).await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.stats.cells.deleted, 12);
    assert_eq!(outcome.stats.sentences.deleted, 2);
    assert_eq!(outcome.stats.styles.deleted, 2);
    assert_eq!(outcome.stats.lemmas.deleted, 2);
    assert_eq!(outcome.stats.chapters.deleted, 1);
    assert_eq!(outcome.stats.texts.deleted, 3);

    let pool = importer.pool();
    for table in ["occurrences", "sentences", "sheet_styles", "lemmas", "chapters", "texts"] {
        assert_eq!(count_rows(pool, table).await, 0, "{} not empty", table);
    }
}

#[tokio::test]
async fn test_clear_empty_database() {
    let (_dir, importer) = create_test_importer().await;

    let outcome = importer.run(Action::Clear, None).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.cells.deleted, 0);
    assert_eq!(outcome.stats.texts.deleted, 0);
}
