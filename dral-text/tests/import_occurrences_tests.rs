//! Integration tests for the occurrence import

mod helpers;

use helpers::sheets::two_lemma_rows;
use helpers::{count_rows, create_test_importer, document, table, write_sheet};
use dral_text::import::Severity;
use dral_text::{Action, ImportOutcome, Importer};
use sqlx::Row;
use std::io::Write;
use std::path::Path;

async fn import(importer: &Importer, dir: &Path, tables: &[String]) -> ImportOutcome {
    let path = write_sheet(dir, "content.xml", &document(tables));
    importer.run(Action::Import, Some(&path)).await
}

fn warnings(outcome: &ImportOutcome) -> Vec<&str> {
    outcome
        .messages
        .iter()
        .filter(|m| m.severity == Severity::Warning)
        .map(|m| m.message.as_str())
        .collect()
}

async fn occurrence_ids(importer: &Importer) -> Vec<i64> {
    sqlx::query_scalar("SELECT id FROM occurrences ORDER BY id")
        .fetch_all(importer.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_import_creates_records() {
    let (dir, importer) = create_test_importer().await;

    let outcome = import(&importer, dir.path(), &[table("BENJY #1", &two_lemma_rows())]).await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert!(warnings(&outcome).is_empty(), "{:?}", warnings(&outcome));
    assert_eq!(outcome.stats.tables_imported, 1);
    assert_eq!(outcome.stats.blocks_imported, 2);
    assert_eq!(outcome.stats.cells.created, 12);
    assert_eq!(outcome.stats.lemmas.created, 2);
    assert_eq!(outcome.stats.styles.created, 2);
    assert_eq!(outcome.stats.chapters.created, 1);

    let pool = importer.pool();
    assert_eq!(count_rows(pool, "occurrences").await, 12);
    assert_eq!(count_rows(pool, "lemmas").await, 2);
    assert_eq!(count_rows(pool, "chapters").await, 1);
    assert_eq!(count_rows(pool, "texts").await, 3);
    assert_eq!(count_rows(pool, "sheet_styles").await, 2);

    let chapter = sqlx::query("SELECT slug, name, display_order FROM chapters")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(chapter.get::<String, _>("slug"), "benjy");
    assert_eq!(chapter.get::<String, _>("name"), "BENJY");
    assert_eq!(chapter.get::<i64, _>("display_order"), 1);

    let forms: Vec<String> = sqlx::query_scalar("SELECT forms FROM lemmas ORDER BY string")
        .fetch_all(pool)
        .await
        .unwrap();
    assert_eq!(forms, vec!["go, went", "say, said"]);
}

#[tokio::test]
async fn test_derived_fields() {
    let (dir, importer) = create_test_importer().await;
    import(&importer, dir.path(), &[table("BENJY #1", &two_lemma_rows())]).await;

    let rows = sqlx::query(
        r#"
        SELECT t.code, o.cell_col, o.cell_line, o.cell_style, o.freq, o.string, o.context,
               o.is_zero, o.is_replace, o.is_paraphrase, o.lemma_group, o.sentence_index
        FROM occurrences o
        JOIN lemmas l ON l.id = o.lemma_id
        JOIN texts t ON t.id = o.text_id
        WHERE l.string = 'say'
        ORDER BY t.code, o.cell_col
        "#,
    )
    .fetch_all(importer.pool())
    .await
    .unwrap();
    assert_eq!(rows.len(), 6);

    // EN, column 4: the longest matching form
    let en_said = &rows[0];
    assert_eq!(en_said.get::<String, _>("code"), "EN");
    assert_eq!(en_said.get::<i64, _>("cell_col"), 4);
    assert_eq!(en_said.get::<i64, _>("cell_line"), 2);
    assert_eq!(en_said.get::<String, _>("cell_style"), "ce1");
    assert_eq!(en_said.get::<i64, _>("freq"), 2);
    assert_eq!(en_said.get::<Option<String>, _>("string").as_deref(), Some("said"));
    assert_eq!(en_said.get::<String, _>("context"), "she said so");
    assert_eq!(en_said.get::<i64, _>("lemma_group"), 0);
    assert_eq!(en_said.get::<i64, _>("sentence_index"), 1);

    // EN, column 5: omission marker
    let en_zero = &rows[1];
    assert!(en_zero.get::<bool, _>("is_zero"));
    assert_eq!(en_zero.get::<Option<String>, _>("string"), None);
    assert_eq!(en_zero.get::<i64, _>("lemma_group"), 1);
    assert_eq!(en_zero.get::<i64, _>("sentence_index"), 2);

    // LT: same style in both columns, one group
    let lt_plain = &rows[2];
    let lt_zero = &rows[3];
    assert_eq!(lt_plain.get::<String, _>("code"), "LT");
    assert_eq!(lt_plain.get::<Option<String>, _>("string").as_deref(), Some("sakė"));
    assert_eq!(lt_plain.get::<i64, _>("lemma_group"), 0);
    assert!(lt_zero.get::<bool, _>("is_zero"));
    assert_eq!(lt_zero.get::<i64, _>("lemma_group"), 0);

    // RU, column 5: replacement keyword and aside removed
    let ru_replace = &rows[5];
    assert_eq!(ru_replace.get::<String, _>("code"), "RU");
    assert!(ru_replace.get::<bool, _>("is_replace"));
    assert!(!ru_replace.get::<bool, _>("is_zero"));
    assert_eq!(ru_replace.get::<Option<String>, _>("string"), None);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let (dir, importer) = create_test_importer().await;
    let tables = [table("BENJY #1", &two_lemma_rows())];

    import(&importer, dir.path(), &tables).await;
    let ids = occurrence_ids(&importer).await;

    let outcome = import(&importer, dir.path(), &tables).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.stats.cells.unchanged, 12);
    assert_eq!(outcome.stats.cells.created, 0);
    assert_eq!(outcome.stats.cells.updated, 0);
    assert_eq!(outcome.stats.cells.deleted, 0);
    assert_eq!(outcome.stats.lemmas.created, 0);
    assert_eq!(outcome.stats.styles.unchanged, 2);
    assert_eq!(outcome.stats.chapters.unchanged, 1);

    assert_eq!(occurrence_ids(&importer).await, ids);
}

#[tokio::test]
async fn test_changed_cell_updates_in_place() {
    let (dir, importer) = create_test_importer().await;
    import(&importer, dir.path(), &[table("BENJY #1", &two_lemma_rows())]).await;
    let ids = occurrence_ids(&importer).await;

    let mut rows = two_lemma_rows();
    rows[3][4] = "говорила";
    let outcome = import(&importer, dir.path(), &[table("BENJY #1", &rows)]).await;

    assert_eq!(outcome.stats.cells.updated, 1);
    assert_eq!(outcome.stats.cells.unchanged, 11);
    assert_eq!(occurrence_ids(&importer).await, ids);

    let string: Option<String> = sqlx::query_scalar(
        "SELECT o.string FROM occurrences o JOIN texts t ON t.id = o.text_id \
         WHERE t.code = 'RU' AND o.cell_col = 4 AND o.cell_line = 4",
    )
    .fetch_one(importer.pool())
    .await
    .unwrap();
    assert_eq!(string.as_deref(), Some("говорила"));
}

#[tokio::test]
async fn test_removed_block_deletes_occurrences_and_lemma() {
    let (dir, importer) = create_test_importer().await;
    import(&importer, dir.path(), &[table("BENJY #1", &two_lemma_rows())]).await;

    let first_block: Vec<Vec<&str>> = two_lemma_rows().into_iter().take(4).collect();
    let outcome = import(&importer, dir.path(), &[table("BENJY #1", &first_block)]).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.cells.deleted, 6);
    assert_eq!(outcome.stats.cells.unchanged, 6);
    assert_eq!(outcome.stats.lemmas.deleted, 1);
    assert_eq!(count_rows(importer.pool(), "occurrences").await, 6);
    assert_eq!(count_rows(importer.pool(), "lemmas").await, 1);
}

#[tokio::test]
async fn test_chapter_order_kept_without_suffix() {
    let (dir, importer) = create_test_importer().await;
    import(&importer, dir.path(), &[table("BENJY #3", &two_lemma_rows())]).await;
    let unsuffixed = import(&importer, dir.path(), &[table("BENJY", &two_lemma_rows())]).await;
    assert_eq!(unsuffixed.stats.chapters.unchanged, 1);

    let reordered = import(&importer, dir.path(), &[table("BENJY #2", &two_lemma_rows())]).await;
    assert_eq!(reordered.stats.chapters.updated, 1);
    assert_eq!(reordered.stats.chapters.created, 0);

    let order: i64 = sqlx::query_scalar("SELECT display_order FROM chapters WHERE slug = 'benjy'")
        .fetch_one(importer.pool())
        .await
        .unwrap();
    assert_eq!(order, 2);
    assert_eq!(count_rows(importer.pool(), "chapters").await, 1);
}

#[tokio::test]
async fn test_scratch_tables_skipped() {
    let (dir, importer) = create_test_importer().await;

    let outcome = import(
        &importer,
        dir.path(),
        &[
            table("_notes", &two_lemma_rows()),
            table("Sheet1", &two_lemma_rows()),
        ],
    )
    .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.tables_skipped, 2);
    assert_eq!(outcome.stats.tables_imported, 0);
    assert_eq!(count_rows(importer.pool(), "occurrences").await, 0);
    assert_eq!(count_rows(importer.pool(), "chapters").await, 0);
}

#[tokio::test]
async fn test_block_without_forms_is_skipped() {
    let (dir, importer) = create_test_importer().await;

    let mut rows = two_lemma_rows();
    rows[2][1] = "say, said";
    let outcome = import(&importer, dir.path(), &[table("BENJY #1", &rows)]).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.blocks_skipped, 1);
    assert_eq!(outcome.stats.blocks_imported, 1);
    assert_eq!(count_rows(importer.pool(), "occurrences").await, 6);
    assert!(warnings(&outcome)
        .iter()
        .any(|w| w.contains("no forms found for lemma 'say'")));
}

#[tokio::test]
async fn test_duplicate_block_is_dropped_with_warning() {
    let (dir, importer) = create_test_importer().await;

    let mut rows = two_lemma_rows();
    let first_block: Vec<Vec<&str>> = rows.iter().take(4).cloned().collect();
    rows.push(vec![]);
    rows.extend(first_block);
    let outcome = import(&importer, dir.path(), &[table("BENJY #1", &rows)]).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stats.cells.created, 12);
    assert_eq!(
        warnings(&outcome)
            .iter()
            .filter(|w| w.contains("duplicate cell"))
            .count(),
        6
    );
}

#[tokio::test]
async fn test_failed_table_rolls_back_alone() {
    let (dir, importer) = create_test_importer().await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_boom BEFORE INSERT ON occurrences
        WHEN NEW.cell = 'boom'
        BEGIN
            SELECT RAISE(ABORT, 'boom rejected');
        END
        "#,
    )
    .execute(importer.pool())
    .await
    .unwrap();

    let mut broken = two_lemma_rows();
    broken[8][5] = "boom";
    let outcome = import(
        &importer,
        dir.path(),
        &[
            table("BENJY #1", &two_lemma_rows()),
            table("QUENTIN #2", &broken),
        ],
    )
    .await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.stats.tables_imported, 1);

    let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM chapters")
        .fetch_all(importer.pool())
        .await
        .unwrap();
    assert_eq!(slugs, vec!["benjy"]);
    assert_eq!(count_rows(importer.pool(), "occurrences").await, 12);

    let last = outcome.messages.last().unwrap();
    assert_eq!(last.severity, Severity::Fatal);
}

#[tokio::test]
async fn test_missing_file_is_fatal() {
    let (dir, importer) = create_test_importer().await;

    let outcome = importer
        .run(Action::Import, Some(&dir.path().join("missing.ods")))
        .await;

    assert!(!outcome.is_success());
    assert!(outcome.error.unwrap().contains("File not found"));
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].severity, Severity::Fatal);
}

#[tokio::test]
async fn test_import_without_file_is_fatal() {
    let (_dir, importer) = create_test_importer().await;

    let outcome = importer.run(Action::Import, None).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.messages.len(), 1);
    assert_eq!(outcome.messages[0].severity, Severity::Fatal);
}

#[tokio::test]
async fn test_import_from_package() {
    let (dir, importer) = create_test_importer().await;
    let path = dir.path().join("chapters.ods");

    let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("mimetype", options).unwrap();
    writer
        .write_all(b"application/vnd.oasis.opendocument.spreadsheet")
        .unwrap();
    writer.start_file("content.xml", options).unwrap();
    writer
        .write_all(document(&[table("BENJY #1", &two_lemma_rows())]).as_bytes())
        .unwrap();
    writer.finish().unwrap();

    let outcome = importer.run(Action::Import, Some(&path)).await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(count_rows(importer.pool(), "occurrences").await, 12);
}
