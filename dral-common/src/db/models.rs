//! Database models

use serde::{Deserialize, Serialize};

/// A language variant of the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Text {
    pub id: i64,
    pub code: String,
    pub pointer: Option<String>,
    pub reference: Option<String>,
    pub original_publication_year: Option<i64>,
    pub production_year: Option<i64>,
    pub authors: Option<String>,
    pub language: Option<String>,
    pub public_note: Option<String>,
    pub internal_note: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chapter {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub display_order: i64,
}

/// A reference-language headword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lemma {
    pub id: i64,
    pub string: String,
    /// Comma separated inflected forms, e.g. `say, says, said`
    pub forms: String,
    pub text_id: i64,
}

impl Lemma {
    /// Natural key shared by the importer's lemma and occurrence indexes
    pub fn key(&self) -> String {
        lemma_key(&self.string, &self.forms)
    }
}

/// `"string (forms)"`
pub fn lemma_key(string: &str, forms: &str) -> String {
    format!("{} ({})", string, forms)
}

/// One spreadsheet cell for a (chapter, lemma, column, text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Occurrence {
    pub id: i64,
    pub cell: String,
    pub cell_style: String,
    pub cell_line: i64,
    pub cell_col: i64,
    pub freq: i64,
    pub string: Option<String>,
    pub context: String,
    #[sqlx(rename = "is_zero")]
    pub zero: bool,
    #[sqlx(rename = "is_replace")]
    pub replace: bool,
    #[sqlx(rename = "is_paraphrase")]
    pub paraphrase: bool,
    pub lemma_group: i64,
    pub sentence_index: i64,
    pub lemma_id: i64,
    pub chapter_id: i64,
    pub text_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sentence {
    pub id: i64,
    pub chapter_id: i64,
    pub text_id: i64,
    pub sentence_index: i64,
    pub string: String,
}

/// A cell style of a chapter's sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SheetStyle {
    pub id: i64,
    pub chapter_id: i64,
    pub name: String,
    /// e.g. `#ffff00`, `transparent`
    pub color: String,
}
