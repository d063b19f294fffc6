//! Spreadsheet fixtures
//!
//! Builds `content.xml` documents inline. A cell written `"text@style"`
//! gets `table:style-name="style"`.

use std::path::{Path, PathBuf};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn cell_xml(value: &str) -> String {
    let (text, style) = match value.rsplit_once('@') {
        Some((text, style)) => (text, Some(style)),
        None => (value, None),
    };
    let style_attr = style
        .map(|s| format!(r#" table:style-name="{}""#, s))
        .unwrap_or_default();

    if text.is_empty() {
        format!("<table:table-cell{}/>", style_attr)
    } else {
        format!(
            r#"<table:table-cell{} office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
            style_attr,
            escape(text)
        )
    }
}

/// A `table:table` element with one `table:table-row` per entry of `rows`
pub fn table(name: &str, rows: &[Vec<&str>]) -> String {
    let mut xml = format!(r#"<table:table table:name="{}">"#, escape(name));
    xml.push_str(r#"<table:table-column table:number-columns-repeated="64"/>"#);
    for row in rows {
        xml.push_str("<table:table-row>");
        for value in row {
            xml.push_str(&cell_xml(value));
        }
        // Trailing blank region the way office suites write it
        xml.push_str(r#"<table:table-cell table:number-columns-repeated="1000"/>"#);
        xml.push_str("</table:table-row>");
    }
    xml.push_str(
        r#"<table:table-row table:number-rows-repeated="1048000"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>"#,
    );
    xml.push_str("</table:table>");
    xml
}

/// A complete `content.xml` around `tables`
pub fn document(tables: &[String]) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.2">
<office:automatic-styles>
<style:style style:name="ce1" style:family="table-cell" style:parent-style-name="Default"><style:table-cell-properties fo:background-color="#ffff00"/></style:style>
<style:style style:name="ce2" style:family="table-cell" style:parent-style-name="Default"><style:table-cell-properties fo:background-color="#00ff00"/></style:style>
</office:automatic-styles>
<office:body><office:spreadsheet>{}</office:spreadsheet></office:body>
</office:document-content>"##,
        tables.concat()
    )
}

/// Write `xml` to `dir/name` and return the path
pub fn write_sheet(dir: &Path, name: &str, xml: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, xml).expect("write fixture");
    path
}

/// Occurrence rows of the two-lemma chapter used across tests
///
/// 2 lemmas x 3 texts x 2 columns = 12 occurrences.
pub fn two_lemma_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["", "", "", "", "1", "2"],
        vec!["", "say", "2", "", "she said so@ce1", "ZERO@ce2"],
        vec!["", "(say, said)", "", "LT", "sakė@ce1", "zero@ce1"],
        vec!["", "", "", "RU", "сказала", "replacement (x)"],
        vec![],
        vec!["", "", "", "", "3", "4"],
        vec!["", "go", "1", "", "she went", "go away"],
        vec!["", "(go, went)", "", "LT", "nuėjo", "eik"],
        vec!["", "", "", "RU", "ушла", "иди"],
    ]
}
