//! Streaming reader for OpenDocument spreadsheet XML
//!
//! Turns `content.xml` into a flat stream of [`SheetItem`]s:
//! `TableStart`, one `Row` per logical row, `TableEnd`.
//!
//! Elements and attributes are matched by local name, so documents are read
//! the same way whatever namespace prefixes they use.
//!
//! The compact repeat encoding is expanded here:
//! - `number-columns-repeated` copies the cell into every repeated column
//!   (up to [`MAX_COLUMNS`])
//! - `number-rows-repeated` emits the row at most [`MAX_ROW_REPEAT`] times,
//!   so a blank trailing region of a million rows costs two rows

use crate::error::ImportResult;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, VecDeque};

/// Width of the per-row working array
pub const MAX_COLUMNS: usize = 256;

/// Number of copies emitted for a row flagged as repeated
pub const MAX_ROW_REPEAT: usize = 2;

/// Text and style of one logical cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetCell {
    pub text: String,
    pub style: String,
}

impl SheetCell {
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
        }
    }
}

/// One logical row, cut to its visible width
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based line number in the sheet
    pub line: usize,
    /// Cells up to and including the last one with text
    pub cells: Vec<SheetCell>,
}

impl SheetRow {
    pub fn new(line: usize, cells: Vec<SheetCell>) -> Self {
        Self { line, cells }
    }

    /// Visible width of the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Text of column `col`, empty past the visible width
    pub fn text(&self, col: usize) -> &str {
        self.cells.get(col).map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Style of column `col`, empty past the visible width
    pub fn style(&self, col: usize) -> &str {
        self.cells.get(col).map(|c| c.style.as_str()).unwrap_or("")
    }
}

/// Item produced by [`SheetReader::next_item`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetItem {
    TableStart { name: String },
    Row(SheetRow),
    TableEnd { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Paragraph,
    Span,
    Ignored,
}

/// Text accumulated for the cell being read
#[derive(Debug, Default)]
struct CellState {
    repeat: usize,
    style: String,
    paragraphs: Vec<String>,
    current: String,
    stack: Vec<Node>,
    ignored: usize,
}

impl CellState {
    fn open(&mut self, name: &[u8], empty: bool) {
        let in_paragraph = !self.stack.is_empty();

        let node = if self.ignored > 0 {
            Node::Ignored
        } else if !in_paragraph {
            match name {
                b"p" | b"h" => Node::Paragraph,
                // annotations and other cell children carry no cell text
                _ => Node::Ignored,
            }
        } else {
            match name {
                b"span" | b"a" => Node::Span,
                b"s" => {
                    self.current.push(' ');
                    Node::Ignored
                }
                _ => Node::Ignored,
            }
        };

        if empty {
            if node == Node::Paragraph {
                self.paragraphs.push(String::new());
            }
            return;
        }

        match node {
            Node::Paragraph => self.current.clear(),
            Node::Ignored => self.ignored += 1,
            Node::Span => {}
        }
        self.stack.push(node);
    }

    fn close(&mut self) {
        match self.stack.pop() {
            Some(Node::Paragraph) => self.paragraphs.push(std::mem::take(&mut self.current)),
            Some(Node::Ignored) => self.ignored = self.ignored.saturating_sub(1),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.ignored == 0 && !self.stack.is_empty() {
            self.current.push_str(text);
        }
    }

    fn into_cell(self) -> (SheetCell, usize) {
        let text = self.paragraphs.join(" ").trim().to_string();
        (
            SheetCell {
                text,
                style: self.style,
            },
            self.repeat,
        )
    }
}

#[derive(Debug)]
struct RowState {
    repeat: usize,
    cells: Vec<SheetCell>,
    cell: Option<CellState>,
}

impl RowState {
    fn place(&mut self, cell: SheetCell, repeat: usize) {
        let room = MAX_COLUMNS.saturating_sub(self.cells.len());
        for _ in 0..repeat.min(room) {
            self.cells.push(cell.clone());
        }
    }

    fn visible_cells(mut self) -> Vec<SheetCell> {
        let width = self
            .cells
            .iter()
            .rposition(|c| !c.text.is_empty())
            .map(|i| i + 1)
            .unwrap_or(0);
        self.cells.truncate(width);
        self.cells
    }
}

#[derive(Debug)]
struct TableState {
    name: String,
    next_line: usize,
    row: Option<RowState>,
}

/// Pull reader over a spreadsheet's `content.xml`
pub struct SheetReader<'a> {
    reader: Reader<&'a [u8]>,
    pending: VecDeque<SheetItem>,
    styles: BTreeMap<String, String>,
    current_style: Option<String>,
    table: Option<TableState>,
    finished: bool,
}

impl<'a> SheetReader<'a> {
    pub fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
            pending: VecDeque::new(),
            styles: BTreeMap::new(),
            current_style: None,
            table: None,
            finished: false,
        }
    }

    /// Background colour of every `table-cell` style read so far
    ///
    /// Automatic styles precede the body, so the map is complete once the
    /// first `TableStart` has been returned.
    pub fn styles(&self) -> &BTreeMap<String, String> {
        &self.styles
    }

    /// Next item of the stream, `None` at the end of the document
    pub fn next_item(&mut self) -> ImportResult<Option<SheetItem>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(Some(item));
            }
            if self.finished {
                return Ok(None);
            }

            match self.reader.read_event()? {
                Event::Start(e) => self.on_open(&e, false)?,
                Event::Empty(e) => self.on_open(&e, true)?,
                Event::End(e) => self.on_close(e.local_name().as_ref()),
                Event::Text(t) => {
                    if let Some(cell) = self.open_cell() {
                        let text = t.unescape()?;
                        cell.push_text(&text);
                    }
                }
                Event::CData(t) => {
                    if let Some(cell) = self.open_cell() {
                        let text = String::from_utf8_lossy(&t);
                        cell.push_text(&text);
                    }
                }
                Event::Eof => self.finished = true,
                _ => {}
            }
        }
    }

    /// Drain the stream into rows grouped by table name
    pub fn read_all(mut self) -> ImportResult<Vec<(String, Vec<SheetRow>)>> {
        let mut tables = Vec::new();
        while let Some(item) = self.next_item()? {
            match item {
                SheetItem::TableStart { name } => tables.push((name, Vec::new())),
                SheetItem::Row(row) => {
                    if let Some((_, rows)) = tables.last_mut() {
                        rows.push(row);
                    }
                }
                SheetItem::TableEnd { .. } => {}
            }
        }
        Ok(tables)
    }

    fn open_cell(&mut self) -> Option<&mut CellState> {
        self.table
            .as_mut()
            .and_then(|t| t.row.as_mut())
            .and_then(|r| r.cell.as_mut())
    }

    fn on_open(&mut self, e: &BytesStart<'_>, empty: bool) -> ImportResult<()> {
        let local = e.local_name();
        let name = local.as_ref();

        if let Some(cell) = self.open_cell() {
            cell.open(name, empty);
            return Ok(());
        }

        match name {
            b"style" => {
                let family = attr_value(e, b"family")?;
                self.current_style = match family.as_deref() {
                    Some("table-cell") => attr_value(e, b"name")?,
                    _ => None,
                };
                if empty {
                    self.current_style = None;
                }
            }
            b"table-cell-properties" => {
                if let Some(style) = self.current_style.clone() {
                    let color = attr_value(e, b"background-color")?.unwrap_or_default();
                    self.styles.insert(style, color);
                }
            }
            b"table" => {
                let name = attr_value(e, b"name")?.unwrap_or_default();
                self.pending.push_back(SheetItem::TableStart { name: name.clone() });
                self.table = Some(TableState {
                    name,
                    next_line: 1,
                    row: None,
                });
                if empty {
                    self.finish_table();
                }
            }
            b"table-row" => {
                if let Some(table) = self.table.as_mut() {
                    table.row = Some(RowState {
                        repeat: repeat_count(e, b"number-rows-repeated")?,
                        cells: Vec::new(),
                        cell: None,
                    });
                    if empty {
                        self.finish_row();
                    }
                }
            }
            b"table-cell" | b"covered-table-cell" => {
                let repeat = repeat_count(e, b"number-columns-repeated")?;
                let style = attr_value(e, b"style-name")?.unwrap_or_default();
                if let Some(row) = self.table.as_mut().and_then(|t| t.row.as_mut()) {
                    row.cell = Some(CellState {
                        repeat,
                        style,
                        ..CellState::default()
                    });
                    if empty {
                        self.finish_cell();
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn on_close(&mut self, name: &[u8]) {
        if let Some(cell) = self.open_cell() {
            if !cell.stack.is_empty() {
                cell.close();
                return;
            }
        }

        match name {
            b"style" => self.current_style = None,
            b"table-cell" | b"covered-table-cell" => self.finish_cell(),
            b"table-row" => self.finish_row(),
            b"table" => self.finish_table(),
            _ => {}
        }
    }

    fn finish_cell(&mut self) {
        if let Some(row) = self.table.as_mut().and_then(|t| t.row.as_mut()) {
            if let Some(cell) = row.cell.take() {
                let (cell, repeat) = cell.into_cell();
                row.place(cell, repeat);
            }
        }
    }

    fn finish_row(&mut self) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let Some(row) = table.row.take() else {
            return;
        };

        let repeat = row.repeat;
        let cells = row.visible_cells();
        for copy in 0..repeat.min(MAX_ROW_REPEAT) {
            self.pending.push_back(SheetItem::Row(SheetRow {
                line: table.next_line + copy,
                cells: cells.clone(),
            }));
        }
        table.next_line += repeat;
    }

    fn finish_table(&mut self) {
        if let Some(table) = self.table.take() {
            self.pending.push_back(SheetItem::TableEnd { name: table.name });
        }
    }
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> ImportResult<Option<String>> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn repeat_count(e: &BytesStart<'_>, local: &[u8]) -> ImportResult<usize> {
    Ok(attr_value(e, local)?
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1))
}
