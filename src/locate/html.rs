//! HTML table locator using lol_html.
//!
//! The markup is streamed once. Table, row and cell boundaries are tracked on
//! a stack of open tables so that nested tables and omitted end tags are
//! handled without building a DOM.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::sync::OnceLock;

use lol_html::html_content::EndTag;
use lol_html::{doc_text, element, HtmlRewriter, Settings};
use regex::Regex;

use crate::error::Result;
use crate::model::{Cell, DocumentKind, RawTable};

use super::TableLocator;

/// Largest `colspan` honoured; larger values are clamped.
const MAX_COLSPAN: usize = 1000;

/// Largest `rowspan` honoured; larger values are clamped.
const MAX_ROWSPAN: usize = 65534;

/// Locates `<table>` elements in HTML documents.
///
/// Tables are numbered 1, 2, ... in the order their start tags appear, and
/// returned in that order. A nested table is located as a table of its own.
#[derive(Debug, Clone, Default)]
pub struct HtmlLocator;

impl HtmlLocator {
    /// Create a new HTML locator.
    pub fn new() -> Self {
        Self
    }

    /// Locate tables in an HTML string.
    pub fn locate_str(&self, html: &str) -> Result<Vec<RawTable>> {
        self.locate_bytes(html.as_bytes())
    }
}

impl TableLocator for HtmlLocator {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Html
    }

    fn name(&self) -> &str {
        "HTML"
    }

    fn locate(&self, path: &Path) -> Result<Vec<RawTable>> {
        let data = std::fs::read(path)?;
        self.locate_bytes(&data)
    }

    fn locate_bytes(&self, data: &[u8]) -> Result<Vec<RawTable>> {
        let state = Rc::new(RefCell::new(Collector::default()));

        let table_state = state.clone();
        let row_state = state.clone();
        let cell_state = state.clone();
        let br_state = state.clone();
        let text_state = state.clone();

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("table", move |el| {
                        let id = table_state.borrow_mut().open_table();
                        if let Some(handlers) = el.end_tag_handlers() {
                            let state = table_state.clone();
                            handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                                state.borrow_mut().close_table(id);
                                Ok(())
                            }) as _);
                        }
                        Ok(())
                    }),
                    element!("tr", move |el| {
                        let opened = row_state.borrow_mut().start_row();
                        if let (Some((table_id, row)), Some(handlers)) =
                            (opened, el.end_tag_handlers())
                        {
                            let state = row_state.clone();
                            handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                                state.borrow_mut().end_row(table_id, row);
                                Ok(())
                            }) as _);
                        }
                        Ok(())
                    }),
                    element!("td, th", move |el| {
                        let colspan = parse_span(el.get_attribute("colspan"), MAX_COLSPAN);
                        let rowspan = parse_span(el.get_attribute("rowspan"), MAX_ROWSPAN);
                        let opened = cell_state.borrow_mut().start_cell(colspan, rowspan);
                        if let (Some((table_id, serial)), Some(handlers)) =
                            (opened, el.end_tag_handlers())
                        {
                            let state = cell_state.clone();
                            handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                                state.borrow_mut().end_cell(table_id, serial);
                                Ok(())
                            }) as _);
                        }
                        Ok(())
                    }),
                    element!("br", move |_el| {
                        br_state.borrow_mut().push_text(" ");
                        Ok(())
                    }),
                ],
                document_content_handlers: vec![doc_text!(move |t| {
                    text_state.borrow_mut().push_text(t.as_str());
                    Ok(())
                })],
                ..Settings::new()
            },
            |_: &[u8]| {},
        );

        rewriter.write(data)?;
        rewriter.end()?;

        let collector = state.take();
        let tables = collector.finish();
        log::debug!("HtmlLocator: found {} tables", tables.len());
        Ok(tables)
    }
}

/// Parse a `colspan`/`rowspan` value; missing, zero or malformed values count as 1.
fn parse_span(value: Option<String>, max: usize) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .map_or(1, |n| n.min(max))
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Decode entities, collapse whitespace and trim raw cell text.
fn clean_cell_text(raw: &str) -> Cell {
    let decoded = html_escape::decode_html_entities(raw);
    let collapsed = whitespace().replace_all(&decoded, " ");
    Cell::non_empty(collapsed.trim())
}

/// A finished source cell before span expansion.
#[derive(Debug, Clone)]
struct SourceCell {
    value: Cell,
    colspan: usize,
    rowspan: usize,
}

#[derive(Debug)]
struct OpenCell {
    serial: u64,
    raw: String,
    colspan: usize,
    rowspan: usize,
}

#[derive(Debug)]
struct TableBuilder {
    id: u32,
    rows: Vec<Vec<SourceCell>>,
    row_open: bool,
    cell: Option<OpenCell>,
}

impl TableBuilder {
    fn new(id: u32) -> Self {
        Self {
            id,
            rows: Vec::new(),
            row_open: false,
            cell: None,
        }
    }

    fn close_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            let source = SourceCell {
                value: clean_cell_text(&cell.raw),
                colspan: cell.colspan,
                rowspan: cell.rowspan,
            };
            if let Some(row) = self.rows.last_mut() {
                row.push(source);
            }
        }
    }

    fn finish(mut self) -> RawTable {
        self.close_cell();
        RawTable::with_rows(self.id, expand_spans(self.rows))
    }
}

/// Parser state shared by the rewriter's handlers.
#[derive(Debug, Default)]
struct Collector {
    next_id: u32,
    next_serial: u64,
    open: Vec<TableBuilder>,
    finished: Vec<RawTable>,
}

impl Collector {
    fn open_table(&mut self) -> u32 {
        self.next_id += 1;
        self.open.push(TableBuilder::new(self.next_id));
        self.next_id
    }

    /// Close the table with `id` and any tables still open inside it.
    fn close_table(&mut self, id: u32) {
        if let Some(pos) = self.open.iter().rposition(|t| t.id == id) {
            while self.open.len() > pos {
                if let Some(table) = self.open.pop() {
                    self.finished.push(table.finish());
                }
            }
        }
    }

    fn start_row(&mut self) -> Option<(u32, usize)> {
        let table = self.open.last_mut()?;
        table.close_cell();
        table.rows.push(Vec::new());
        table.row_open = true;
        Some((table.id, table.rows.len() - 1))
    }

    fn end_row(&mut self, table_id: u32, row: usize) {
        if let Some(table) = self.open.last_mut() {
            if table.id == table_id && table.row_open && table.rows.len() == row + 1 {
                table.close_cell();
                table.row_open = false;
            }
        }
    }

    fn start_cell(&mut self, colspan: usize, rowspan: usize) -> Option<(u32, u64)> {
        self.next_serial += 1;
        let serial = self.next_serial;

        let table = self.open.last_mut()?;
        table.close_cell();
        if !table.row_open {
            table.rows.push(Vec::new());
            table.row_open = true;
        }
        table.cell = Some(OpenCell {
            serial,
            raw: String::new(),
            colspan,
            rowspan,
        });
        Some((table.id, serial))
    }

    fn end_cell(&mut self, table_id: u32, serial: u64) {
        if let Some(table) = self.open.last_mut() {
            let is_current = table.cell.as_ref().is_some_and(|c| c.serial == serial);
            if table.id == table_id && is_current {
                table.close_cell();
            }
        }
    }

    /// Append text to the open cell of the innermost table.
    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.open.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.raw.push_str(text);
        }
    }

    /// Close anything left open and return tables in discovery order.
    fn finish(mut self) -> Vec<RawTable> {
        while let Some(table) = self.open.pop() {
            self.finished.push(table.finish());
        }
        self.finished.sort_by_key(|t| t.locator_id);
        self.finished
    }
}

/// Expand `colspan`/`rowspan` by repeating each cell into every slot it covers.
///
/// Cells carried down by a rowspan fill their column before the row's own
/// cells reach it. Rowspans reaching past the last row add trailing rows.
fn expand_spans(rows: Vec<Vec<SourceCell>>) -> Vec<Vec<Cell>> {
    let mut expanded: Vec<Vec<Cell>> = Vec::with_capacity(rows.len());
    // (column, value, rows still to cover)
    let mut remainder: VecDeque<(usize, Cell, usize)> = VecDeque::new();

    for row in rows {
        let mut cells: Vec<Cell> = Vec::new();
        let mut next_remainder: VecDeque<(usize, Cell, usize)> = VecDeque::new();
        let mut index = 0;

        for source in row {
            while remainder.front().is_some_and(|(col, _, _)| *col <= index) {
                if let Some((col, value, left)) = remainder.pop_front() {
                    cells.push(value.clone());
                    if left > 1 {
                        next_remainder.push_back((col, value, left - 1));
                    }
                    index += 1;
                }
            }

            for _ in 0..source.colspan {
                cells.push(source.value.clone());
                if source.rowspan > 1 {
                    next_remainder.push_back((index, source.value.clone(), source.rowspan - 1));
                }
                index += 1;
            }
        }

        for (col, value, left) in remainder.drain(..) {
            cells.push(value.clone());
            if left > 1 {
                next_remainder.push_back((col, value, left - 1));
            }
        }

        if !cells.is_empty() {
            expanded.push(cells);
        }
        remainder = next_remainder;
    }

    while !remainder.is_empty() {
        let mut cells = Vec::new();
        let mut next_remainder = VecDeque::new();
        for (col, value, left) in remainder.drain(..) {
            cells.push(value.clone());
            if left > 1 {
                next_remainder.push_back((col, value, left - 1));
            }
        }
        expanded.push(cells);
        remainder = next_remainder;
    }

    expanded
}
