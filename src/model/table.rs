//! Table types.

use serde::{Deserialize, Serialize};

/// A single extracted cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    /// Text found in the cell (possibly empty)
    Present(String),
    /// No value at this position
    Absent,
}

impl Cell {
    /// Create a present cell.
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Present(text.into())
    }

    /// Create a present cell, or `Absent` if the text is empty.
    pub fn non_empty(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Cell::Absent
        } else {
            Cell::Present(text)
        }
    }

    /// Check if the cell is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Borrow the text, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Present(s) => Some(s),
            Cell::Absent => None,
        }
    }

    /// Convert into a string, substituting `""` for an absent cell.
    pub fn into_string(self) -> String {
        match self {
            Cell::Present(s) => s,
            Cell::Absent => String::new(),
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Absent, Cell::Present)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Present(value.to_string())
    }
}

/// A table as produced by a locator.
///
/// Rows may have different lengths; nothing here reconciles them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Page number (PDF) or discovery position (HTML), 1-based
    pub locator_id: u32,
    /// Rows of cells, in reading order
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Create an empty table with the given locator id.
    pub fn new(locator_id: u32) -> Self {
        Self {
            locator_id,
            rows: Vec::new(),
        }
    }

    /// Create a table from rows.
    pub fn with_rows(locator_id: u32, rows: Vec<Vec<Cell>>) -> Self {
        Self { locator_id, rows }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table whose cells are all strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Carried over from the source [`RawTable`]
    pub locator_id: u32,
    /// Rows of strings
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
