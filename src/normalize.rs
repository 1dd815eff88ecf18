//! Conversion of raw tables into uniform string grids.

use crate::model::{Cell, NormalizedTable, RawTable};
use crate::options::RowPolicy;

/// Normalize a table, keeping every row at its located width.
///
/// Absent cells become `""`; present values are kept verbatim.
///
/// ```
/// use tabex::{normalize, Cell, RawTable};
///
/// let raw = RawTable::with_rows(1, vec![vec![Cell::text("a"), Cell::Absent]]);
/// assert_eq!(normalize(raw).rows, vec![vec!["a".to_string(), String::new()]]);
/// ```
pub fn normalize(table: RawTable) -> NormalizedTable {
    normalize_with(table, RowPolicy::Preserve)
}

/// Normalize a table under the given row policy.
pub fn normalize_with(table: RawTable, policy: RowPolicy) -> NormalizedTable {
    let width = table.max_width();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.into_iter().map(Cell::into_string).collect();
            if policy == RowPolicy::PadToWidest {
                cells.resize(width, String::new());
            }
            cells
        })
        .collect();

    NormalizedTable {
        locator_id: table.locator_id,
        rows,
    }
}
