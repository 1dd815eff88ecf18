//! Table detection using text position analysis (stream mode).
//!
//! Detects tables by analyzing text alignment patterns without relying on
//! graphical lines: spans are grouped into rows by baseline, column
//! boundaries come from left edges that line up across rows, and runs of
//! aligned rows become tables.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{Cell, RawTable};

use super::layout::TextSpan;

/// Width of the buckets used to group left edges, in points.
const EDGE_BUCKET_SIZE: f32 = 5.0;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Y of the first row (top of table, in PDF coords)
    pub top_y: f32,
    /// Y of the last row
    pub bottom_y: f32,
    /// Left X boundary
    pub left_x: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Detected column boundaries (X coordinates)
    pub columns: Vec<f32>,
    /// Rows of text spans grouped by Y position
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Y position of this row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Text-alignment detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in a list of text spans.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < self.config.min_rows * self.config.min_columns {
            log::debug!(
                "TableDetector: not enough spans ({} < {})",
                spans.len(),
                self.config.min_rows * self.config.min_columns
            );
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        log::debug!("TableDetector: grouped into {} rows", rows.len());

        if rows.len() < self.config.min_rows {
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: detected {} columns at positions: {:?}",
            columns.len(),
            columns
        );

        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let table_regions = self.find_table_regions(&rows, &columns);
        log::debug!("TableDetector: found {} table regions", table_regions.len());

        let mut detected_tables = Vec::new();

        for (start_row, end_row) in table_regions {
            let table_rows: Vec<TableRowData> = rows[start_row..=end_row].to_vec();

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(&table_rows);

            if table_columns.len() < self.config.min_columns {
                continue;
            }

            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }

            if self.is_list_pattern(&table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, detected as list pattern");
                continue;
            }

            let spans_in_region = || table_rows.iter().flat_map(|r| r.spans.iter());
            let left_x = spans_in_region()
                .map(|s| s.x)
                .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
                .unwrap_or(0.0);
            let right_x = spans_in_region()
                .map(|s| s.x + s.width)
                .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
                .unwrap_or(0.0);

            detected_tables.push(DetectedTable {
                top_y: table_rows.first().map(|r| r.y).unwrap_or(0.0),
                bottom_y: table_rows.last().map(|r| r.y).unwrap_or(0.0),
                left_x,
                right_x,
                columns: table_columns,
                rows: table_rows,
            });
        }

        detected_tables
    }

    /// Group spans into rows by Y position.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        if spans.is_empty() {
            return vec![];
        }

        // Sort by Y (descending for PDF coords) then X
        let mut sorted_spans = spans.to_vec();
        sorted_spans.sort_by(|a, b| {
            let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal);
            if y_cmp == Ordering::Equal {
                a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal)
            } else {
                y_cmp
            }
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current_row_spans: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted_spans {
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;

            match current_y {
                Some(y) if (span.y - y).abs() <= y_tolerance => {
                    current_row_spans.push(span);
                }
                _ => {
                    if !current_row_spans.is_empty() {
                        rows.push(Self::make_row(std::mem::take(&mut current_row_spans)));
                    }
                    current_y = Some(span.y);
                    current_row_spans.push(span);
                }
            }
        }

        if !current_row_spans.is_empty() {
            rows.push(Self::make_row(current_row_spans));
        }

        rows
    }

    fn make_row(mut spans: Vec<TextSpan>) -> TableRowData {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
        TableRowData { y, spans }
    }

    /// Detect column boundaries from text edges.
    ///
    /// Rows with two or more spans vote for the buckets their left edges fall
    /// in; when too few such rows exist every row votes.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        if rows.is_empty() {
            return vec![];
        }

        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let (voters, one_vote_per_row): (Vec<&TableRowData>, bool) =
            if multi_span_rows.len() < self.config.min_rows {
                (rows.iter().collect(), false)
            } else {
                (multi_span_rows, true)
            };

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            if one_vote_per_row {
                let buckets: HashSet<i32> = row
                    .spans
                    .iter()
                    .map(|s| (s.x / EDGE_BUCKET_SIZE).round() as i32)
                    .collect();
                for bucket in buckets {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            } else {
                for span in &row.spans {
                    let bucket = (span.x / EDGE_BUCKET_SIZE).round() as i32;
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        let min_occurrences = (voters.len() as f32 * self.config.min_alignment_ratio) as usize;
        let min_occurrences = min_occurrences.max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * EDGE_BUCKET_SIZE)
            .collect();

        column_edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        // Merge close edges
        let mut merged_edges: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged_edges.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged_edges.push(edge),
            }
        }

        log::debug!("TableDetector: merged column edges = {:?}", merged_edges);

        merged_edges
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        if rows.is_empty() || columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut regions: Vec<(usize, usize)> = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let alignment_score = self.calculate_alignment_score(row, columns);

            if alignment_score >= self.config.min_alignment_ratio {
                if current_start.is_none() {
                    current_start = Some(i);
                }
            } else {
                if let Some(start) = current_start {
                    if i - start >= self.config.min_rows {
                        regions.push((start, i - 1));
                    }
                }
                current_start = None;
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Calculate how well a row aligns with the detected columns.
    fn calculate_alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let tolerance = 5.0;

        let aligned_spans = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= tolerance))
            .count();

        aligned_spans as f32 / row.spans.len() as f32
    }

    /// Lay a detected table out as a grid of cells.
    ///
    /// Every row gets one slot per column; a slot no span falls into is
    /// [`Cell::Absent`].
    pub fn to_raw_table(&self, detected: &DetectedTable, locator_id: u32) -> RawTable {
        let columns = &detected.columns;
        let mut table = RawTable::new(locator_id);

        for row_data in &detected.rows {
            let mut cell_contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];

            for span in &row_data.spans {
                let col_idx = self.find_column_for_span(span.x, columns, detected.right_x);
                if let Some(contents) = cell_contents.get_mut(col_idx) {
                    contents.push(span.text.trim());
                }
            }

            let cells = cell_contents
                .into_iter()
                .map(|contents| {
                    if contents.is_empty() {
                        Cell::Absent
                    } else {
                        Cell::text(contents.join(" "))
                    }
                })
                .collect();

            table.add_row(cells);
        }

        table
    }

    /// Find which column a span belongs to based on its X position.
    fn find_column_for_span(&self, span_x: f32, columns: &[f32], right_x: f32) -> usize {
        if columns.is_empty() {
            return 0;
        }

        // Allow some tolerance (10pt) for spans slightly before column start
        for (i, &col_start) in columns.iter().enumerate() {
            let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
            if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
                return i;
            }
        }

        // If no exact match, find the closest column
        columns
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (span_x - **a)
                    .abs()
                    .partial_cmp(&(span_x - **b).abs())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// When a PDF has a numbered list like "1. Item", the number and text often
    /// become separate spans at different X positions, which looks like a
    /// multi-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            // Spans are sorted by X, the first is the leftmost
            if let Some(span) = row.spans.first() {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;
        log::debug!(
            "TableDetector: list markers: bullets={}, numbers={}, rows={}",
            bullet_count,
            number_count,
            rows.len()
        );

        // Bullet markers are almost never real table data
        if bullet_ratio >= 0.5 {
            return true;
        }

        // Only reject 2-column numbered regions; real tables often number their first column
        columns.len() == 2 && total_ratio >= 0.5
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※" | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    // digits followed by "." or ")"
    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // Letter marker: "a.", "B)"
    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.len() as f32 * 6.0,
            font_size: 12.0,
            font_name: "Helvetica".to_string(),
        }
    }

    fn is_list_marker(text: &str) -> bool {
        is_bullet_marker(text) || is_number_marker(text)
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("B1", 60.0, 100.0),
            make_span("A1", 10.0, 100.0),
            make_span("A2", 10.0, 85.0),
            make_span("B2", 60.0, 85.0),
        ];

        let rows = detector.group_into_rows(&spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans[0].text, "A1");
        assert_eq!(rows[1].spans.len(), 2);
    }

    #[test]
    fn test_detect_columns() {
        let detector = TableDetector::new();
        let rows: Vec<TableRowData> = [100.0, 85.0, 70.0]
            .iter()
            .map(|&y| TableRowData {
                y,
                spans: vec![make_span("A", 10.0, y), make_span("B", 60.0, y)],
            })
            .collect();

        let columns = detector.detect_columns(&rows);
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("Name", 10.0, 100.0),
            make_span("Age", 60.0, 100.0),
            make_span("Alice", 10.0, 85.0),
            make_span("30", 60.0, 85.0),
            make_span("Bob", 10.0, 70.0),
            make_span("25", 60.0, 70.0),
        ];

        let tables = detector.detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].columns.len(), 2);

        let raw = detector.to_raw_table(&tables[0], 4);
        assert_eq!(raw.locator_id, 4);
        assert_eq!(
            raw.rows,
            vec![
                vec![Cell::text("Name"), Cell::text("Age")],
                vec![Cell::text("Alice"), Cell::text("30")],
                vec![Cell::text("Bob"), Cell::text("25")],
            ]
        );
    }

    #[test]
    fn test_missing_column_is_absent() {
        let detector = TableDetector::new();
        let detected = DetectedTable {
            top_y: 100.0,
            bottom_y: 85.0,
            left_x: 10.0,
            right_x: 140.0,
            columns: vec![10.0, 60.0, 110.0],
            rows: vec![
                TableRowData {
                    y: 100.0,
                    spans: vec![
                        make_span("Item", 10.0, 100.0),
                        make_span("Qty", 60.0, 100.0),
                        make_span("Price", 110.0, 100.0),
                    ],
                },
                TableRowData {
                    y: 85.0,
                    spans: vec![make_span("Pen", 10.0, 85.0), make_span("2.50", 110.0, 85.0)],
                },
            ],
        };

        let raw = detector.to_raw_table(&detected, 1);
        assert_eq!(
            raw.rows[1],
            vec![Cell::text("Pen"), Cell::Absent, Cell::text("2.50")]
        );
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("Line 1", 10.0, 100.0),
            make_span("Line 2", 10.0, 85.0),
            make_span("Line 3", 10.0, 70.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_two_tables_split_by_prose() {
        let detector = TableDetector::new();
        let mut spans = Vec::new();
        for (i, y) in [500.0, 485.0, 470.0].iter().enumerate() {
            spans.push(make_span(&format!("a{}", i), 50.0, *y));
            spans.push(make_span(&format!("b{}", i), 200.0, *y));
        }
        // A prose line whose single span sits off every column
        spans.push(make_span("Some paragraph text between tables", 120.0, 400.0));
        for (i, y) in [300.0, 285.0, 270.0].iter().enumerate() {
            spans.push(make_span(&format!("c{}", i), 50.0, *y));
            spans.push(make_span(&format!("d{}", i), 200.0, *y));
        }

        let tables = detector.detect(&spans);
        assert_eq!(tables.len(), 2);
        assert!(tables[0].top_y > tables[1].top_y);
    }

    #[test]
    fn test_numbered_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("1.", 50.0, 400.0),
            make_span("Scope", 80.0, 400.0),
            make_span("2.", 50.0, 370.0),
            make_span("Definitions", 80.0, 370.0),
            make_span("3.", 50.0, 340.0),
            make_span("Requirements", 80.0, 340.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("-", 50.0, 400.0),
            make_span("Management", 80.0, 400.0),
            make_span("-", 50.0, 370.0),
            make_span("Interface/Service Option", 80.0, 370.0),
            make_span("-", 50.0, 340.0),
            make_span("Firmware", 80.0, 340.0),
        ];

        assert!(detector.detect(&spans).is_empty());
    }

    #[test]
    fn test_is_list_marker() {
        assert!(is_list_marker("1."));
        assert!(is_list_marker("12."));
        assert!(is_list_marker("1)"));
        assert!(is_list_marker("1 ."));
        assert!(is_list_marker("3"));
        assert!(is_list_marker("-"));
        assert!(is_list_marker("•"));
        assert!(is_list_marker("a."));
        assert!(is_list_marker("B)"));

        assert!(!is_list_marker("Name"));
        assert!(!is_list_marker("Alice"));
        assert!(!is_list_marker(""));
    }
}
