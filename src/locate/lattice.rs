//! Table detection from ruling lines (lattice mode).
//!
//! Ruling edges are snapped onto shared positions, joined into continuous
//! lines and intersected. Every rectangle whose four corners are connected
//! intersections becomes a cell, and cells that share corners form a table.
//! Text is assigned to the cell containing its anchor point.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{Cell, RawTable};

use super::layout::{group_into_lines, Edge, Orientation, PageContent, TextLine, TextSpan};

/// Ruling-line detector configuration.
#[derive(Debug, Clone)]
pub struct LatticeConfig {
    /// Parallel edges closer than this are moved onto a common position
    pub snap_tolerance: f32,
    /// Collinear edges separated by at most this gap are merged
    pub join_tolerance: f32,
    /// Edges shorter than this are ignored
    pub edge_min_length: f32,
    /// How far an edge may stop short of a crossing edge and still intersect it
    pub intersection_tolerance: f32,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
        }
    }
}

/// A cell rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl CellBox {
    fn corners(&self) -> [PointKey; 4] {
        [
            key(self.left, self.top),
            key(self.right, self.top),
            key(self.left, self.bottom),
            key(self.right, self.bottom),
        ]
    }

    /// Whether a point lies inside the cell (left and top edges inclusive).
    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        x >= self.left && x < self.right && y > self.bottom && y <= self.top
    }
}

/// Cells of one ruled table.
#[derive(Debug, Clone)]
pub struct LatticeTable {
    pub cells: Vec<CellBox>,
}

impl LatticeTable {
    /// Top edge of the table.
    pub fn top(&self) -> f32 {
        self.cells
            .iter()
            .map(|c| c.top)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Left edge of the table.
    pub fn left(&self) -> f32 {
        self.cells.iter().map(|c| c.left).fold(f32::INFINITY, f32::min)
    }

    /// Lay the table out as rows of cells.
    ///
    /// Rows follow the distinct cell tops (top to bottom) and columns the
    /// distinct cell lefts. A grid slot no cell starts at, as under a merged
    /// cell, is [`Cell::Absent`]. A cell without text is an empty string.
    pub fn to_raw_table(&self, spans: &[TextSpan], locator_id: u32) -> RawTable {
        let mut tops: Vec<f32> = self.cells.iter().map(|c| c.top).collect();
        tops.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        tops.dedup();

        let mut lefts: Vec<f32> = self.cells.iter().map(|c| c.left).collect();
        lefts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        lefts.dedup();

        let mut table = RawTable::new(locator_id);
        for top in &tops {
            let row = lefts
                .iter()
                .map(|left| {
                    self.cells
                        .iter()
                        .find(|c| c.top == *top && c.left == *left)
                        .map_or(Cell::Absent, |c| Cell::text(cell_text(c, spans)))
                })
                .collect();
            table.add_row(row);
        }

        table
    }
}

/// Detects ruled tables on a page.
pub struct LatticeDetector {
    config: LatticeConfig,
}

impl LatticeDetector {
    pub fn new() -> Self {
        Self {
            config: LatticeConfig::default(),
        }
    }

    pub fn with_config(config: LatticeConfig) -> Self {
        Self { config }
    }

    /// Find tables on a page and fill them with its text, top to bottom.
    pub fn detect(&self, content: &PageContent, locator_id: u32) -> Vec<RawTable> {
        self.find_tables(&content.edges)
            .iter()
            .map(|t| t.to_raw_table(&content.spans, locator_id))
            .collect()
    }

    /// Find ruled tables from raw edges, ordered top to bottom then left to right.
    pub fn find_tables(&self, edges: &[Edge]) -> Vec<LatticeTable> {
        let min_len = self.config.edge_min_length;
        let edges: Vec<Edge> = edges.iter().filter(|e| e.length() >= min_len).cloned().collect();
        if edges.is_empty() {
            return vec![];
        }

        let edges = snap_edges(edges, self.config.snap_tolerance);
        let edges: Vec<Edge> = join_edges(edges, self.config.join_tolerance)
            .into_iter()
            .filter(|e| e.length() >= min_len)
            .collect();

        let intersections = find_intersections(&edges, self.config.intersection_tolerance);
        log::debug!(
            "LatticeDetector: {} edges, {} intersections",
            edges.len(),
            intersections.len()
        );

        let cells = build_cells(&intersections);
        let mut tables: Vec<LatticeTable> = group_cells(cells)
            .into_iter()
            .filter(|cells| cells.len() > 1)
            .map(|cells| LatticeTable { cells })
            .collect();

        tables.sort_by(|a, b| {
            b.top()
                .partial_cmp(&a.top())
                .unwrap_or(Ordering::Equal)
                .then(a.left().partial_cmp(&b.left()).unwrap_or(Ordering::Equal))
        });

        log::debug!("LatticeDetector: found {} tables", tables.len());
        tables
    }
}

impl Default for LatticeDetector {
    fn default() -> Self {
        Self::new()
    }
}

type PointKey = (u32, u32);

fn key(x: f32, y: f32) -> PointKey {
    (x.to_bits(), y.to_bits())
}

/// A crossing of ruling edges, with the edges that pass through it.
#[derive(Debug)]
struct Intersection {
    x: f32,
    y: f32,
    horizontal: HashSet<usize>,
    vertical: HashSet<usize>,
}

fn orientation_rank(orientation: Orientation) -> u8 {
    match orientation {
        Orientation::Horizontal => 0,
        Orientation::Vertical => 1,
    }
}

/// Move parallel edges whose positions chain within `tolerance` onto their mean.
fn snap_edges(edges: Vec<Edge>, tolerance: f32) -> Vec<Edge> {
    let (mut horizontal, mut vertical): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Horizontal);

    snap_group(&mut horizontal, tolerance);
    snap_group(&mut vertical, tolerance);

    horizontal.extend(vertical);
    horizontal
}

fn snap_group(edges: &mut [Edge], tolerance: f32) {
    edges.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap_or(Ordering::Equal));

    let mut start = 0;
    for i in 1..=edges.len() {
        if i == edges.len() || edges[i].position - edges[i - 1].position > tolerance {
            let cluster = &mut edges[start..i];
            let mean = cluster.iter().map(|e| e.position).sum::<f32>() / cluster.len() as f32;
            for edge in cluster {
                edge.position = mean;
            }
            start = i;
        }
    }
}

/// Merge collinear edges that overlap or are separated by at most `tolerance`.
fn join_edges(mut edges: Vec<Edge>, tolerance: f32) -> Vec<Edge> {
    edges.sort_by(|a, b| {
        orientation_rank(a.orientation)
            .cmp(&orientation_rank(b.orientation))
            .then(a.position.partial_cmp(&b.position).unwrap_or(Ordering::Equal))
            .then(a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal))
    });

    let mut joined: Vec<Edge> = Vec::with_capacity(edges.len());
    for edge in edges {
        match joined.last_mut() {
            Some(last)
                if last.orientation == edge.orientation
                    && last.position == edge.position
                    && edge.start <= last.end + tolerance =>
            {
                last.end = last.end.max(edge.end);
            }
            _ => joined.push(edge),
        }
    }

    joined
}

fn find_intersections(edges: &[Edge], tolerance: f32) -> Vec<Intersection> {
    let mut points: Vec<Intersection> = Vec::new();
    let mut index: HashMap<PointKey, usize> = HashMap::new();

    for (vi, v) in edges
        .iter()
        .enumerate()
        .filter(|(_, e)| e.orientation == Orientation::Vertical)
    {
        for (hi, h) in edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.orientation == Orientation::Horizontal)
        {
            let crosses = v.position >= h.start - tolerance
                && v.position <= h.end + tolerance
                && h.position >= v.start - tolerance
                && h.position <= v.end + tolerance;
            if !crosses {
                continue;
            }

            let (x, y) = (v.position, h.position);
            let slot = *index.entry(key(x, y)).or_insert_with(|| {
                points.push(Intersection {
                    x,
                    y,
                    horizontal: HashSet::new(),
                    vertical: HashSet::new(),
                });
                points.len() - 1
            });
            points[slot].horizontal.insert(hi);
            points[slot].vertical.insert(vi);
        }
    }

    points
}

/// Find the smallest connected rectangle hanging off each intersection.
fn build_cells(points: &[Intersection]) -> Vec<CellBox> {
    let lookup: HashMap<PointKey, &Intersection> =
        points.iter().map(|p| (key(p.x, p.y), p)).collect();

    let mut ordered: Vec<&Intersection> = points.iter().collect();
    ordered.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut cells = Vec::new();

    for corner in &ordered {
        // Nearest first
        let below: Vec<&Intersection> = ordered
            .iter()
            .filter(|p| p.x == corner.x && p.y < corner.y)
            .copied()
            .collect();
        let mut right: Vec<&Intersection> = ordered
            .iter()
            .filter(|p| p.y == corner.y && p.x > corner.x)
            .copied()
            .collect();
        right.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

        'search: for bottom_left in &below {
            if corner.vertical.is_disjoint(&bottom_left.vertical) {
                continue;
            }
            for top_right in &right {
                if corner.horizontal.is_disjoint(&top_right.horizontal) {
                    continue;
                }
                let Some(bottom_right) = lookup.get(&key(top_right.x, bottom_left.y)) else {
                    continue;
                };
                if !bottom_right.vertical.is_disjoint(&top_right.vertical)
                    && !bottom_right.horizontal.is_disjoint(&bottom_left.horizontal)
                {
                    cells.push(CellBox {
                        left: corner.x,
                        bottom: bottom_left.y,
                        right: top_right.x,
                        top: corner.y,
                    });
                    break 'search;
                }
            }
        }
    }

    cells
}

/// Group cells that share corners, transitively.
fn group_cells(mut remaining: Vec<CellBox>) -> Vec<Vec<CellBox>> {
    let mut groups = Vec::new();

    while !remaining.is_empty() {
        let first = remaining.remove(0);
        let mut corners: HashSet<PointKey> = first.corners().into_iter().collect();
        let mut group = vec![first];

        loop {
            let before = group.len();
            let mut i = 0;
            while i < remaining.len() {
                if remaining[i].corners().iter().any(|c| corners.contains(c)) {
                    let cell = remaining.remove(i);
                    corners.extend(cell.corners());
                    group.push(cell);
                } else {
                    i += 1;
                }
            }
            if group.len() == before {
                break;
            }
        }

        groups.push(group);
    }

    groups
}

/// Text of the spans anchored inside a cell, one line per baseline.
fn cell_text(cell: &CellBox, spans: &[TextSpan]) -> String {
    let inside: Vec<TextSpan> = spans
        .iter()
        .filter(|s| cell.contains(s.anchor()))
        .cloned()
        .collect();

    group_into_lines(inside)
        .iter()
        .map(TextLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}
