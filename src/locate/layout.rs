//! Page content analysis for PDF documents.
//!
//! Interprets a page's content stream to recover the two things table
//! detection needs: positioned text spans and the horizontal/vertical ruling
//! edges drawn on the page. Coordinates are in default user space (origin at
//! the bottom-left, Y grows upwards).

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// Segments whose endpoints differ by at most this much on one axis are
/// treated as axis-aligned.
const ORIENTATION_TOLERANCE: f32 = 1.0;

/// Nesting limit for form XObjects; deeper (or cyclic) forms are ignored.
const MAX_FORM_DEPTH: usize = 8;

/// Page tree levels searched for inherited resources.
const MAX_TREE_DEPTH: usize = 32;

/// A text span with position and font information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Approximate width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextSpan {
    /// Create a new text span, estimating its width from the font size.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
        }
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2 // Approximate descender
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8 // Approximate ascender
    }

    /// Point used to decide which cell a span falls into.
    pub fn anchor(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.font_size * 0.3)
    }
}

/// A text line composed of multiple spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        Self { spans, y }
    }

    /// Get the combined text of all spans with appropriate spacing.
    ///
    /// Inserts spaces between spans based on their X coordinate gaps.
    /// For CJK characters, no space is inserted between adjacent characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }

            let prev_span = &self.spans[i - 1];
            let gap = span.x - (prev_span.x + prev_span.width);

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.width > 0.0 {
                span.width / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let should_insert_space = if gap > avg_char_width * 0.2 {
                let prev_is_cjk = prev_span
                    .text
                    .chars()
                    .last()
                    .map(is_spaceless_script_char)
                    .unwrap_or(false);
                let curr_is_cjk = span
                    .text
                    .chars()
                    .next()
                    .map(is_spaceless_script_char)
                    .unwrap_or(false);
                !(prev_is_cjk && curr_is_cjk)
            } else {
                false
            };

            let prev_ends_with_space =
                prev_span.text.ends_with(' ') || prev_span.text.ends_with('\u{00A0}');
            let curr_starts_with_space =
                span.text.starts_with(' ') || span.text.starts_with('\u{00A0}');

            if should_insert_space && !prev_ends_with_space && !curr_starts_with_space {
                result.push(' ');
            }

            result.push_str(&span.text);
        }

        result
    }
}

/// Group spans into lines top to bottom; each line's spans are sorted by X.
pub fn group_into_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    let mut spans = spans;
    spans.sort_by(|a, b| {
        let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_line_spans: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.font_size * 0.3;

        match current_y {
            Some(y) if (span.y - y).abs() <= y_tolerance => current_line_spans.push(span),
            _ => {
                if !current_line_spans.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(
                        &mut current_line_spans,
                    )));
                }
                current_y = Some(span.y);
                current_line_spans.push(span);
            }
        }
    }

    if !current_line_spans.is_empty() {
        lines.push(TextLine::from_spans(current_line_spans));
    }

    lines
}

/// Orientation of a ruling edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned ruling segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub orientation: Orientation,
    /// Y for horizontal edges, X for vertical edges
    pub position: f32,
    /// Lower bound along the edge's axis
    pub start: f32,
    /// Upper bound along the edge's axis
    pub end: f32,
}

impl Edge {
    /// Create a horizontal edge at `y` spanning `x0..x1`.
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            position: y,
            start: x0.min(x1),
            end: x0.max(x1),
        }
    }

    /// Create a vertical edge at `x` spanning `y0..y1`.
    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self {
            orientation: Orientation::Vertical,
            position: x,
            start: y0.min(y1),
            end: y0.max(y1),
        }
    }

    /// Length along the edge's axis.
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Classify a segment, returning `None` for diagonal or degenerate ones.
    pub fn from_segment(from: (f32, f32), to: (f32, f32)) -> Option<Self> {
        let (x0, y0) = from;
        let (x1, y1) = to;
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        if dy <= ORIENTATION_TOLERANCE && dx > dy {
            Some(Edge::horizontal((y0 + y1) / 2.0, x0, x1))
        } else if dx <= ORIENTATION_TOLERANCE && dy > dx {
            Some(Edge::vertical((x0 + x1) / 2.0, y0, y1))
        } else {
            None
        }
    }
}

/// Everything table detection needs from one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Text spans in content-stream order
    pub spans: Vec<TextSpan>,
    /// Ruling edges from stroked or filled paths
    pub edges: Vec<Edge>,
}

/// Decoded bytes of a content stream; unfiltered streams are used as stored.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::PdfParse(e.to_string()))
}

/// Resources visible to one content stream.
struct Scope<'a> {
    resources: Option<&'a Dictionary>,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    font_names: HashMap<Vec<u8>, String>,
}

impl<'a> Scope<'a> {
    fn new(resources: Option<&'a Dictionary>, fonts: BTreeMap<Vec<u8>, &'a Dictionary>) -> Self {
        let font_names = fonts
            .iter()
            .map(|(name, font)| {
                let base_font = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                (name.clone(), base_font)
            })
            .collect();

        Self {
            resources,
            fonts,
            font_names,
        }
    }
}

/// Content analyzer for PDF pages.
pub struct PageAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> PageAnalyzer<'a> {
    /// Create a new page analyzer.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract text spans and ruling edges from a page, by page number.
    pub fn extract_page(&self, page_num: u32) -> Result<PageContent> {
        let pages = self.doc.get_pages();
        let page_id = pages
            .get(&page_num)
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;
        self.analyze_page(*page_id)
    }

    /// Extract text spans and ruling edges from the page object `page_id`.
    /// Uses lopdf's font encoding support for proper text decoding.
    pub fn analyze_page(&self, page_id: ObjectId) -> Result<PageContent> {
        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let scope = Scope::new(self.page_resources(page_id), fonts);

        let mut page = PageContent::default();
        if let Some(content) = self.get_page_content(page_id)? {
            self.interpret(&content, &scope, Matrix::identity(), 0, &mut page)?;
        }

        log::debug!(
            "PageAnalyzer: {} spans, {} edges",
            page.spans.len(),
            page.edges.len()
        );
        Ok(page)
    }

    /// Get the page's concatenated content streams, or `None` for a page
    /// without content.
    fn get_page_content(&self, page_id: ObjectId) -> Result<Option<Vec<u8>>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(None),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => stream_bytes(s).map(Some),
                Ok(Object::Array(arr)) => Ok(Some(self.concat_streams(arr))),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => Ok(Some(self.concat_streams(arr))),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, arr: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in arr {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    if let Ok(data) = stream_bytes(s) {
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                }
            }
        }
        content
    }

    /// Resource dictionary of a page, inherited from the page tree if needed.
    fn page_resources(&self, page_id: ObjectId) -> Option<&'a Dictionary> {
        let mut id = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(resources) = dict.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            id = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        }
        None
    }

    fn resolve_dict(&self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Fonts declared in a resource dictionary.
    fn fonts_in(&self, resources: &'a Dictionary) -> BTreeMap<Vec<u8>, &'a Dictionary> {
        let mut fonts = BTreeMap::new();
        if let Some(dict) = resources.get(b"Font").ok().and_then(|o| self.resolve_dict(o)) {
            for (name, obj) in dict.iter() {
                if let Some(font) = self.resolve_dict(obj) {
                    fonts.insert(name.clone(), font);
                }
            }
        }
        fonts
    }

    /// Look up a form XObject by resource name; images and missing names give `None`.
    fn form_xobject(&self, scope: &Scope<'a>, name: &[u8]) -> Option<&'a Stream> {
        let xobjects = scope
            .resources?
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve_dict(o))?;
        let stream = match xobjects.get(name).ok()? {
            Object::Reference(r) => self.doc.get_object(*r).ok()?.as_stream().ok()?,
            Object::Stream(s) => s,
            _ => return None,
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|n| n == b"Form")
            .unwrap_or(false);
        is_form.then_some(stream)
    }

    /// Interpret a form XObject's content under the invoking CTM.
    fn interpret_form(
        &self,
        form: &'a Stream,
        parent: &Scope<'a>,
        ctm: Matrix,
        depth: usize,
        page: &mut PageContent,
    ) -> Result<()> {
        let form_matrix = form
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|arr| matrix_operand(arr))
            .unwrap_or_else(Matrix::identity);

        let resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| self.resolve_dict(o));
        let scope = match resources {
            Some(resources) => Scope::new(Some(resources), self.fonts_in(resources)),
            None => Scope::new(parent.resources, parent.fonts.clone()),
        };

        let content = stream_bytes(form)?;
        self.interpret(&content, &scope, form_matrix.multiply(&ctm), depth + 1, page)
    }

    /// Walk the content stream operators, tracking text and graphics state.
    fn interpret(
        &self,
        content: &[u8],
        scope: &Scope<'a>,
        base_ctm: Matrix,
        depth: usize,
        page: &mut PageContent,
    ) -> Result<()> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut ctm = base_ctm;
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut text_matrix = Matrix::identity();
        let mut leading: f32 = 0.0;
        let mut current_font = String::new();
        let mut current_font_key: Vec<u8> = Vec::new();
        let mut current_font_size: f32 = 12.0;
        let mut in_text_block = false;
        let mut path = PathBuilder::default();

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(operands) {
                        ctm = m.multiply(&ctm);
                    }
                }
                "Do" => {
                    let Some(Object::Name(name)) = operands.first() else {
                        continue;
                    };
                    if depth >= MAX_FORM_DEPTH {
                        log::debug!("PageAnalyzer: form nesting too deep, skipping");
                        continue;
                    }
                    if let Some(form) = self.form_xobject(scope, name) {
                        self.interpret_form(form, scope, ctm, depth, page)?;
                    }
                }
                "BT" => {
                    in_text_block = true;
                    text_matrix = Matrix::identity();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(font_key) = &operands[0] {
                            current_font_key = font_key.clone();
                            current_font = scope
                                .font_names
                                .get(font_key.as_slice())
                                .cloned()
                                .unwrap_or_else(|| {
                                    String::from_utf8_lossy(font_key.as_slice()).to_string()
                                });
                        }
                        current_font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(tl) = operands.first().and_then(get_number) {
                        leading = tl;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            leading = -ty;
                        }
                        text_matrix = Matrix::translation(tx, ty).multiply(&text_matrix);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(operands) {
                        text_matrix = m;
                    }
                }
                "T*" => {
                    text_matrix = Matrix::translation(0.0, -leading).multiply(&text_matrix);
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    if op.operator == "'" || op.operator == "\"" {
                        text_matrix = Matrix::translation(0.0, -leading).multiply(&text_matrix);
                    }
                    if !in_text_block {
                        continue;
                    }

                    let encoding = scope
                        .fonts
                        .get(&current_font_key)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());
                    let decode = |bytes: &[u8]| -> String {
                        match &encoding {
                            Some(enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_default(),
                            None => decode_text_simple(bytes),
                        }
                    };

                    let text = match op.operator.as_str() {
                        "TJ" => match operands.first() {
                            Some(Object::Array(arr)) => decode_tj_array(arr, decode),
                            _ => String::new(),
                        },
                        "\"" => match operands.get(2) {
                            Some(Object::String(bytes, _)) => decode(bytes),
                            _ => String::new(),
                        },
                        _ => match operands.first() {
                            Some(Object::String(bytes, _)) => decode(bytes),
                            _ => String::new(),
                        },
                    };

                    if !text.trim().is_empty() {
                        let rendering = text_matrix.multiply(&ctm);
                        let (x, y) = rendering.origin();
                        let effective_size = current_font_size * rendering.vertical_scale();
                        page.spans.push(TextSpan::new(
                            text,
                            x,
                            y,
                            effective_size,
                            current_font.clone(),
                        ));
                    }
                }
                "m" => {
                    if let Some((x, y)) = point_operand(operands, 0) {
                        path.move_to(ctm.apply(x, y));
                    }
                }
                "l" => {
                    if let Some((x, y)) = point_operand(operands, 0) {
                        path.line_to(ctm.apply(x, y));
                    }
                }
                "c" => {
                    if let Some((x, y)) = point_operand(operands, 4) {
                        path.jump_to(ctm.apply(x, y));
                    }
                }
                "v" | "y" => {
                    if let Some((x, y)) = point_operand(operands, 2) {
                        path.jump_to(ctm.apply(x, y));
                    }
                }
                "h" => path.close(),
                "re" => {
                    if operands.len() >= 4 {
                        let x = get_number(&operands[0]).unwrap_or(0.0);
                        let y = get_number(&operands[1]).unwrap_or(0.0);
                        let w = get_number(&operands[2]).unwrap_or(0.0);
                        let h = get_number(&operands[3]).unwrap_or(0.0);
                        path.move_to(ctm.apply(x, y));
                        path.line_to(ctm.apply(x + w, y));
                        path.line_to(ctm.apply(x + w, y + h));
                        path.line_to(ctm.apply(x, y + h));
                        path.close();
                    }
                }
                "s" | "b" | "b*" => {
                    path.close();
                    page.edges.extend(path.take_edges());
                }
                "S" | "f" | "F" | "f*" | "B" | "B*" => {
                    page.edges.extend(path.take_edges());
                }
                "n" => path.clear(),
                _ => {}
            }
        }

        Ok(())
    }
}

/// Decode the string elements of a TJ array.
///
/// Numbers indicate kerning/spacing adjustments in 1/1000 text space units;
/// large negative values (like -200 to -300) often indicate word spaces.
fn decode_tj_array(arr: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    let space_threshold = 200.0;
    let mut combined = String::new();

    for item in arr {
        let adjustment = match item {
            Object::String(bytes, _) => {
                combined.push_str(&decode(bytes));
                continue;
            }
            Object::Integer(n) => -(*n as f32),
            Object::Real(n) => -n,
            _ => continue,
        };

        if adjustment > space_threshold
            && !combined.ends_with(' ')
            && !combined.ends_with('\u{00A0}')
        {
            if let Some(c) = combined.chars().last() {
                if !is_spaceless_script_char(c) {
                    combined.push(' ');
                }
            }
        }
    }

    combined
}

/// Collects the segments of the current path until it is painted.
#[derive(Debug, Default)]
struct PathBuilder {
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    segments: Vec<((f32, f32), (f32, f32))>,
}

impl PathBuilder {
    fn move_to(&mut self, p: (f32, f32)) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: (f32, f32)) {
        if let Some(from) = self.current {
            self.segments.push((from, p));
        }
        self.current = Some(p);
    }

    /// Move without recording a segment (curves are never ruling lines).
    fn jump_to(&mut self, p: (f32, f32)) {
        self.current = Some(p);
    }

    fn close(&mut self) {
        if let (Some(from), Some(start)) = (self.current, self.subpath_start) {
            if from != start {
                self.segments.push((from, start));
            }
            self.current = Some(start);
        }
    }

    fn clear(&mut self) {
        self.current = None;
        self.subpath_start = None;
        self.segments.clear();
    }

    fn take_edges(&mut self) -> Vec<Edge> {
        let edges = self
            .segments
            .drain(..)
            .filter_map(|(from, to)| Edge::from_segment(from, to))
            .collect();
        self.current = None;
        self.subpath_start = None;
        edges
    }
}

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn origin(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    Some(Matrix::new(
        get_number(&operands[0]).unwrap_or(1.0),
        get_number(&operands[1]).unwrap_or(0.0),
        get_number(&operands[2]).unwrap_or(0.0),
        get_number(&operands[3]).unwrap_or(1.0),
        get_number(&operands[4]).unwrap_or(0.0),
        get_number(&operands[5]).unwrap_or(0.0),
    ))
}

fn point_operand(operands: &[Object], offset: usize) -> Option<(f32, f32)> {
    let x = get_number(operands.get(offset)?)?;
    let y = get_number(operands.get(offset + 1)?)?;
    Some((x, y))
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 10.0, "Helvetica".to_string())
    }

    #[test]
    fn test_span_width_estimate() {
        let s = span("abcd", 0.0, 0.0);
        assert!((s.width - 20.0).abs() < f32::EPSILON);
        assert!(s.top() > s.y && s.bottom() < s.y);
    }

    #[test]
    fn test_line_text_inserts_spaces_on_gaps() {
        let line = TextLine::from_spans(vec![span("World", 60.0, 100.0), span("Hello", 10.0, 100.0)]);
        assert_eq!(line.text(), "Hello World");
    }

    #[test]
    fn test_line_text_no_space_between_cjk() {
        let line = TextLine::from_spans(vec![span("漢", 10.0, 100.0), span("字", 40.0, 100.0)]);
        assert_eq!(line.text(), "漢字");
    }

    #[test]
    fn test_group_into_lines_top_down() {
        let lines = group_into_lines(vec![
            span("low", 10.0, 50.0),
            span("high-b", 80.0, 100.0),
            span("high-a", 10.0, 101.0),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].text, "high-a");
        assert_eq!(lines[1].text(), "low");
    }

    #[test]
    fn test_edge_classification() {
        let h = Edge::from_segment((10.0, 50.0), (100.0, 50.5)).unwrap();
        assert_eq!(h.orientation, Orientation::Horizontal);
        assert!((h.length() - 90.0).abs() < 0.01);

        let v = Edge::from_segment((20.0, 80.0), (20.0, 10.0)).unwrap();
        assert_eq!(v.orientation, Orientation::Vertical);
        assert_eq!(v.start, 10.0);
        assert_eq!(v.end, 80.0);

        assert!(Edge::from_segment((0.0, 0.0), (30.0, 40.0)).is_none());
        assert!(Edge::from_segment((5.0, 5.0), (5.0, 5.0)).is_none());
    }

    #[test]
    fn test_path_builder_rectangle() {
        let mut path = PathBuilder::default();
        path.move_to((0.0, 0.0));
        path.line_to((50.0, 0.0));
        path.line_to((50.0, 20.0));
        path.line_to((0.0, 20.0));
        path.close();
        let edges = path.take_edges();
        assert_eq!(edges.len(), 4);
        assert_eq!(
            edges
                .iter()
                .filter(|e| e.orientation == Orientation::Horizontal)
                .count(),
            2
        );
    }

    #[test]
    fn test_matrix_multiply_translation_then_scale() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let m = Matrix::translation(10.0, 5.0).multiply(&scale);
        assert_eq!(m.origin(), (20.0, 10.0));
        assert_eq!(m.apply(1.0, 1.0), (22.0, 12.0));
        assert!((m.vertical_scale() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decode_tj_array_word_space() {
        let arr = vec![
            Object::string_literal("Net"),
            Object::Integer(-250),
            Object::string_literal("Sales"),
            Object::Integer(-20),
            Object::string_literal("!"),
        ];
        let text = decode_tj_array(&arr, decode_text_simple);
        assert_eq!(text, "Net Sales!");
    }

    #[test]
    fn test_decode_text_simple_utf16() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42];
        assert_eq!(decode_text_simple(&bytes), "AB");
        assert_eq!(decode_text_simple(&[0xE9]), "é");
    }
}
