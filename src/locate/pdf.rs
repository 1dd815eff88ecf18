//! PDF table locator using lopdf.

use std::path::Path;

use lopdf::Document as LopdfDocument;

use crate::detect::{detect_pdf_version, detect_pdf_version_from_path};
use crate::error::{Error, Result};
use crate::model::{DocumentKind, RawTable};
use crate::options::{ErrorMode, ExtractOptions, PdfStrategy};

use super::lattice::{LatticeConfig, LatticeDetector};
use super::layout::{PageAnalyzer, PageContent};
use super::table_detector::{TableDetector, TableDetectorConfig};
use super::TableLocator;

/// Locates tables on every page of a PDF.
///
/// Each table's locator id is the 1-based page it was found on, so tables
/// from the same page share an id.
#[derive(Debug, Clone, Default)]
pub struct PdfLocator {
    strategy: PdfStrategy,
    error_mode: ErrorMode,
    stream: TableDetectorConfig,
    lattice: LatticeConfig,
}

impl PdfLocator {
    /// Create a locator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a locator configured from batch options.
    pub fn from_options(options: &ExtractOptions) -> Self {
        Self {
            strategy: options.pdf_strategy,
            error_mode: options.error_mode,
            stream: options.stream.clone(),
            lattice: options.lattice.clone(),
        }
    }

    /// Set the detection strategy.
    pub fn with_strategy(mut self, strategy: PdfStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    fn load(data: &[u8]) -> Result<LopdfDocument> {
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;

        if doc.is_encrypted() {
            log::warn!("Document is encrypted; pages that cannot be decoded are skipped");
        }

        Ok(doc)
    }

    /// Locate tables in a loaded document, page by page.
    fn locate_document(&self, doc: &LopdfDocument) -> Result<Vec<RawTable>> {
        let analyzer = PageAnalyzer::new(doc);
        let pages = doc.get_pages();
        log::debug!("PdfLocator: {} pages", pages.len());

        let mut tables = Vec::new();
        for (&page_num, &page_id) in &pages {
            match analyzer.analyze_page(page_id) {
                Ok(content) => {
                    let found = self.tables_in_page(&content, page_num);
                    log::debug!("PdfLocator: page {} has {} tables", page_num, found.len());
                    tables.extend(found);
                }
                Err(e) => {
                    if self.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Failed to analyze page {}: {}", page_num, e);
                }
            }
        }

        Ok(tables)
    }

    /// Run the configured strategy over one page's content.
    ///
    /// In auto mode, text alignment is only consulted when the page has no
    /// ruled table.
    pub fn tables_in_page(&self, content: &PageContent, page_num: u32) -> Vec<RawTable> {
        if self.strategy.uses_lines() {
            let ruled = LatticeDetector::with_config(self.lattice.clone()).detect(content, page_num);
            if !ruled.is_empty() || !self.strategy.uses_text() {
                return ruled;
            }
        }

        let detector = TableDetector::with_config(self.stream.clone());
        detector
            .detect(&content.spans)
            .iter()
            .map(|table| detector.to_raw_table(table, page_num))
            .collect()
    }
}

impl TableLocator for PdfLocator {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn name(&self) -> &str {
        "PDF"
    }

    fn locate(&self, path: &Path) -> Result<Vec<RawTable>> {
        detect_pdf_version_from_path(path)?;
        let data = std::fs::read(path)?;
        let doc = Self::load(&data)?;
        self.locate_document(&doc)
    }

    fn locate_bytes(&self, data: &[u8]) -> Result<Vec<RawTable>> {
        detect_pdf_version(data)?;
        let doc = Self::load(data)?;
        self.locate_document(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn text(x: i64, y: i64, s: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(s)]),
            Operation::new("ET", vec![]),
        ]
    }

    fn line(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<Operation> {
        vec![
            Operation::new("m", vec![x0.into(), y0.into()]),
            Operation::new("l", vec![x1.into(), y1.into()]),
            Operation::new("S", vec![]),
        ]
    }

    fn build_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("save pdf");
        out
    }

    fn ruled_table_page() -> Vec<Operation> {
        let mut ops = Vec::new();
        for y in [700, 680, 660] {
            ops.extend(line(100, y, 300, y));
        }
        for x in [100, 200, 300] {
            ops.extend(line(x, 660, x, 700));
        }
        ops.extend(text(110, 685, "Name"));
        ops.extend(text(210, 685, "Score"));
        ops.extend(text(110, 665, "Ada"));
        ops.extend(text(210, 665, "91"));
        ops
    }

    #[test]
    fn test_not_a_pdf() {
        let result = PdfLocator::new().locate_bytes(b"<html></html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_truncated_pdf_fails() {
        let result = PdfLocator::new().locate_bytes(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(result.is_err());
    }

    #[test]
    fn test_page_without_tables() {
        let pdf = build_pdf(vec![text(72, 700, "Just a paragraph of prose.")]);
        let tables = PdfLocator::new().locate_bytes(&pdf).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_ruled_table_tagged_with_page() {
        let pdf = build_pdf(vec![
            text(72, 700, "Introduction"),
            ruled_table_page(),
        ]);

        let tables = PdfLocator::new().locate_bytes(&pdf).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].locator_id, 2);
        assert_eq!(
            tables[0].rows,
            vec![
                vec![Cell::text("Name"), Cell::text("Score")],
                vec![Cell::text("Ada"), Cell::text("91")],
            ]
        );
    }

    #[test]
    fn test_analyze_page_by_object_id() {
        let pdf = build_pdf(vec![text(72, 700, "Cover"), ruled_table_page()]);
        let doc = LopdfDocument::load_mem(&pdf).unwrap();
        let analyzer = PageAnalyzer::new(&doc);

        let page_id = *doc.get_pages().get(&2).unwrap();
        let by_id = analyzer.analyze_page(page_id).unwrap();
        let by_number = analyzer.extract_page(2).unwrap();
        assert_eq!(by_id.edges, by_number.edges);
        assert_eq!(by_id.spans.len(), 4);
        assert!(matches!(
            analyzer.extract_page(3),
            Err(Error::PageOutOfRange(3, 2))
        ));
    }

    #[test]
    fn test_ruled_table_inside_form_xobject() {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let form_content = Content {
            operations: ruled_table_page(),
        };
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), (-100).into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            },
            form_content.encode().unwrap(),
        ));
        let page_content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 0.into()]),
                Operation::new("Do", vec![Object::Name(b"Fm1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let content = PageAnalyzer::new(&doc).analyze_page(page_id).unwrap();
        let name = content.spans.iter().find(|s| s.text == "Name").unwrap();
        assert_eq!((name.x, name.y), (160.0, 585.0));

        let tables = PdfLocator::new().tables_in_page(&content, 1);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec![Cell::text("Name"), Cell::text("Score")],
                vec![Cell::text("Ada"), Cell::text("91")],
            ]
        );
    }

    #[test]
    fn test_lines_strategy_needs_closed_grid() {
        let mut ops = Vec::new();
        for (i, y) in [700, 680].iter().enumerate() {
            ops.extend(line(100, *y, 300, *y));
            ops.extend(text(100, y - 15, &format!("k{}", i)));
        }
        let pdf = build_pdf(vec![ops]);

        let locator = PdfLocator::new().with_strategy(PdfStrategy::Lines);
        assert!(locator.locate_bytes(&pdf).unwrap().is_empty());
    }

    #[test]
    fn test_stream_fallback_finds_unruled_table() {
        let mut ops = Vec::new();
        for (i, y) in [700, 685, 670].iter().enumerate() {
            ops.extend(text(72, *y, &format!("row{}", i)));
            ops.extend(text(250, *y, &format!("{}", i * 10)));
        }
        let pdf = build_pdf(vec![ops]);

        let auto = PdfLocator::new().with_strategy(PdfStrategy::Auto);
        let tables = auto.locate_bytes(&pdf).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[2], vec![Cell::text("row2"), Cell::text("20")]);

        // Default detection only reports ruled tables
        assert!(PdfLocator::new().locate_bytes(&pdf).unwrap().is_empty());
    }
}
