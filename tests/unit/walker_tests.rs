/*!
 * Tests for the spreadsheet and presentation walkers
 */

use std::sync::Arc;

use parking_lot::Mutex;

use office_translator::document::{
    Alignment, Border, BorderSide, Cell, CellFormat, CellValue, Color, ColumnLayout, Fill, Font, Presentation, Shape,
    ShapeContent, Sheet, Slide, TableRow, Workbook,
};
use office_translator::providers::mock::MockBackend;
use office_translator::translation::{
    DocumentWalker, PresentationWalker, ProgressCallback, SpreadsheetWalker, TranslationOptions, Translator,
};

fn header_format() -> CellFormat {
    CellFormat {
        font: Font {
            name: Some("Arial".to_string()),
            size: Some(14.0),
            bold: Some(true),
            italic: None,
            color: Some(Color::Rgb("FFFF0000".to_string())),
        },
        alignment: Alignment {
            horizontal: Some("center".to_string()),
            vertical: None,
            wrap_text: Some(true),
        },
        fill: Some(Fill {
            pattern: "solid".to_string(),
            fg_color: Some(Color::Theme { index: 4, tint: Some(0.4) }),
            bg_color: None,
        }),
        border: Some(Border {
            bottom: BorderSide {
                style: Some("thin".to_string()),
                color: None,
            },
            ..Border::default()
        }),
        number_format: None,
    }
}

fn sample_workbook() -> Workbook {
    let mut summary = Sheet::with_extent("Summary", 5, 4);
    summary.columns = vec![ColumnLayout {
        min: 1,
        max: 2,
        width: Some(25.0),
        custom_width: true,
        ..ColumnLayout::default()
    }];
    *summary.cell_mut(1, 1) = Cell::text("Name").with_format(header_format());
    *summary.cell_mut(1, 2) = Cell::text("Amount").with_format(header_format());
    *summary.cell_mut(2, 1) = Cell::text("Coffee");
    *summary.cell_mut(2, 2) = Cell::new(CellValue::Number(3.5)).with_format(CellFormat {
        number_format: Some("0.00".to_string()),
        ..CellFormat::default()
    });
    *summary.cell_mut(3, 1) = Cell::text("   ");
    *summary.cell_mut(3, 3) = Cell::new(CellValue::Bool(false));
    *summary.cell_mut(5, 4) = Cell::text("Footer");

    let mut notes = Sheet::new("Notes");
    *notes.cell_mut(2, 2) = Cell::text("Remember the milk");
    *notes.cell_mut(3, 1) = Cell::new(CellValue::Error("#N/A".to_string()));

    Workbook {
        sheets: vec![summary, Sheet::new("Empty"), notes],
    }
}

fn translator(backend: &MockBackend, concurrent_requests: usize) -> Translator {
    Translator::new(Arc::new(backend.clone()), "en", "fr").with_options(TranslationOptions {
        concurrent_requests,
        ..TranslationOptions::default()
    })
}

#[tokio::test]
async fn test_spreadsheet_walk_withMixedCells_shouldPreserveStructureAndFormat() {
    let source = sample_workbook();
    let backend = MockBackend::working();

    let output = SpreadsheetWalker::new(translator(&backend, 1)).walk(&source).await;

    assert_eq!(output.sheets.len(), source.sheets.len());
    for (translated, original) in output.sheets.iter().zip(&source.sheets) {
        assert_eq!(translated.name, original.name);
        assert_eq!(translated.extent(), original.extent());
        assert_eq!(translated.columns, original.columns);
        for ((_, _, out_cell), (_, _, src_cell)) in translated.cells().zip(original.cells()) {
            assert_eq!(out_cell.format, src_cell.format);
            match src_cell.value.translatable_text() {
                Some(text) => assert_eq!(
                    out_cell.value,
                    CellValue::Text(MockBackend::expected_translation(text, "fr"))
                ),
                None => assert_eq!(out_cell.value, src_cell.value),
            }
        }
    }
}

#[tokio::test]
async fn test_spreadsheet_walk_withBlankAndNonText_shouldOnlySendTextCells() {
    let source = sample_workbook();
    let backend = MockBackend::working();

    SpreadsheetWalker::new(translator(&backend, 1)).walk(&source).await;

    let texts: Vec<String> = backend.requests().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["Name", "Amount", "Coffee", "Footer", "Remember the milk"]);
}

#[tokio::test]
async fn test_spreadsheet_walk_withFailingBackend_shouldReproduceSource() {
    let source = sample_workbook();
    let backend = MockBackend::failing();

    let output = SpreadsheetWalker::new(translator(&backend, 2)).walk(&source).await;

    assert_eq!(output, source);
}

#[tokio::test]
async fn test_spreadsheet_walk_withConcurrency_shouldMatchSequentialOutput() {
    let source = sample_workbook();

    let sequential_backend = MockBackend::working();
    let sequential = SpreadsheetWalker::new(translator(&sequential_backend, 1)).walk(&source).await;

    // Earlier requests finish later, so completion order differs from request order
    let concurrent_backend = MockBackend::staggered(40);
    let concurrent = SpreadsheetWalker::new(translator(&concurrent_backend, 4)).walk(&source).await;

    assert_eq!(concurrent, sequential);
}

#[tokio::test]
async fn test_spreadsheet_walk_withGapFormats_shouldCopyDefaultAndRowFormats() {
    let arial = CellFormat {
        font: Font {
            name: Some("Arial".to_string()),
            size: Some(10.0),
            ..Font::default()
        },
        ..CellFormat::default()
    };
    let mut sheet = Sheet::with_extent("Sparse", 3, 2);
    sheet.set_default_format(arial.clone());
    sheet.set_row_format(2, header_format());
    *sheet.cell_mut(1, 1) = Cell::text("Hello").with_format(arial.clone());
    let source = Workbook { sheets: vec![sheet] };
    let backend = MockBackend::working();

    let output = SpreadsheetWalker::new(translator(&backend, 1)).walk(&source).await;
    let translated = &output.sheets[0];

    assert_eq!(translated.default_format(), &arial);
    assert_eq!(translated.row_format(2), Some(&header_format()));
    assert_eq!(translated.cell(3, 2).map(|c| &c.format), Some(&arial));
    assert_eq!(translated.cell(2, 1).map(|c| &c.format), Some(&header_format()));
    assert_eq!(translated.populated_len(), 1);
}

#[tokio::test]
async fn test_spreadsheet_walk_withProgress_shouldReportEverySheet() {
    let source = sample_workbook();
    let backend = MockBackend::working();
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let progress: ProgressCallback = Arc::new(move |done: usize, total: usize| sink.lock().push((done, total)));

    SpreadsheetWalker::new(translator(&backend, 1))
        .with_progress(progress)
        .walk(&source)
        .await;

    assert_eq!(*reports.lock(), vec![(1, 3), (2, 3), (3, 3)]);
}

fn nested_group(depth: u32, leaf_text: &str) -> Shape {
    let mut shape = Shape::text_box(100 + depth, leaf_text);
    for level in 0..depth {
        shape = Shape::group(200 + level, vec![shape]);
    }
    shape
}

fn sample_presentation() -> Presentation {
    let mut titled_table = Shape::table(
        5,
        vec![TableRow::new(["Region", "Sales"]), TableRow::new(["North", " "])],
    );
    titled_table.text = Some("Table caption".to_string());

    Presentation::new(vec![
        Slide::new(vec![
            Shape::text_box(1, "Welcome"),
            Shape::group(2, vec![Shape::text_box(3, "Inside"), Shape::picture(4), Shape::text_box(6, "")]),
            nested_group(12, "Deepest"),
        ]),
        Slide::new(vec![titled_table, Shape::picture(7)]),
        Slide::new(Vec::new()),
    ])
}

fn leaf_texts(shape: &Shape, texts: &mut Vec<String>) {
    if let Some(text) = shape.text.as_ref().filter(|t| !t.trim().is_empty()) {
        texts.push(text.clone());
    }
    match &shape.content {
        ShapeContent::Group(children) => children.iter().for_each(|child| leaf_texts(child, texts)),
        ShapeContent::Table(rows) => {
            for cell in rows.iter().flat_map(|row| &row.cells) {
                if !cell.text.trim().is_empty() {
                    texts.push(cell.text.clone());
                }
            }
        }
        _ => {}
    }
}

#[tokio::test]
async fn test_presentation_walk_withGroupsAndTables_shouldTranslateEveryLeaf() {
    let source = sample_presentation();
    let backend = MockBackend::working();

    let output = PresentationWalker::new(translator(&backend, 1)).walk(&source).await;

    let mut expected = Vec::new();
    for shape in source.slides.iter().flat_map(|s| &s.shapes) {
        leaf_texts(shape, &mut expected);
    }
    assert_eq!(
        expected,
        vec!["Welcome", "Inside", "Deepest", "Table caption", "Region", "Sales", "North"]
    );
    assert_eq!(backend.call_count(), expected.len());

    let mut translated = Vec::new();
    for shape in output.slides.iter().flat_map(|s| &s.shapes) {
        leaf_texts(shape, &mut translated);
    }
    let expected_translations: Vec<String> = expected
        .iter()
        .map(|text| MockBackend::expected_translation(text, "fr"))
        .collect();
    assert_eq!(translated, expected_translations);
}

#[tokio::test]
async fn test_presentation_walk_withDeepGroup_shouldKeepStructure() {
    let source = sample_presentation();
    let backend = MockBackend::working();

    let output = PresentationWalker::new(translator(&backend, 3)).walk(&source).await;

    assert_eq!(output.slides.len(), 3);
    assert_eq!(output.slides[0].shapes[2].depth(), 13);
    assert_eq!(output.slides[0].shapes[1].shapes_ids(), source.slides[0].shapes[1].shapes_ids());
    assert_eq!(output.slides[1].shapes[1], source.slides[1].shapes[1]);
    assert!(output.slides[2].shapes.is_empty());

    // Blank leaves are left exactly as they were
    let ShapeContent::Group(children) = &output.slides[0].shapes[1].content else {
        panic!("expected a group");
    };
    assert_eq!(children[2].text.as_deref(), Some(""));
    let ShapeContent::Table(rows) = &output.slides[1].shapes[0].content else {
        panic!("expected a table");
    };
    assert_eq!(rows[1].cells[1].text, " ");
}

#[tokio::test]
async fn test_presentation_walk_withFailingBackend_shouldReproduceSource() {
    let source = sample_presentation();
    let backend = MockBackend::failing();

    let output = PresentationWalker::new(translator(&backend, 1)).walk(&source).await;

    assert_eq!(output, source);
}

/// Shape ids of a shape and its descendants in visit order
trait ShapeIds {
    fn shapes_ids(&self) -> Vec<u32>;
}

impl ShapeIds for Shape {
    fn shapes_ids(&self) -> Vec<u32> {
        let mut ids = vec![self.id];
        if let ShapeContent::Group(children) = &self.content {
            ids.extend(children.iter().flat_map(|child| child.shapes_ids()));
        }
        ids
    }
}
