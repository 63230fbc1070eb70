/*!
 * Tests for the xlsx and pptx codecs
 */

use anyhow::Result;
use std::fs;

use office_translator::codec::package::Package;
use office_translator::codec::{DocumentCodec, OoxmlCodec};
use office_translator::document::{
    Alignment, Border, BorderSide, CellFormat, CellValue, Color, ColumnLayout, Document, Fill, Font,
    Presentation, Shape, ShapeContent, Slide, TableRow,
};
use office_translator::errors::CodecError;

use crate::common;

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
            vertical: Some("top".to_string()),
            wrap_text: Some(true),
        },
        fill: Some(Fill {
            pattern: "solid".to_string(),
            fg_color: Some(Color::Rgb("FFFFFF00".to_string())),
            bg_color: None,
        }),
        border: Some(Border {
            left: BorderSide {
                style: Some("thin".to_string()),
                color: None,
            },
            right: BorderSide {
                style: Some("thin".to_string()),
                color: None,
            },
            top: BorderSide::default(),
            bottom: BorderSide {
                style: Some("medium".to_string()),
                color: Some(Color::Rgb("FF7F7F7F".to_string())),
            },
        }),
        number_format: None,
    }
}

/// The fixture's first cell format, used by every cell without a style
fn calibri_format() -> CellFormat {
    CellFormat {
        font: Font {
            name: Some("Calibri".to_string()),
            size: Some(11.0),
            ..Font::default()
        },
        ..CellFormat::default()
    }
}

fn value(workbook: &office_translator::document::Workbook, sheet: &str, row: usize, column: usize) -> CellValue {
    workbook
        .sheet(sheet)
        .and_then(|s| s.cell(row, column))
        .map(|c| c.value.clone())
        .unwrap_or_default()
}

#[test]
fn test_read_workbook_withSampleFile_shouldDecodeValuesAndExtents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;

    let workbook = common::read_workbook(&path)?;

    let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Summary", "Notes"]);
    assert_eq!(workbook.sheets[0].extent(), (4, 4));
    assert_eq!(workbook.sheets[1].extent(), (2, 2));

    assert_eq!(value(&workbook, "Summary", 1, 1), CellValue::Text("Quarterly report".to_string()));
    assert_eq!(value(&workbook, "Summary", 1, 2), CellValue::Number(0.25));
    assert_eq!(value(&workbook, "Summary", 1, 3), CellValue::Number(1.25));
    assert_eq!(value(&workbook, "Summary", 2, 1), CellValue::Text("   ".to_string()));
    assert_eq!(value(&workbook, "Summary", 2, 2), CellValue::Text("Inline note".to_string()));
    assert_eq!(value(&workbook, "Summary", 3, 2), CellValue::Empty);
    assert_eq!(value(&workbook, "Summary", 4, 1), CellValue::Bool(true));
    assert_eq!(value(&workbook, "Summary", 4, 3), CellValue::Error("#DIV/0!".to_string()));
    assert_eq!(value(&workbook, "Summary", 4, 4), CellValue::Text("Total".to_string()));
    assert_eq!(value(&workbook, "Notes", 1, 1), CellValue::Text("Hello, world".to_string()));
    assert_eq!(value(&workbook, "Notes", 2, 2), CellValue::Number(7.0));
    assert_eq!(value(&workbook, "Notes", 1, 2), CellValue::Empty);
    Ok(())
}

#[test]
fn test_read_workbook_withStyledCells_shouldResolveFormats() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;

    let workbook = common::read_workbook(&path)?;
    let summary = &workbook.sheets[0];

    assert_eq!(summary.cell(1, 1).map(|c| &c.format), Some(&header_format()));
    assert_eq!(summary.cell(4, 4).map(|c| &c.format), Some(&header_format()));

    let percent = summary.cell(1, 2).map(|c| c.format.clone()).unwrap_or_default();
    assert_eq!(percent.number_format.as_deref(), Some("0.000%"));
    assert_eq!(percent.font.name.as_deref(), Some("Calibri"));
    assert_eq!(percent.fill, None);
    assert_eq!(percent.border, None);

    assert_eq!(summary.cell(2, 2).map(|c| &c.format), Some(&calibri_format()));
    assert_eq!(summary.cell(3, 3).map(|c| &c.format), Some(&calibri_format()));
    assert_eq!(summary.default_format(), &calibri_format());
    Ok(())
}

#[test]
fn test_read_workbook_withCustomDefaultFont_shouldApplyItToUnstyledCellsAndGaps() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("arial.xlsx");
    common::WorkbookFixture {
        sheets: vec![(
            "Sheet1",
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2"><c r="C2"><v>5</v></c></row>"#.to_string(),
        )],
        shared_strings: vec!["Hello"],
        columns: None,
        styles: Some(common::ARIAL_DEFAULT_STYLES),
    }
    .write(&path)?;

    let workbook = common::read_workbook(&path)?;
    let sheet = &workbook.sheets[0];

    for (row, column) in [(1, 1), (2, 3), (1, 2), (2, 1)] {
        let font = sheet.cell(row, column).map(|c| c.format.font.clone()).unwrap_or_default();
        assert_eq!(font.name.as_deref(), Some("Arial"), "font of {}:{}", row, column);
        assert_eq!(font.size, Some(10.0), "size of {}:{}", row, column);
    }
    Ok(())
}

#[test]
fn test_read_workbook_withSparseFarCells_shouldStoreOnlyPopulatedCells() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("sparse.xlsx");
    common::WorkbookFixture {
        sheets: vec![(
            "Sparse",
            concat!(
                r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="XFD1"><v>42</v></c></row>"#,
                r#"<row r="2000"><c r="A2000" t="s"><v>1</v></c></row>"#
            )
            .to_string(),
        )],
        shared_strings: vec!["Top left", "Far down"],
        columns: None,
        styles: None,
    }
    .write(&path)?;
    let copy = temp_dir.path().join("sparse-copy.xlsx");
    let codec = OoxmlCodec::new();

    let workbook = common::read_workbook(&path)?;
    let sheet = &workbook.sheets[0];
    assert_eq!(sheet.extent(), (2000, 16_384));
    assert_eq!(sheet.populated_len(), 3);
    assert_eq!(value(&workbook, "Sparse", 1, 16_384), CellValue::Number(42.0));
    assert_eq!(value(&workbook, "Sparse", 2000, 1), CellValue::Text("Far down".to_string()));
    assert_eq!(value(&workbook, "Sparse", 1000, 8000), CellValue::Empty);

    codec.save(&Document::Workbook(workbook.clone()), &copy)?;
    let reopened = common::read_workbook(&copy)?;
    let populated = |workbook: &office_translator::document::Workbook| -> Vec<(usize, usize, CellValue)> {
        workbook.sheets[0]
            .populated_cells()
            .map(|(row, column, cell)| (row, column, cell.value.clone()))
            .collect()
    };
    assert_eq!(reopened.sheets[0].extent(), (2000, 16_384));
    assert_eq!(populated(&reopened), populated(&workbook));
    Ok(())
}

#[test]
fn test_read_workbook_withColumnLayout_shouldKeepWidthsAndVisibility() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;

    let workbook = common::read_workbook(&path)?;

    assert_eq!(
        workbook.sheets[0].columns,
        vec![
            ColumnLayout {
                min: 1,
                max: 1,
                width: Some(30.7109375),
                custom_width: true,
                ..ColumnLayout::default()
            },
            ColumnLayout {
                min: 2,
                max: 3,
                width: Some(12.7109375),
                hidden: true,
                custom_width: true,
                ..ColumnLayout::default()
            },
        ]
    );
    assert!(workbook.sheets[1].columns.is_empty());
    Ok(())
}

#[test]
fn test_save_workbook_thenReopen_shouldProduceEqualWorkbook() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let copy = temp_dir.path().join("copy.xlsx");
    let codec = OoxmlCodec::new();

    let source = codec.open(&path)?;
    codec.save(&source, &copy)?;
    let reopened = codec.open(&copy)?;

    let (Document::Workbook(source), Document::Workbook(reopened)) = (source, reopened) else {
        panic!("expected workbooks");
    };
    assert_eq!(reopened, source);
    Ok(())
}

#[test]
fn test_save_workbook_withExistingTarget_shouldReplaceIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let target = common::create_test_file(temp_dir.path(), "report-es.xlsx", b"stale")?;
    let codec = OoxmlCodec::new();

    let source = codec.open(&path)?;
    codec.save(&source, &target)?;

    assert!(common::read_workbook(&target).is_ok());
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().ends_with(".xlsx"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind: {:?}", leftovers);
    Ok(())
}

#[test]
fn test_read_presentation_withSampleFile_shouldBuildShapeTrees() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_presentation(temp_dir.path(), "deck.pptx")?;

    let presentation = common::read_presentation(&path)?;

    assert_eq!(presentation.slides.len(), 3);
    assert_eq!(
        presentation.slides[0].shapes,
        vec![
            Shape::text_box(2, "Annual results"),
            Shape::group(
                3,
                vec![
                    Shape::text_box(4, "Revenue"),
                    Shape::group(5, vec![Shape::text_box(6, "Deep note")]),
                ]
            ),
            Shape::picture(7),
        ]
    );
    assert_eq!(
        presentation.slides[1].shapes,
        vec![
            Shape::table(8, vec![TableRow::new(["Region", "Sales"]), TableRow::new(["North", ""])]),
            Shape::text_box(9, "First point\nSecond point"),
        ]
    );
    assert_eq!(presentation.slides[2].shapes, vec![Shape::picture(10)]);
    assert_eq!(
        presentation.slides[2].part_name.as_deref(),
        Some("ppt/slides/slide3.xml")
    );
    Ok(())
}

#[test]
fn test_save_presentation_withUnchangedText_shouldKeepSlidePartsVerbatim() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_presentation(temp_dir.path(), "deck.pptx")?;
    let copy = temp_dir.path().join("copy.pptx");
    let codec = OoxmlCodec::new();

    let source = codec.open(&path)?;
    codec.save(&source, &copy)?;

    for part in ["ppt/slides/slide1.xml", "ppt/slides/slide2.xml", "ppt/presentation.xml"] {
        assert_eq!(common::read_part(&copy, part)?, common::read_part(&path, part)?, "{}", part);
    }
    Ok(())
}

#[test]
fn test_save_presentation_withTranslatedText_shouldRewriteTextAndKeepFormatting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_presentation(temp_dir.path(), "deck.pptx")?;
    let output = temp_dir.path().join("deck-fr.pptx");

    let mut presentation = common::read_presentation(&path)?;
    presentation.slides[0].shapes[0].text = Some("Résultats annuels".to_string());
    if let ShapeContent::Table(rows) = &mut presentation.slides[1].shapes[0].content {
        rows[1].cells[0].text = "Nord".to_string();
    }
    presentation.slides[1].shapes[1].text = Some("Premier point\nDeuxième point".to_string());
    OoxmlCodec::new().save(&Document::Presentation(presentation.clone()), &output)?;

    let reopened = common::read_presentation(&output)?;
    assert_eq!(reopened.slides, presentation.slides);

    let slide1 = common::read_part(&output, "ppt/slides/slide1.xml")?;
    assert!(slide1.contains("Résultats annuels"));
    assert!(slide1.contains(r#"algn="ctr""#));
    assert!(slide1.contains(r#"sz="2400""#));
    assert!(slide1.contains(r#"r:embed="rIdImage""#));

    let slide2 = common::read_part(&output, "ppt/slides/slide2.xml")?;
    assert!(slide2.contains("Nord"));
    assert!(slide2.contains(r#"i="1""#));
    assert!(slide2.contains(r#"firstRow="1""#));

    assert_eq!(
        common::read_part(&output, "ppt/slides/slide3.xml")?,
        common::read_part(&path, "ppt/slides/slide3.xml")?
    );
    assert_eq!(
        common::read_part(&output, "ppt/media/image1.png")?,
        "not really a png"
    );
    Ok(())
}

#[test]
fn test_save_presentation_withChangedShapeTree_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_presentation(temp_dir.path(), "deck.pptx")?;

    let mut presentation = common::read_presentation(&path)?;
    presentation.slides[0].shapes.push(Shape::text_box(99, "Extra"));
    let result = OoxmlCodec::new().save(&Document::Presentation(presentation), &temp_dir.path().join("out.pptx"));

    assert!(matches!(result, Err(CodecError::Malformed(_))));
    Ok(())
}

#[test]
fn test_save_presentation_withoutSourcePackage_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let presentation = Presentation::new(vec![Slide::new(vec![Shape::text_box(1, "Hi")])]);

    let result = OoxmlCodec::new().save(&Document::Presentation(presentation), &temp_dir.path().join("new.pptx"));

    assert!(matches!(result, Err(CodecError::Malformed(_))));
    Ok(())
}

#[test]
fn test_open_withNonZipFile_shouldReturnZipError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.xlsx", b"this is not a zip archive")?;

    let result = OoxmlCodec::new().open(&path);

    assert!(matches!(result, Err(CodecError::Zip(_))));
    Ok(())
}

#[test]
fn test_open_withoutMainPart_shouldReportMissingPart() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("empty.pptx");
    common::write_package(&path, &[("docProps/app.xml".to_string(), "<Properties/>".to_string())])?;

    let result = OoxmlCodec::new().open(&path);

    assert!(matches!(result, Err(CodecError::MissingPart(_))));
    Ok(())
}

#[test]
fn test_open_withMalformedSlideXml_shouldReportXmlError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("bad.pptx");
    common::write_presentation(&path, &[vec![common::text_shape(2, "Fine")]])?;

    let mut package = Package::open(&path)?;
    package.insert("ppt/slides/slide1.xml", b"<p:sld><p:cSld>".to_vec());
    package.save(&path, &Default::default())?;

    let result = OoxmlCodec::new().open(&path);

    assert!(matches!(result, Err(CodecError::Xml { .. })));
    Ok(())
}

#[test]
fn test_package_withEscapingEntryName_shouldBeRejected() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("evil.xlsx");
    common::write_package(
        &path,
        &[
            ("[Content_Types].xml".to_string(), "<Types/>".to_string()),
            ("../outside.xml".to_string(), "<x/>".to_string()),
        ],
    )?;

    let result = Package::open(&path);

    assert!(matches!(result, Err(CodecError::Malformed(_))));
    Ok(())
}

#[test]
fn test_write_workbook_withOverlongSheetName_shouldFailWithSpreadsheetError() {
    let workbook = office_translator::document::Workbook {
        sheets: vec![office_translator::document::Sheet::new("x".repeat(40))],
    };

    let result = office_translator::codec::xlsx::write_workbook(&workbook);

    assert!(matches!(result, Err(CodecError::Spreadsheet(_))));
}
