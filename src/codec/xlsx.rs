/*!
 * `.xlsx` reader and writer.
 *
 * Cell values come from calamine, streamed cell by cell so that a sparse
 * sheet never expands into a dense range. Calamine does not expose styles
 * or column layout, so each worksheet part is also scanned with quick-xml
 * for `<col>` entries, the `s` attribute of every `<c>` and the format of
 * rows marked `customFormat`.
 *
 * Reading follows cached values only: a formula cell yields the value Excel
 * last computed and the formula itself is not carried over. Writing builds a
 * fresh workbook with rust_xlsxwriter.
 */

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{DataRef, Reader as _, Xlsx};
use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_xlsxwriter::{ColNum, ExcelDateTime, Format, Formula, RowNum, Worksheet};

use super::package::{self, Package};
use super::styles::{StyleSheet, writer_default_format, writer_format};
use crate::document::workbook::parse_cell_reference;
use crate::document::{Cell, CellFormat, CellValue, ColumnLayout, Sheet, Workbook};
use crate::errors::CodecError;

/// Most cells a workbook may hold, counting every `<c>` element
pub const MAX_POPULATED_CELLS: usize = 1_000_000;

/// Pixel width of the widest digit in the default font
const DIGIT_WIDTH_PX: f64 = 7.0;

/// Pixel padding Excel adds around a column's text
const COLUMN_PADDING_PX: f64 = 5.0;

/// Layout and style references of a worksheet part
#[derive(Debug, Default)]
struct SheetLayout {
    columns: Vec<ColumnLayout>,
    cell_styles: BTreeMap<(usize, usize), usize>,
    row_styles: BTreeMap<usize, usize>,
    extent: (usize, usize),
}

fn xml_error(part: &str, message: impl Into<String>) -> CodecError {
    CodecError::Xml {
        part: part.to_string(),
        message: message.into(),
    }
}

/// Attributes of a start tag keyed by local name
fn attributes(start: &BytesStart<'_>, part: &str) -> Result<HashMap<String, String>, CodecError> {
    let mut map = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(part, e.to_string()))?;
        let value = attr.unescape_value().map_err(|e| xml_error(part, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        map.insert(key, value.into_owned());
    }
    Ok(map)
}

fn flag(attrs: &HashMap<String, String>, key: &str) -> bool {
    matches!(attrs.get(key).map(String::as_str), Some("1" | "true"))
}

fn number<T: std::str::FromStr>(attrs: &HashMap<String, String>, key: &str) -> Option<T> {
    attrs.get(key).and_then(|value| value.trim().parse().ok())
}

/// Width as Excel renders it: a whole number of pixels, stored in 1/256 units
fn pixel_width(width: f64) -> f64 {
    let pixels = (width * DIGIT_WIDTH_PX).round().max(0.0);
    (pixels * 256.0 / DIGIT_WIDTH_PX).floor() / 256.0
}

/// Width to hand the writer so that it stores `width` again
fn writer_column_width(width: f64) -> f64 {
    let pixels = (width * DIGIT_WIDTH_PX).round().max(0.0);
    if pixels < DIGIT_WIDTH_PX + COLUMN_PADDING_PX {
        pixels / (DIGIT_WIDTH_PX + COLUMN_PADDING_PX)
    } else {
        (pixels - COLUMN_PADDING_PX) / DIGIT_WIDTH_PX
    }
}

/// Merge adjacent runs that only differ in their bounds
fn merge_columns(columns: Vec<ColumnLayout>) -> Vec<ColumnLayout> {
    let mut merged: Vec<ColumnLayout> = Vec::with_capacity(columns.len());
    for column in columns {
        if let Some(last) = merged.last_mut() {
            let same = ColumnLayout {
                min: last.min,
                max: last.max,
                ..column.clone()
            } == *last;
            if same && last.max.checked_add(1) == Some(column.min) {
                last.max = column.max;
                continue;
            }
        }
        merged.push(column);
    }
    merged
}

fn column_layout(attrs: &HashMap<String, String>) -> Option<ColumnLayout> {
    let min = number::<u32>(attrs, "min")?;
    Some(ColumnLayout {
        min,
        max: number(attrs, "max").unwrap_or(min),
        width: number(attrs, "width").map(pixel_width),
        hidden: flag(attrs, "hidden"),
        custom_width: flag(attrs, "customWidth"),
        best_fit: flag(attrs, "bestFit"),
        outline_level: number(attrs, "outlineLevel").unwrap_or(0),
    })
}

/// Scan a worksheet part for everything calamine does not report
fn scan_layout(data: &[u8], part: &str, budget: &mut usize) -> Result<SheetLayout, CodecError> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(true);

    let mut layout = SheetLayout::default();
    let mut buf = Vec::new();
    let (mut row, mut column) = (0usize, 0usize);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let attrs = attributes(&e, part)?;
                    row = number(&attrs, "r").unwrap_or(row + 1);
                    column = 0;
                    if flag(&attrs, "customFormat") {
                        if let Some(style) = number(&attrs, "s") {
                            layout.row_styles.insert(row, style);
                        }
                    }
                }
                b"c" => {
                    let attrs = attributes(&e, part)?;
                    let (cell_row, cell_column) = attrs
                        .get("r")
                        .and_then(|reference| parse_cell_reference(reference))
                        .unwrap_or((row.max(1), column + 1));
                    row = cell_row;
                    column = cell_column;

                    let style = number(&attrs, "s").unwrap_or(0);
                    if layout.cell_styles.insert((row, column), style).is_none() {
                        *budget = budget.checked_sub(1).ok_or_else(|| {
                            CodecError::Limit(format!(
                                "workbook holds more than {} cells",
                                MAX_POPULATED_CELLS
                            ))
                        })?;
                    }
                    layout.extent.0 = layout.extent.0.max(row);
                    layout.extent.1 = layout.extent.1.max(column);
                }
                b"col" => {
                    if let Some(layout_column) = column_layout(&attributes(&e, part)?) {
                        layout.columns.push(layout_column);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(xml_error(
                    part,
                    format!("at position {}: {}", reader.buffer_position(), e),
                ));
            }
        }
        buf.clear();
    }

    layout.columns = merge_columns(std::mem::take(&mut layout.columns));
    Ok(layout)
}

fn cell_value(data: &DataRef<'_>) -> CellValue {
    match data {
        DataRef::String(text) => CellValue::Text(text.clone()),
        DataRef::SharedString(text) => CellValue::Text(text.to_string()),
        DataRef::Float(number) => CellValue::Number(*number),
        DataRef::Int(number) => CellValue::Number(*number as f64),
        DataRef::Bool(flag) => CellValue::Bool(*flag),
        DataRef::DateTime(serial) => CellValue::Number(serial.as_f64()),
        DataRef::DateTimeIso(text) | DataRef::DurationIso(text) => CellValue::Date(text.clone()),
        DataRef::Error(error) => CellValue::Error(error.to_string()),
        _ => CellValue::Empty,
    }
}

fn build_sheet(name: &str, layout: SheetLayout, styles: &StyleSheet) -> Sheet {
    let (rows, columns) = layout.extent;
    let mut sheet = Sheet::with_extent(name, rows, columns);
    sheet.columns = layout.columns;
    // a cell without a style reference renders with the first cell format
    sheet.set_default_format(styles.format(0));
    for (row, style) in layout.row_styles.iter().filter(|(row, _)| **row <= rows) {
        sheet.set_row_format(*row, styles.format(*style));
    }
    for ((row, column), style) in layout.cell_styles {
        sheet.cell_mut(row, column).format = styles.format(style);
    }
    sheet
}

/// Read a workbook from an `.xlsx` package
///
/// `reader` yields the same bytes the package was read from.
pub fn read_workbook<R: Read + Seek>(package: &Package, reader: R) -> Result<Workbook, CodecError> {
    let workbook_part = package.main_part()?;
    let workbook_xml = package.xml(&workbook_part)?;
    let relationships = package.relationships(&workbook_part)?;

    let styles = match relationships.iter().find(|r| r.rel_type.ends_with("/styles")) {
        Some(rel) => StyleSheet::parse(&package.xml(&rel.target)?)?,
        None => StyleSheet::default(),
    };
    if styles.is_empty() {
        debug!("{} has no cell formats; every cell uses the default", workbook_part);
    } else {
        debug!("{} defines {} cell formats", workbook_part, styles.len());
    }

    let sheets = workbook_xml
        .find("sheets")
        .ok_or_else(|| CodecError::Malformed(format!("{} has no sheets list", workbook_part)))?;

    let mut budget = MAX_POPULATED_CELLS;
    let mut layouts = Vec::new();
    for entry in sheets.find_all("sheet") {
        let name = entry.attribute("name").unwrap_or_default().to_string();
        let rel_id = entry
            .prefixed_attribute("id")
            .ok_or_else(|| CodecError::Malformed(format!("sheet '{}' has no relationship id", name)))?;
        let rel = relationships
            .iter()
            .find(|r| r.id == rel_id)
            .ok_or_else(|| CodecError::MissingPart(format!("relationship {} for sheet '{}'", rel_id, name)))?;

        if !rel.rel_type.ends_with("/worksheet") {
            warn!("Skipping sheet '{}': not a worksheet", name);
            continue;
        }

        let data = package
            .part(&rel.target)
            .ok_or_else(|| CodecError::MissingPart(rel.target.clone()))?;
        let layout = scan_layout(data, &rel.target, &mut budget)?;
        layouts.push((name, layout));
    }

    let mut xlsx: Xlsx<R> = Xlsx::new(reader)?;
    let mut workbook = Workbook::new();
    for (name, layout) in layouts {
        let mut sheet = build_sheet(&name, layout, &styles);

        let mut cells = xlsx.worksheet_cells_reader(&name)?;
        while let Some(cell) = cells.next_cell()? {
            let value = cell_value(cell.get_value());
            if value.is_empty() {
                continue;
            }
            let (row, column) = cell.get_position();
            sheet.cell_mut(row as usize + 1, column as usize + 1).value = value;
        }

        let (rows, columns) = sheet.extent();
        debug!(
            "Read sheet '{}' with extent {}x{} and {} populated cells",
            name,
            rows,
            columns,
            sheet.populated_len()
        );
        workbook.sheets.push(sheet);
    }

    Ok(workbook)
}

fn row_number(row: usize) -> Result<RowNum, CodecError> {
    row.checked_sub(1)
        .and_then(|row| RowNum::try_from(row).ok())
        .ok_or_else(|| CodecError::Limit(format!("row {} is outside the writable range", row)))
}

fn column_number(column: usize) -> Result<ColNum, CodecError> {
    column
        .checked_sub(1)
        .and_then(|column| ColNum::try_from(column).ok())
        .ok_or_else(|| CodecError::Limit(format!("column {} is outside the writable range", column)))
}

/// Writer formats already built for a sheet, looked up by cell format
#[derive(Default)]
struct FormatCache {
    entries: Vec<(CellFormat, Format)>,
}

impl FormatCache {
    fn get(&mut self, cell_format: &CellFormat) -> &Format {
        let index = match self.entries.iter().position(|(known, _)| known == cell_format) {
            Some(index) => index,
            None => {
                self.entries.push((cell_format.clone(), writer_format(cell_format)));
                self.entries.len() - 1
            }
        };
        &self.entries[index].1
    }
}

fn write_columns(worksheet: &mut Worksheet, columns: &[ColumnLayout]) -> Result<(), CodecError> {
    for layout in columns {
        if layout.best_fit || layout.outline_level > 0 {
            debug!("Column {}..={}: best fit and outline level are not written", layout.min, layout.max);
        }
        for column in layout.min..=layout.max {
            let column = column_number(column as usize)?;
            if let Some(width) = layout.width {
                worksheet.set_column_width(column, writer_column_width(width))?;
            }
            if layout.hidden {
                worksheet.set_column_hidden(column)?;
            }
        }
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    column: ColNum,
    cell: &Cell,
    format: &Format,
) -> Result<(), CodecError> {
    match &cell.value {
        CellValue::Empty => {
            worksheet.write_blank(row, column, format)?;
        }
        CellValue::Text(text) if text.is_empty() => {
            worksheet.write_blank(row, column, format)?;
        }
        CellValue::Text(text) => {
            worksheet.write_string_with_format(row, column, text.as_str(), format)?;
        }
        CellValue::Number(number) if number.is_finite() => {
            worksheet.write_number_with_format(row, column, *number, format)?;
        }
        CellValue::Number(_) => {
            worksheet.write_formula_with_format(row, column, Formula::new("#NUM!").set_result("#NUM!"), format)?;
        }
        CellValue::Bool(flag) => {
            worksheet.write_boolean_with_format(row, column, *flag, format)?;
        }
        CellValue::Error(error) => {
            worksheet.write_formula_with_format(
                row,
                column,
                Formula::new(error.as_str()).set_result(error.as_str()),
                format,
            )?;
        }
        CellValue::Date(date) => match ExcelDateTime::parse_from_str(date) {
            Ok(datetime) => {
                worksheet.write_number_with_format(row, column, datetime.to_excel(), format)?;
            }
            Err(_) => {
                warn!("Date '{}' is not ISO 8601; writing it as text", date);
                worksheet.write_string_with_format(row, column, date.as_str(), format)?;
            }
        },
    }
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), CodecError> {
    worksheet.set_name(sheet.name.as_str())?;
    write_columns(worksheet, &sheet.columns)?;

    let mut formats = FormatCache::default();
    let unstyled = writer_default_format();
    let (rows, _) = sheet.extent();
    for row in 1..=rows {
        let gap = sheet.row_format(row).unwrap_or_else(|| sheet.default_format());
        if *gap != unstyled {
            worksheet.set_row_format(row_number(row)?, formats.get(gap))?;
        }
    }

    for (row, column, cell) in sheet.populated_cells() {
        let format = formats.get(&cell.format);
        write_cell(worksheet, row_number(row)?, column_number(column)?, cell, format)?;
    }
    Ok(())
}

/// Serialize a workbook to `.xlsx` bytes
pub fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>, CodecError> {
    let mut output = rust_xlsxwriter::Workbook::new();
    for sheet in &workbook.sheets {
        let worksheet = output.add_worksheet();
        write_sheet(worksheet, sheet)?;
        debug!("Wrote sheet '{}' with {} populated cells", sheet.name, sheet.populated_len());
    }
    Ok(output.save_to_buffer()?)
}

/// Write a workbook to disk
pub fn save_workbook(workbook: &Workbook, path: &Path) -> Result<(), CodecError> {
    let bytes = write_workbook(workbook)?;
    package::write_atomically(path, &bytes)
}
