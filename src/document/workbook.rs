/*!
 * Spreadsheet document model.
 *
 * A workbook is an ordered list of sheets. Each sheet is a grid of cells
 * anchored at A1 whose extent is the largest populated row and column of the
 * source, so addressing is identical between a source sheet and its
 * translated copy, gaps included. Only populated cells are kept in memory.
 */

use std::collections::BTreeMap;

/// A color reference as stored in the spreadsheet styles table
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Explicit ARGB value, e.g. `FFFF0000`
    Rgb(String),
    /// Theme palette entry with optional tint
    Theme {
        /// Theme color index
        index: u32,
        /// Tint in the range -1.0..=1.0
        tint: Option<f64>,
    },
    /// Legacy indexed palette entry
    Indexed(u32),
    /// Application-chosen automatic color
    Auto,
}

/// Font attributes of a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
}

/// Alignment attributes of a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: Option<bool>,
}

/// Pattern fill of a cell
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    /// Pattern type, e.g. `solid` or `gray125`
    pub pattern: String,
    pub fg_color: Option<Color>,
    pub bg_color: Option<Color>,
}

/// One edge of a cell border
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BorderSide {
    /// Line style, e.g. `thin`; `None` means no line
    pub style: Option<String>,
    pub color: Option<Color>,
}

impl BorderSide {
    pub fn is_empty(&self) -> bool {
        self.style.is_none() && self.color.is_none()
    }
}

/// Four-sided cell border
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Border {
    pub left: BorderSide,
    pub right: BorderSide,
    pub top: BorderSide,
    pub bottom: BorderSide,
}

impl Border {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty() && self.top.is_empty() && self.bottom.is_empty()
    }
}

/// Presentation attributes of a cell, independent of its content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellFormat {
    pub font: Font,
    pub alignment: Alignment,
    /// Absent when the source has no pattern fill
    pub fill: Option<Fill>,
    /// Absent when the source has no border lines
    pub border: Option<Border>,
    /// Number format code, absent for `General`
    pub number_format: Option<String>,
}

impl CellFormat {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Value held by a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
    /// ISO 8601 date stored as a date-typed cell
    Date(String),
}

impl CellValue {
    /// The text of the value if it carries content worth translating
    pub fn translatable_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A single grid cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            format: CellFormat::default(),
        }
    }

    pub fn with_format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(CellValue::Text(text.into()))
    }
}

/// Width and visibility of a run of columns (`min..=max`, 1-based)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnLayout {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub hidden: bool,
    pub custom_width: bool,
    pub best_fit: bool,
    pub outline_level: u8,
}

/// A worksheet
///
/// Only populated cells are stored. Every other address inside the extent
/// reads as an empty cell carrying its row's format, or the sheet's default
/// format when the row has none.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<ColumnLayout>,
    extent: (usize, usize),
    cells: BTreeMap<(usize, usize), Cell>,
    blank: Cell,
    row_blanks: BTreeMap<usize, Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sheet whose extent is `row_count` x `column_count` with no stored cells
    pub fn with_extent(name: impl Into<String>, row_count: usize, column_count: usize) -> Self {
        let mut sheet = Self::new(name);
        sheet.resize(row_count, column_count);
        sheet
    }

    /// Number of rows and columns in the grid
    pub fn extent(&self) -> (usize, usize) {
        self.extent
    }

    /// Grow the extent so that it covers at least the given size
    pub fn resize(&mut self, row_count: usize, column_count: usize) {
        self.extent.0 = self.extent.0.max(row_count);
        self.extent.1 = self.extent.1.max(column_count);
    }

    /// Format of cells that are neither stored nor in a formatted row
    pub fn default_format(&self) -> &CellFormat {
        &self.blank.format
    }

    pub fn set_default_format(&mut self, format: CellFormat) {
        self.blank.format = format;
    }

    /// Format of the unstored cells of a row, if the row has its own
    pub fn row_format(&self, row: usize) -> Option<&CellFormat> {
        self.row_blanks.get(&row).map(|cell| &cell.format)
    }

    pub fn set_row_format(&mut self, row: usize, format: CellFormat) {
        self.row_blanks.insert(row, Cell::new(CellValue::Empty).with_format(format));
    }

    /// Rows with their own format, in row order
    pub fn row_formats(&self) -> impl Iterator<Item = (usize, &CellFormat)> {
        self.row_blanks.iter().map(|(row, cell)| (*row, &cell.format))
    }

    fn blank(&self, row: usize) -> &Cell {
        self.row_blanks.get(&row).unwrap_or(&self.blank)
    }

    /// Cell at 1-based `(row, column)`; `None` outside the extent
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        let (rows, columns) = self.extent;
        if row == 0 || column == 0 || row > rows || column > columns {
            return None;
        }
        Some(self.cells.get(&(row, column)).unwrap_or_else(|| self.blank(row)))
    }

    /// Mutable cell at 1-based `(row, column)`, storing it and growing the
    /// extent when needed
    pub fn cell_mut(&mut self, row: usize, column: usize) -> &mut Cell {
        let row = row.max(1);
        let column = column.max(1);
        self.resize(row, column);
        let blank = self.row_blanks.get(&row).unwrap_or(&self.blank);
        self.cells.entry((row, column)).or_insert_with(|| blank.clone())
    }

    /// Number of stored cells
    pub fn populated_len(&self) -> usize {
        self.cells.len()
    }

    /// Stored cells in row-major order with their 1-based address
    pub fn populated_cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.cells.iter().map(|(&(row, column), cell)| (row, column, cell))
    }

    /// Every cell of the extent in row-major order, gaps included
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        let (rows, columns) = self.extent;
        (1..=rows).flat_map(move |row| {
            (1..=columns).filter_map(move |column| self.cell(row, column).map(|cell| (row, column, cell)))
        })
    }
}

/// Sheets are equal when every address of their extent reads the same,
/// however the cells happen to be stored
impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.extent == other.extent
            && self.cells().eq(other.cells())
    }
}

/// A spreadsheet document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Parse an A1-style reference into a 1-based `(row, column)`
pub fn parse_cell_reference(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().trim_start_matches('$');
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let letters = letters.trim_end_matches('$');
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let column = letters
        .chars()
        .try_fold(0usize, |acc, c| {
            acc.checked_mul(26)?
                .checked_add((c.to_ascii_uppercase() as u8 - b'A' + 1) as usize)
        })?;
    let row = digits.parse::<usize>().ok()?;
    (row > 0).then_some((row, column))
}
