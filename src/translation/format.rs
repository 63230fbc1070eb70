/*!
 * Format-preserving copies of cell formatting, column layout and shape
 * structure.
 *
 * Every function here is pure: the source is only read, and absent parts of
 * the source (no fill, no border, no number format) stay absent in the copy.
 */

use crate::document::{Border, CellFormat, ColumnLayout, Fill, Font, Shape};

/// Pattern type meaning "no fill"
const NO_FILL_PATTERN: &str = "none";

fn copy_font(font: &Font) -> Font {
    Font {
        name: font.name.clone(),
        size: font.size,
        bold: font.bold,
        italic: font.italic,
        color: font.color.clone(),
    }
}

/// Copy a fill only when it has a pattern type set
fn copy_fill(fill: Option<&Fill>) -> Option<Fill> {
    let fill = fill?;
    if fill.pattern.is_empty() || fill.pattern == NO_FILL_PATTERN {
        return None;
    }
    Some(Fill {
        pattern: fill.pattern.clone(),
        fg_color: fill.fg_color.clone(),
        bg_color: fill.bg_color.clone(),
    })
}

fn copy_border(border: Option<&Border>) -> Option<Border> {
    border.filter(|b| !b.is_empty()).cloned()
}

/// Copy of a cell format with the same font, alignment, fill, border and
/// number format
pub fn copy_cell_format(source: &CellFormat) -> CellFormat {
    CellFormat {
        font: copy_font(&source.font),
        alignment: source.alignment.clone(),
        fill: copy_fill(source.fill.as_ref()),
        border: copy_border(source.border.as_ref()),
        number_format: source.number_format.clone(),
    }
}

/// Copy of a sheet's column layout entries
pub fn copy_column_layout(columns: &[ColumnLayout]) -> Vec<ColumnLayout> {
    columns.to_vec()
}

/// Copy of a shape's identity, grouping and table structure
///
/// Text fields are copied as they are; the walker overwrites them afterwards.
pub fn copy_shape_structure(shape: &Shape) -> Shape {
    shape.clone()
}
