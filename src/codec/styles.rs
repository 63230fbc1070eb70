/*!
 * Spreadsheet styles table (`xl/styles.xml`).
 *
 * Reading resolves every `cellXfs` entry into a self-contained `CellFormat`.
 * Colors that only restate the application default (automatic colors, the
 * theme text color, the system background index) are read as absent so a
 * format compares equal however the producing application spelled it.
 *
 * Writing maps a `CellFormat` onto a `rust_xlsxwriter::Format`; the writer
 * builds the deduplicated tables itself.
 */

use std::collections::HashMap;

use log::debug;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatPattern};

use super::xml::XmlElement;
use crate::document::{Alignment, Border, BorderSide, CellFormat, Color, Fill, Font};
use crate::errors::CodecError;

/// Built-in number formats that have a locale-independent code
const BUILTIN_NUM_FMTS: &[(u8, &str)] = &[
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

fn builtin_code(id: u32) -> Option<&'static str> {
    BUILTIN_NUM_FMTS
        .iter()
        .find(|(builtin, _)| u32::from(*builtin) == id)
        .map(|(_, code)| *code)
}

fn builtin_id(code: &str) -> Option<u8> {
    BUILTIN_NUM_FMTS
        .iter()
        .find(|(_, builtin)| *builtin == code)
        .map(|(id, _)| *id)
}

/// Theme color of the default text
const THEME_TEXT: u32 = 1;

/// Indexed color meaning "system background"
const INDEXED_SYSTEM_BACKGROUND: u32 = 64;

/// Legacy indexed palette, entries 0 to 63
const INDEXED_PALETTE: [u32; 64] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080,
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF,
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF,
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99,
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696,
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333,
];

/// Tints of the theme shades the writer can express, shade 0 being untinted
const THEME_SHADE_TINTS: [f64; 6] = [0.0, 0.7999, 0.5999, 0.3999, -0.2499, -0.4999];

fn parse_color(element: &XmlElement) -> Option<Color> {
    if let Some(rgb) = element.attribute("rgb") {
        return Some(Color::Rgb(rgb.to_ascii_uppercase()));
    }
    if let Some(index) = element.parse_attribute::<u32>("theme") {
        return Some(Color::Theme {
            index,
            tint: element.parse_attribute("tint").filter(|tint: &f64| *tint != 0.0),
        });
    }
    if let Some(index) = element.parse_attribute::<u32>("indexed") {
        return Some(Color::Indexed(index));
    }
    if element.bool_attribute("auto") == Some(true) {
        return Some(Color::Auto);
    }
    None
}

/// A color that names something other than the application default
fn explicit_color(color: Option<Color>) -> Option<Color> {
    color.filter(|color| !matches!(color, Color::Auto))
}

/// Presence of `<b/>` means true unless `val` says otherwise
fn parse_flag(element: &XmlElement) -> bool {
    element.bool_attribute("val").unwrap_or(true)
}

fn parse_font(element: &XmlElement) -> Font {
    let color = explicit_color(element.find("color").and_then(parse_color))
        .filter(|color| *color != Color::Theme { index: THEME_TEXT, tint: None });
    Font {
        name: element.find("name").and_then(|e| e.attribute("val")).map(str::to_string),
        size: element.find("sz").and_then(|e| e.parse_attribute("val")),
        bold: element.find("b").map(parse_flag),
        italic: element.find("i").map(parse_flag),
        color,
    }
}

fn parse_fill(element: &XmlElement) -> Option<Fill> {
    let Some(pattern) = element.find("patternFill") else {
        if element.find("gradientFill").is_some() {
            debug!("Gradient fill is not carried over");
        }
        return None;
    };
    let pattern_type = pattern.attribute("patternType")?;
    if pattern_type == "none" {
        return None;
    }
    Some(Fill {
        pattern: pattern_type.to_string(),
        fg_color: explicit_color(pattern.find("fgColor").and_then(parse_color)),
        bg_color: explicit_color(pattern.find("bgColor").and_then(parse_color))
            .filter(|color| *color != Color::Indexed(INDEXED_SYSTEM_BACKGROUND)),
    })
}

fn parse_border_side(element: Option<&XmlElement>) -> BorderSide {
    element
        .map(|side| BorderSide {
            style: side.attribute("style").map(str::to_string),
            color: explicit_color(side.find("color").and_then(parse_color)),
        })
        .unwrap_or_default()
}

fn parse_border(element: &XmlElement) -> Option<Border> {
    let border = Border {
        left: parse_border_side(element.find("left").or_else(|| element.find("start"))),
        right: parse_border_side(element.find("right").or_else(|| element.find("end"))),
        top: parse_border_side(element.find("top")),
        bottom: parse_border_side(element.find("bottom")),
    };
    (!border.is_empty()).then_some(border)
}

fn parse_alignment(element: Option<&XmlElement>) -> Alignment {
    element
        .map(|a| Alignment {
            horizontal: a.attribute("horizontal").map(str::to_string),
            vertical: a.attribute("vertical").map(str::to_string),
            wrap_text: a.bool_attribute("wrapText"),
        })
        .unwrap_or_default()
}

/// Resolved cell formats indexed by `cellXfs` position
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    formats: Vec<CellFormat>,
}

impl StyleSheet {
    /// Resolve the `cellXfs` of a parsed styles part
    pub fn parse(root: &XmlElement) -> Result<Self, CodecError> {
        let mut num_fmts: HashMap<u32, String> = HashMap::new();
        if let Some(list) = root.find("numFmts") {
            for fmt in list.find_all("numFmt") {
                if let (Some(id), Some(code)) =
                    (fmt.parse_attribute::<u32>("numFmtId"), fmt.attribute("formatCode"))
                {
                    num_fmts.insert(id, code.to_string());
                }
            }
        }

        let fonts: Vec<Font> = root
            .find("fonts")
            .map(|list| list.find_all("font").map(parse_font).collect())
            .unwrap_or_default();
        let fills: Vec<Option<Fill>> = root
            .find("fills")
            .map(|list| list.find_all("fill").map(parse_fill).collect())
            .unwrap_or_default();
        let borders: Vec<Option<Border>> = root
            .find("borders")
            .map(|list| list.find_all("border").map(parse_border).collect())
            .unwrap_or_default();

        let mut formats = Vec::new();
        if let Some(xfs) = root.find("cellXfs") {
            for xf in xfs.find_all("xf") {
                let font = xf
                    .parse_attribute::<usize>("fontId")
                    .and_then(|id| fonts.get(id).cloned())
                    .unwrap_or_default();
                let fill = xf
                    .parse_attribute::<usize>("fillId")
                    .and_then(|id| fills.get(id).cloned())
                    .flatten();
                let border = xf
                    .parse_attribute::<usize>("borderId")
                    .and_then(|id| borders.get(id).cloned())
                    .flatten();
                let number_format = match xf.parse_attribute::<u32>("numFmtId").unwrap_or(0) {
                    0 => None,
                    id => num_fmts
                        .get(&id)
                        .cloned()
                        .or_else(|| builtin_code(id).map(str::to_string)),
                };

                formats.push(CellFormat {
                    font,
                    alignment: parse_alignment(xf.find("alignment")),
                    fill,
                    border,
                    number_format,
                });
            }
        }

        debug!(
            "Parsed styles: {} fonts, {} fills, {} borders, {} cell formats",
            fonts.len(),
            fills.len(),
            borders.len(),
            formats.len()
        );
        Ok(Self { formats })
    }

    /// Format for a cell's `s` attribute
    pub fn format(&self, index: usize) -> CellFormat {
        self.formats.get(index).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

fn writer_color(color: &Color) -> Option<rust_xlsxwriter::Color> {
    match color {
        Color::Rgb(argb) => {
            let start = argb.len().saturating_sub(6);
            let rgb = argb.get(start..)?;
            u32::from_str_radix(rgb, 16).ok().map(rust_xlsxwriter::Color::RGB)
        }
        Color::Theme { index, tint } => {
            let index = u8::try_from(*index).ok().filter(|index| *index <= 9)?;
            Some(rust_xlsxwriter::Color::Theme(index, theme_shade(tint.unwrap_or(0.0))))
        }
        Color::Indexed(index) => INDEXED_PALETTE
            .get(*index as usize)
            .map(|rgb| rust_xlsxwriter::Color::RGB(*rgb)),
        Color::Auto => Some(rust_xlsxwriter::Color::Automatic),
    }
}

/// Writer shade whose tint is closest to `tint`
fn theme_shade(tint: f64) -> u8 {
    let mut best = 0u8;
    for (shade, candidate) in (0u8..).zip(THEME_SHADE_TINTS) {
        if (candidate - tint).abs() < (THEME_SHADE_TINTS[best as usize] - tint).abs() {
            best = shade;
        }
    }
    best
}

fn horizontal_align(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "left" => FormatAlign::Left,
        "center" => FormatAlign::Center,
        "right" => FormatAlign::Right,
        "fill" => FormatAlign::Fill,
        "justify" => FormatAlign::Justify,
        "centerContinuous" => FormatAlign::CenterAcross,
        "distributed" => FormatAlign::Distributed,
        _ => return None,
    })
}

fn vertical_align(value: &str) -> Option<FormatAlign> {
    Some(match value {
        "top" => FormatAlign::Top,
        "center" => FormatAlign::VerticalCenter,
        "bottom" => FormatAlign::Bottom,
        "justify" => FormatAlign::VerticalJustify,
        "distributed" => FormatAlign::VerticalDistributed,
        _ => return None,
    })
}

fn fill_pattern(value: &str) -> Option<FormatPattern> {
    Some(match value {
        "solid" => FormatPattern::Solid,
        "mediumGray" => FormatPattern::MediumGray,
        "darkGray" => FormatPattern::DarkGray,
        "lightGray" => FormatPattern::LightGray,
        "darkHorizontal" => FormatPattern::DarkHorizontal,
        "darkVertical" => FormatPattern::DarkVertical,
        "darkDown" => FormatPattern::DarkDown,
        "darkUp" => FormatPattern::DarkUp,
        "darkGrid" => FormatPattern::DarkGrid,
        "darkTrellis" => FormatPattern::DarkTrellis,
        "lightHorizontal" => FormatPattern::LightHorizontal,
        "lightVertical" => FormatPattern::LightVertical,
        "lightDown" => FormatPattern::LightDown,
        "lightUp" => FormatPattern::LightUp,
        "lightGrid" => FormatPattern::LightGrid,
        "lightTrellis" => FormatPattern::LightTrellis,
        "gray125" => FormatPattern::Gray125,
        "gray0625" => FormatPattern::Gray0625,
        _ => return None,
    })
}

fn border_style(value: &str) -> Option<FormatBorder> {
    Some(match value {
        "thin" => FormatBorder::Thin,
        "medium" => FormatBorder::Medium,
        "dashed" => FormatBorder::Dashed,
        "dotted" => FormatBorder::Dotted,
        "thick" => FormatBorder::Thick,
        "double" => FormatBorder::Double,
        "hair" => FormatBorder::Hair,
        "mediumDashed" => FormatBorder::MediumDashed,
        "dashDot" => FormatBorder::DashDot,
        "mediumDashDot" => FormatBorder::MediumDashDot,
        "dashDotDot" => FormatBorder::DashDotDot,
        "mediumDashDotDot" => FormatBorder::MediumDashDotDot,
        "slantDashDot" => FormatBorder::SlantDashDot,
        _ => return None,
    })
}

fn with_font(mut format: Format, font: &Font) -> Format {
    if let Some(name) = &font.name {
        format = format.set_font_name(name.as_str());
    }
    if let Some(size) = font.size {
        format = format.set_font_size(size);
    }
    if font.bold == Some(true) {
        format = format.set_bold();
    }
    if font.italic == Some(true) {
        format = format.set_italic();
    }
    if let Some(color) = font.color.as_ref().and_then(writer_color) {
        format = format.set_font_color(color);
    }
    format
}

fn with_alignment(mut format: Format, alignment: &Alignment) -> Format {
    if let Some(align) = alignment.horizontal.as_deref().and_then(horizontal_align) {
        format = format.set_align(align);
    }
    if let Some(align) = alignment.vertical.as_deref().and_then(vertical_align) {
        format = format.set_align(align);
    }
    if alignment.wrap_text == Some(true) {
        format = format.set_text_wrap();
    }
    format
}

fn with_fill(mut format: Format, fill: &Fill) -> Format {
    let Some(pattern) = fill_pattern(&fill.pattern) else {
        debug!("Fill pattern '{}' is not carried over", fill.pattern);
        return format;
    };
    let solid = matches!(pattern, FormatPattern::Solid);
    format = format.set_pattern(pattern);
    let fg = fill.fg_color.as_ref().and_then(writer_color);
    let bg = fill.bg_color.as_ref().and_then(writer_color);
    // the writer stores a solid fill's background color as the pattern color
    let (pattern_color, back_color) = if solid { (bg, fg) } else { (fg, bg) };
    if let Some(color) = pattern_color {
        format = format.set_foreground_color(color);
    }
    if let Some(color) = back_color {
        format = format.set_background_color(color);
    }
    format
}

fn with_border(mut format: Format, border: &Border) -> Format {
    let side = |side: &BorderSide| {
        let style = side.style.as_deref().and_then(border_style);
        let color = side.color.as_ref().and_then(writer_color);
        (style, color)
    };

    if let (Some(style), color) = side(&border.left) {
        format = format.set_border_left(style);
        if let Some(color) = color {
            format = format.set_border_left_color(color);
        }
    }
    if let (Some(style), color) = side(&border.right) {
        format = format.set_border_right(style);
        if let Some(color) = color {
            format = format.set_border_right_color(color);
        }
    }
    if let (Some(style), color) = side(&border.top) {
        format = format.set_border_top(style);
        if let Some(color) = color {
            format = format.set_border_top_color(color);
        }
    }
    if let (Some(style), color) = side(&border.bottom) {
        format = format.set_border_bottom(style);
        if let Some(color) = color {
            format = format.set_border_bottom_color(color);
        }
    }
    format
}

/// Writer format reproducing a cell format
pub fn writer_format(cell_format: &CellFormat) -> Format {
    let mut format = with_font(Format::new(), &cell_format.font);
    format = with_alignment(format, &cell_format.alignment);
    if let Some(fill) = &cell_format.fill {
        format = with_fill(format, fill);
    }
    if let Some(border) = &cell_format.border {
        format = with_border(format, border);
    }
    if let Some(code) = &cell_format.number_format {
        format = match builtin_id(code) {
            Some(id) => format.set_num_format_index(id),
            None => format.set_num_format(code.as_str()),
        };
    }
    format
}

/// Format that an unstyled cell of a written workbook reads back as
pub fn writer_default_format() -> CellFormat {
    CellFormat {
        font: Font {
            name: Some("Calibri".to_string()),
            size: Some(11.0),
            ..Font::default()
        },
        ..CellFormat::default()
    }
}
