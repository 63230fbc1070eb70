/*!
 * Typed document trees for the supported office formats.
 *
 * - `workbook`: sheets, cell grids and cell formatting
 * - `presentation`: slides and the shape tree
 */

use std::fmt;
use std::path::Path;

pub mod presentation;
pub mod workbook;

pub use self::presentation::{Presentation, Shape, ShapeContent, Slide, TableCell, TableRow};
pub use self::workbook::{
    Alignment, Border, BorderSide, Cell, CellFormat, CellValue, Color, ColumnLayout, Fill, Font,
    Sheet, Workbook,
};

/// Document types the pipeline can translate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `.xlsx` workbook
    Spreadsheet,
    /// `.pptx` deck
    Presentation,
}

impl DocumentKind {
    /// Detect the kind from the path extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Spreadsheet),
            "pptx" => Some(Self::Presentation),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spreadsheet => write!(f, "Excel"),
            Self::Presentation => write!(f, "PowerPoint"),
        }
    }
}

/// A document of any supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Workbook(Workbook),
    Presentation(Presentation),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Workbook(_) => DocumentKind::Spreadsheet,
            Self::Presentation(_) => DocumentKind::Presentation,
        }
    }
}

impl From<Workbook> for Document {
    fn from(workbook: Workbook) -> Self {
        Self::Workbook(workbook)
    }
}

impl From<Presentation> for Document {
    fn from(presentation: Presentation) -> Self {
        Self::Presentation(presentation)
    }
}
