/*!
 * Document codecs.
 *
 * - `package`: OPC (ZIP) container access with size limits and atomic saves
 * - `xml`: owned XML element tree over quick-xml
 * - `styles`: `xl/styles.xml` decoding and writer formats
 * - `xlsx`: workbook reader (calamine) and writer (rust_xlsxwriter)
 * - `pptx`: presentation reader and writer
 */

use std::fs;
use std::io::Cursor;
use std::path::Path;

use log::debug;

use crate::document::{Document, DocumentKind};
use crate::errors::CodecError;

pub mod package;
pub mod pptx;
pub mod styles;
pub mod xlsx;
pub mod xml;

/// Reads and writes document trees
pub trait DocumentCodec: Send + Sync {
    /// Read the document at `path`
    fn open(&self, path: &Path) -> Result<Document, CodecError>;

    /// Write `document` to `path`, replacing any existing file
    fn save(&self, document: &Document, path: &Path) -> Result<(), CodecError>;
}

/// Codec for Office Open XML packages (`.xlsx`, `.pptx`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OoxmlCodec;

impl OoxmlCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentCodec for OoxmlCodec {
    fn open(&self, path: &Path) -> Result<Document, CodecError> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            CodecError::Malformed(format!("cannot determine document type of {:?}", path))
        })?;
        debug!("Opening {} document {:?}", kind, path);

        let bytes = fs::read(path)?;
        // the package checks entry count and part sizes before anything else decompresses
        let package = package::Package::from_reader(Cursor::new(bytes.as_slice()))?;
        match kind {
            DocumentKind::Spreadsheet => Ok(Document::Workbook(xlsx::read_workbook(&package, Cursor::new(bytes))?)),
            DocumentKind::Presentation => Ok(Document::Presentation(pptx::read_presentation(package)?)),
        }
    }

    fn save(&self, document: &Document, path: &Path) -> Result<(), CodecError> {
        debug!("Saving {} document to {:?}", document.kind(), path);
        match document {
            Document::Workbook(workbook) => xlsx::save_workbook(workbook, path),
            Document::Presentation(presentation) => pptx::save_presentation(presentation, path),
        }
    }
}
