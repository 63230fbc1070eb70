/*!
 * Document tree walkers.
 *
 * A walker visits every node of a source document in a fixed order and
 * builds the output document: formatting and structure are copied, and every
 * leaf holding non-blank text is replaced by the translation port's result.
 *
 * Within one sheet or slide the translatable leaves are gathered first and
 * translated through an order-preserving bounded stream, then written back
 * by position, so the output is the same for any concurrency setting.
 */

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info};

use super::core::Translator;
use super::format::{copy_cell_format, copy_column_layout, copy_shape_structure};
use crate::document::{CellValue, Presentation, Shape, ShapeContent, Sheet, Slide, Workbook};

/// Called after each sheet or slide with `(completed, total)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Builds a translated copy of a document tree
#[async_trait]
pub trait DocumentWalker: Send + Sync {
    type Document: Send + Sync;

    /// Walk `source` and return the translated document
    async fn walk(&self, source: &Self::Document) -> Self::Document;
}

/// Translate `texts` in order with bounded concurrency
async fn translate_all(translator: &Translator, texts: Vec<String>) -> Vec<String> {
    let limit = translator.options().concurrent_requests.max(1);

    stream::iter(texts.into_iter().map(|text| async move {
        match translator.request(&text) {
            Some(request) => translator.translate(&request).await.into_text(),
            None => text,
        }
    }))
    .buffered(limit)
    .collect()
    .await
}

fn report(progress: &Option<ProgressCallback>, completed: usize, total: usize) {
    if let Some(callback) = progress {
        callback(completed, total);
    }
}

/// Walker for workbooks
pub struct SpreadsheetWalker {
    translator: Translator,
    progress: Option<ProgressCallback>,
}

impl SpreadsheetWalker {
    pub fn new(translator: Translator) -> Self {
        Self {
            translator,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    async fn walk_sheet(&self, source: &Sheet) -> Sheet {
        let (row_count, column_count) = source.extent();
        let mut output = Sheet::with_extent(source.name.clone(), row_count, column_count);
        output.columns = copy_column_layout(&source.columns);
        output.set_default_format(copy_cell_format(source.default_format()));
        for (row, format) in source.row_formats() {
            output.set_row_format(row, copy_cell_format(format));
        }

        let mut pending = Vec::new();
        let mut texts = Vec::new();
        for (row, column, cell) in source.populated_cells() {
            let target = output.cell_mut(row, column);
            target.format = copy_cell_format(&cell.format);
            match cell.value.translatable_text() {
                Some(text) => {
                    pending.push((row, column));
                    texts.push(text.to_string());
                }
                None => target.value = cell.value.clone(),
            }
        }

        debug!("Sheet '{}': {} translatable cells", source.name, texts.len());
        let results = translate_all(&self.translator, texts).await;
        for ((row, column), text) in pending.into_iter().zip(results) {
            output.cell_mut(row, column).value = CellValue::Text(text);
        }
        output
    }
}

#[async_trait]
impl DocumentWalker for SpreadsheetWalker {
    type Document = Workbook;

    async fn walk(&self, source: &Workbook) -> Workbook {
        let total = source.sheets.len();
        let mut output = Workbook::new();

        for (index, sheet) in source.sheets.iter().enumerate() {
            info!("Translating sheet: {}", sheet.name);
            output.sheets.push(self.walk_sheet(sheet).await);
            report(&self.progress, index + 1, total);
        }
        output
    }
}

fn is_translatable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Leaf texts of a shape in visit order: own text, group children, table cells
fn collect_shape_texts(shape: &Shape, texts: &mut Vec<String>) {
    if let Some(text) = shape.text.as_deref().filter(|t| is_translatable(t)) {
        texts.push(text.to_string());
    }

    match &shape.content {
        ShapeContent::Group(children) => {
            for child in children {
                collect_shape_texts(child, texts);
            }
        }
        ShapeContent::Table(rows) => {
            for cell in rows.iter().flat_map(|row| &row.cells) {
                if is_translatable(&cell.text) {
                    texts.push(cell.text.clone());
                }
            }
        }
        ShapeContent::Plain | ShapeContent::Picture | ShapeContent::Connector => {}
    }
}

/// Write results back in the order `collect_shape_texts` produced them
fn apply_shape_texts<I: Iterator<Item = String>>(shape: &mut Shape, results: &mut I) {
    if let Some(text) = shape.text.as_mut().filter(|t| is_translatable(t)) {
        if let Some(translated) = results.next() {
            *text = translated;
        }
    }

    match &mut shape.content {
        ShapeContent::Group(children) => {
            for child in children {
                apply_shape_texts(child, results);
            }
        }
        ShapeContent::Table(rows) => {
            for cell in rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                if is_translatable(&cell.text) {
                    if let Some(translated) = results.next() {
                        cell.text = translated;
                    }
                }
            }
        }
        ShapeContent::Plain | ShapeContent::Picture | ShapeContent::Connector => {}
    }
}

/// Walker for presentations
pub struct PresentationWalker {
    translator: Translator,
    progress: Option<ProgressCallback>,
}

impl PresentationWalker {
    pub fn new(translator: Translator) -> Self {
        Self {
            translator,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    async fn walk_slide(&self, source: &Slide) -> Slide {
        let mut output = Slide {
            shapes: source.shapes.iter().map(copy_shape_structure).collect(),
            part_name: source.part_name.clone(),
        };

        let mut texts = Vec::new();
        for shape in &source.shapes {
            collect_shape_texts(shape, &mut texts);
        }

        let results = translate_all(&self.translator, texts).await;
        let mut results = results.into_iter();
        for shape in &mut output.shapes {
            apply_shape_texts(shape, &mut results);
        }
        output
    }
}

#[async_trait]
impl DocumentWalker for PresentationWalker {
    type Document = Presentation;

    async fn walk(&self, source: &Presentation) -> Presentation {
        let total = source.slides.len();
        let mut output = Presentation {
            slides: Vec::with_capacity(total),
            package: source.package.clone(),
        };

        for (index, slide) in source.slides.iter().enumerate() {
            info!("Translating slide {} of {}", index + 1, total);
            output.slides.push(self.walk_slide(slide).await);
            report(&self.progress, index + 1, total);
        }
        output
    }
}
