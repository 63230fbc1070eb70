/*!
 * Presentation document model.
 *
 * Slides hold an ordered shape tree. A shape's text field and its structural
 * content are independent: the walker applies the text rule and the
 * group/table rules separately, so a shape may carry text and children at
 * the same time.
 */

use std::sync::Arc;

use crate::codec::package::Package;

/// Separator between paragraphs of a text body
pub const PARAGRAPH_SEPARATOR: char = '\n';

/// Soft line break inside a paragraph
pub const LINE_BREAK: char = '\u{000B}';

/// A cell of a table shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableCell {
    pub text: String,
}

impl TableCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A row of a table shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(TableCell::new).collect(),
        }
    }
}

/// Structural content of a shape
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ShapeContent {
    /// No nested structure (autoshape, placeholder, text box)
    #[default]
    Plain,
    /// Group of child shapes in z-order
    Group(Vec<Shape>),
    /// Table rows
    Table(Vec<TableRow>),
    Picture,
    Connector,
}

/// A shape on a slide
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    /// Shape id unique within its slide
    pub id: u32,
    pub name: String,
    /// Text field, absent for shapes without a text body
    pub text: Option<String>,
    pub content: ShapeContent,
}

impl Shape {
    pub fn text_box(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            name: format!("TextBox {}", id),
            text: Some(text.into()),
            content: ShapeContent::Plain,
        }
    }

    pub fn group(id: u32, children: Vec<Shape>) -> Self {
        Self {
            id,
            name: format!("Group {}", id),
            text: None,
            content: ShapeContent::Group(children),
        }
    }

    pub fn table(id: u32, rows: Vec<TableRow>) -> Self {
        Self {
            id,
            name: format!("Table {}", id),
            text: None,
            content: ShapeContent::Table(rows),
        }
    }

    pub fn picture(id: u32) -> Self {
        Self {
            id,
            name: format!("Picture {}", id),
            text: None,
            content: ShapeContent::Picture,
        }
    }

    /// Nesting depth of this shape's group tree (1 for a leaf shape)
    pub fn depth(&self) -> usize {
        match &self.content {
            ShapeContent::Group(children) => {
                1 + children.iter().map(Shape::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }
}

/// A slide
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slide {
    pub shapes: Vec<Shape>,
    /// Package part holding this slide, when read from a file
    pub part_name: Option<String>,
}

impl Slide {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            part_name: None,
        }
    }
}

/// A presentation document
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    pub slides: Vec<Slide>,
    /// Source package re-emitted on save; only slide text is rewritten
    pub(crate) package: Option<Arc<Package>>,
}

impl Presentation {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            package: None,
        }
    }

    pub(crate) fn with_package(slides: Vec<Slide>, package: Arc<Package>) -> Self {
        Self {
            slides,
            package: Some(package),
        }
    }
}

impl PartialEq for Presentation {
    fn eq(&self, other: &Self) -> bool {
        self.slides == other.slides
    }
}
