/*!
 * `.pptx` reader and writer.
 *
 * The shape tree of each slide is read from `p:cSld/p:spTree`. Saving
 * re-emits the source package part for part; a slide part is re-serialized
 * only when its text differs from the source. Changed text bodies keep their
 * body properties, list styles, paragraph properties and the first run's
 * character properties of each paragraph.
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::package::Package;
use super::xml::{XmlElement, XmlNode};
use crate::document::presentation::{LINE_BREAK, PARAGRAPH_SEPARATOR};
use crate::document::{Presentation, Shape, ShapeContent, Slide, TableCell, TableRow};
use crate::errors::CodecError;

const SHAPE_TREE_PATH: &[&str] = &["cSld", "spTree"];

/// DrawingML prefix used for newly created text elements
const DRAWING_PREFIX: &str = "a:";

/// Whether a shape tree child is a shape the model tracks
fn is_shape_element(element: &XmlElement) -> bool {
    matches!(
        element.local_name(),
        "sp" | "grpSp" | "graphicFrame" | "pic" | "cxnSp"
    )
}

/// Non-visual properties (`cNvPr`) of a shape element
fn non_visual_properties(element: &XmlElement) -> Option<&XmlElement> {
    element
        .elements()
        .find(|e| e.local_name().starts_with("nv"))
        .and_then(|nv| nv.find("cNvPr"))
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.find("t") {
                    text.push_str(&t.own_text());
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Text of a `txBody`: paragraphs joined by newlines
pub fn text_body_text(body: &XmlElement) -> String {
    body.find_all("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join(&PARAGRAPH_SEPARATOR.to_string())
}

fn table_element(frame: &XmlElement) -> Option<&XmlElement> {
    frame
        .find_path(&["graphic", "graphicData"])
        .and_then(|data| data.find("tbl"))
}

fn read_table(table: &XmlElement) -> Vec<TableRow> {
    table
        .find_all("tr")
        .map(|tr| TableRow {
            cells: tr
                .find_all("tc")
                .map(|tc| TableCell {
                    text: tc.find("txBody").map(text_body_text).unwrap_or_default(),
                })
                .collect(),
        })
        .collect()
}

fn read_shape(element: &XmlElement) -> Shape {
    let properties = non_visual_properties(element);
    let id = properties
        .and_then(|p| p.parse_attribute::<u32>("id"))
        .unwrap_or(0);
    let name = properties
        .and_then(|p| p.attribute("name"))
        .unwrap_or_default()
        .to_string();

    let text = match element.local_name() {
        "sp" => element.find("txBody").map(text_body_text),
        _ => None,
    };

    let content = match element.local_name() {
        "grpSp" => ShapeContent::Group(read_shape_tree(element)),
        "graphicFrame" => match table_element(element) {
            Some(table) => ShapeContent::Table(read_table(table)),
            None => ShapeContent::Plain,
        },
        "pic" => ShapeContent::Picture,
        "cxnSp" => ShapeContent::Connector,
        _ => ShapeContent::Plain,
    };

    Shape {
        id,
        name,
        text,
        content,
    }
}

/// Shapes of a shape tree or group in z-order
fn read_shape_tree(tree: &XmlElement) -> Vec<Shape> {
    tree.elements()
        .filter(|e| is_shape_element(e))
        .map(read_shape)
        .collect()
}

fn read_slide_shapes(root: &XmlElement, part: &str) -> Result<Vec<Shape>, CodecError> {
    let tree = root
        .find_path(SHAPE_TREE_PATH)
        .ok_or_else(|| CodecError::Malformed(format!("{} has no shape tree", part)))?;
    Ok(read_shape_tree(tree))
}

/// Slide part names in presentation order
fn slide_parts(package: &Package) -> Result<Vec<String>, CodecError> {
    let presentation_part = package.main_part()?;
    let presentation = package.xml(&presentation_part)?;
    let relationships = package.relationships(&presentation_part)?;

    let Some(list) = presentation.find("sldIdLst") else {
        return Ok(Vec::new());
    };

    list.find_all("sldId")
        .map(|entry| {
            let rel_id = entry.prefixed_attribute("id").ok_or_else(|| {
                CodecError::Malformed("slide entry without relationship id".to_string())
            })?;
            relationships
                .iter()
                .find(|r| r.id == rel_id)
                .map(|r| r.target.clone())
                .ok_or_else(|| CodecError::MissingPart(format!("relationship {} for slide", rel_id)))
        })
        .collect()
}

/// Read a presentation from a `.pptx` package
pub fn read_presentation(package: Package) -> Result<Presentation, CodecError> {
    let mut slides = Vec::new();
    for part in slide_parts(&package)? {
        let root = package.xml(&part)?;
        let shapes = read_slide_shapes(&root, &part)?;
        debug!("Read {} with {} top-level shapes", part, shapes.len());
        slides.push(Slide {
            shapes,
            part_name: Some(part),
        });
    }
    Ok(Presentation::with_package(slides, Arc::new(package)))
}

/// Formatting template taken from a source paragraph
struct ParagraphTemplate {
    prefix: String,
    paragraph_properties: Option<XmlElement>,
    run_properties: Option<XmlElement>,
    end_properties: Option<XmlElement>,
}

impl ParagraphTemplate {
    fn from_paragraph(paragraph: Option<&XmlElement>, prefix: &str) -> Self {
        let Some(paragraph) = paragraph else {
            return Self {
                prefix: prefix.to_string(),
                paragraph_properties: None,
                run_properties: None,
                end_properties: None,
            };
        };

        let end_properties = paragraph.find("endParaRPr").cloned();
        let run_properties = paragraph
            .elements()
            .filter(|e| matches!(e.local_name(), "r" | "fld"))
            .find_map(|r| r.find("rPr").cloned())
            .or_else(|| {
                end_properties.as_ref().map(|end| {
                    let mut rpr = end.clone();
                    rpr.name = format!("{}rPr", paragraph.prefix());
                    rpr
                })
            });

        Self {
            prefix: paragraph.prefix(),
            paragraph_properties: paragraph.find("pPr").cloned(),
            run_properties,
            end_properties,
        }
    }

    fn run(&self, text: &str) -> XmlElement {
        let mut run = XmlElement::new(format!("{}r", self.prefix));
        if let Some(rpr) = &self.run_properties {
            run.push(rpr.clone());
        }
        run.push(XmlElement::new(format!("{}t", self.prefix)).text(text));
        run
    }

    fn line_break(&self) -> XmlElement {
        let mut br = XmlElement::new(format!("{}br", self.prefix));
        if let Some(rpr) = &self.run_properties {
            br.push(rpr.clone());
        }
        br
    }

    fn paragraph(&self, text: &str) -> XmlElement {
        let mut paragraph = XmlElement::new(format!("{}p", self.prefix));
        if let Some(ppr) = &self.paragraph_properties {
            paragraph.push(ppr.clone());
        }
        for (index, segment) in text.split(LINE_BREAK).enumerate() {
            if index > 0 {
                paragraph.push(self.line_break());
            }
            if !segment.is_empty() {
                paragraph.push(self.run(segment));
            }
        }
        if let Some(end) = &self.end_properties {
            paragraph.push(end.clone());
        }
        paragraph
    }
}

/// Replace the paragraphs of a text body with `text`
fn rewrite_text_body(body: &mut XmlElement, text: &str) {
    let originals: Vec<XmlElement> = body.find_all("p").cloned().collect();

    let mut children: Vec<XmlNode> = body
        .children
        .drain(..)
        .filter(|node| !matches!(node, XmlNode::Element(e) if e.local_name() == "p"))
        .filter(|node| !matches!(node, XmlNode::Text(t) if t.trim().is_empty()))
        .collect();

    for (index, line) in text.split(PARAGRAPH_SEPARATOR).enumerate() {
        let source = originals.get(index).or(originals.last());
        let template = ParagraphTemplate::from_paragraph(source, DRAWING_PREFIX);
        children.push(XmlNode::Element(template.paragraph(line)));
    }
    body.children = children;
}

/// A fresh text body for an element that had none
fn new_text_body(name: String, prefix: &str) -> XmlElement {
    XmlElement::new(name)
        .child(XmlElement::new(format!("{}bodyPr", prefix)))
        .child(XmlElement::new(format!("{}lstStyle", prefix)))
}

fn apply_text(element: &mut XmlElement, body_name: String, text: &str) {
    let current = element.find("txBody").map(text_body_text);
    if current.as_deref() == Some(text) || (current.is_none() && text.is_empty()) {
        return;
    }
    if element.find("txBody").is_none() {
        element.push(new_text_body(body_name, DRAWING_PREFIX));
    }
    if let Some(body) = element.find_mut("txBody") {
        rewrite_text_body(body, text);
    }
}

fn apply_table(table: &mut XmlElement, rows: &[TableRow], part: &str) -> Result<(), CodecError> {
    let mismatch = || CodecError::Malformed(format!("table structure changed in {}", part));

    let tr_elements: Vec<&mut XmlElement> = table
        .elements_mut()
        .filter(|e| e.local_name() == "tr")
        .collect();
    if tr_elements.len() != rows.len() {
        return Err(mismatch());
    }

    for (tr, row) in tr_elements.into_iter().zip(rows) {
        let prefix = tr.prefix();
        let tc_elements: Vec<&mut XmlElement> = tr
            .elements_mut()
            .filter(|e| e.local_name() == "tc")
            .collect();
        if tc_elements.len() != row.cells.len() {
            return Err(mismatch());
        }
        for (tc, cell) in tc_elements.into_iter().zip(&row.cells) {
            apply_text(tc, format!("{}txBody", prefix), &cell.text);
        }
    }
    Ok(())
}

fn apply_shape(element: &mut XmlElement, shape: &Shape, part: &str) -> Result<(), CodecError> {
    let id = non_visual_properties(element).and_then(|p| p.parse_attribute::<u32>("id"));
    if id.unwrap_or(0) != shape.id {
        return Err(CodecError::Malformed(format!(
            "shape {} does not match source shape {:?} in {}",
            shape.id, id, part
        )));
    }

    let is_text_shape = element.local_name() == "sp";
    if let (Some(text), true) = (&shape.text, is_text_shape) {
        let body_name = format!("{}txBody", element.prefix());
        apply_text(element, body_name, text);
    }

    match &shape.content {
        ShapeContent::Group(children) => apply_shape_tree(element, children, part)?,
        ShapeContent::Table(rows) => {
            let table = element
                .find_path_mut(&["graphic", "graphicData"])
                .and_then(|data| data.find_mut("tbl"))
                .ok_or_else(|| CodecError::Malformed(format!("table {} missing in {}", shape.id, part)))?;
            apply_table(table, rows, part)?;
        }
        _ => {}
    }
    Ok(())
}

fn apply_shape_tree(tree: &mut XmlElement, shapes: &[Shape], part: &str) -> Result<(), CodecError> {
    let elements: Vec<&mut XmlElement> = tree
        .elements_mut()
        .filter(|e| is_shape_element(e))
        .collect();
    if elements.len() != shapes.len() {
        return Err(CodecError::Malformed(format!(
            "{} has {} shapes but the document has {}",
            part,
            elements.len(),
            shapes.len()
        )));
    }
    for (element, shape) in elements.into_iter().zip(shapes) {
        apply_shape(element, shape, part)?;
    }
    Ok(())
}

/// Write a presentation back over its source package
pub fn save_presentation(presentation: &Presentation, path: &Path) -> Result<(), CodecError> {
    let package = presentation.package.as_ref().ok_or_else(|| {
        CodecError::Malformed("presentation was not read from a package".to_string())
    })?;

    let mut replacements = HashMap::new();
    for slide in &presentation.slides {
        let part = slide
            .part_name
            .as_deref()
            .ok_or_else(|| CodecError::Malformed("slide without a source part".to_string()))?;

        let mut root = package.xml(part)?;
        if read_slide_shapes(&root, part)? == slide.shapes {
            continue;
        }

        let tree = root
            .find_path_mut(SHAPE_TREE_PATH)
            .ok_or_else(|| CodecError::Malformed(format!("{} has no shape tree", part)))?;
        apply_shape_tree(tree, &slide.shapes, part)?;
        replacements.insert(part.to_string(), root.to_bytes()?);
    }

    debug!("Rewriting {} slide parts", replacements.len());
    package.save(path, &replacements)
}
