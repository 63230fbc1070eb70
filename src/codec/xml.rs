/*!
 * Minimal XML element tree over quick-xml.
 *
 * Styles, relationship and slide parts are small enough to hold in memory,
 * and the presentation writer needs random access to siblings, so those parts
 * are parsed into an owned tree. Worksheets are streamed by the workbook
 * reader instead. Qualified names are kept verbatim (`a:t`, `p:sp`) so
 * serialization reproduces the source prefixes.
 */

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::CodecError;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn prefix_part(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: append a child element
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: append a text node
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace prefix including the colon, or an empty string
    pub fn prefix(&self) -> String {
        prefix_part(&self.name)
            .map(|p| format!("{}:", p))
            .unwrap_or_default()
    }

    /// Attribute by exact qualified name
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Prefixed attribute by local name, e.g. `r:id` for `"id"`
    pub fn prefixed_attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| prefix_part(k).is_some() && local_part(k) == local)
            .map(|(_, v)| v.as_str())
    }

    pub fn parse_attribute<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.attribute(key).and_then(|v| v.trim().parse().ok())
    }

    /// OOXML boolean attribute (`1`, `true`, `on`)
    pub fn bool_attribute(&self, key: &str) -> Option<bool> {
        self.attribute(key)
            .map(|v| matches!(v.trim(), "1" | "true" | "on"))
    }

    /// Child elements in order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// All child elements with the given local name
    pub fn find_all<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// Follow a path of local names through first matches
    pub fn find_path(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |element, local| element.find(local))
    }

    pub fn find_path_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in path {
            current = current.find_mut(local)?;
        }
        Some(current)
    }

    /// Concatenated text of direct text children
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Parse a complete XML part
    pub fn parse(bytes: &[u8], part: &str) -> Result<XmlElement, CodecError> {
        let xml_error = |message: String| CodecError::Xml {
            part: part.to_string(),
            message,
        };

        let source = std::str::from_utf8(bytes)
            .map_err(|e| xml_error(format!("invalid UTF-8: {}", e)))?;
        let source = source.trim_start_matches('\u{feff}');

        let mut reader = Reader::from_str(source);
        reader.trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(Self::from_start(&e).map_err(xml_error)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::from_start(&e).map_err(xml_error)?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| xml_error("unbalanced end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(t)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| xml_error(e.to_string()))?;
                        if !text.is_empty() {
                            parent.children.push(XmlNode::Text(text.into_owned()));
                        }
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(xml_error(format!(
                        "at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if !stack.is_empty() {
            return Err(xml_error("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| xml_error("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<XmlElement, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = XmlElement::new(name);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None => *root = Some(element),
        }
    }

    /// Serialize as a standalone part with an XML declaration
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let io_error = |e: quick_xml::Error| CodecError::Xml {
            part: self.name.clone(),
            message: e.to_string(),
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(io_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\r\n")))
            .map_err(io_error)?;
        self.write_into(&mut writer).map_err(io_error)?;

        Ok(writer.into_inner().into_inner())
    }

    fn write_into(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), quick_xml::Error> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(writer)?,
                XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}
