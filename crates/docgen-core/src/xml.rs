//! Minimal owned XML tree over quick-xml events
//!
//! WordprocessingML parts are small enough to hold in memory, and editing
//! run text is far simpler on a tree than on an event stream. The tree keeps
//! raw start-tag bytes (name, namespaces and attributes) so that everything
//! outside the edited text nodes is written back as it was read.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML at byte {position}: {source}")]
    Parse {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Unbalanced XML: {0}")]
    Unbalanced(String),

    #[error("XML part is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Failed to write XML: {0}")]
    Write(#[from] quick_xml::Error),
}

/// A node in the tree
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    /// Declarations, comments, CDATA and processing instructions, kept verbatim
    Other(Event<'static>),
}

/// An element with its raw start tag and children
#[derive(Debug, Clone)]
pub struct XmlElement {
    start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
    self_closing: bool,
}

impl XmlElement {
    /// Qualified tag name, e.g. `w:p`
    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    pub fn is(&self, qualified_name: &str) -> bool {
        self.name() == qualified_name.as_bytes()
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        self.start
            .try_get_attribute(key)
            .ok()
            .flatten()
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Add an attribute unless one with the same key already exists.
    pub fn ensure_attribute(&mut self, key: &str, value: &str) {
        if self.attribute(key).is_none() {
            self.start.push_attribute((key, value));
        }
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace all children with a single text node (or nothing, if empty).
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for child in &el.children {
        match child {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(inner) => collect_text(inner, out),
            XmlNode::Other(_) => {}
        }
    }
}

/// A parsed XML part: prolog nodes, one root element, trailing nodes
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut nodes = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|source| XmlError::Parse {
                position: reader.buffer_position(),
                source,
            })?;

            let node = match event {
                Event::Start(start) => {
                    stack.push(XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: false,
                    });
                    continue;
                }
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::Unbalanced(format!(
                            "closing tag </{}> without opening tag",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    XmlNode::Element(element)
                }
                Event::Empty(start) => XmlNode::Element(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    self_closing: true,
                }),
                Event::Text(text) => {
                    let unescaped = text.unescape().map_err(|source| XmlError::Parse {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    XmlNode::Text(unescaped.into_owned())
                }
                Event::Eof => break,
                other => XmlNode::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Unbalanced(format!(
                "element <{}> is never closed",
                String::from_utf8_lossy(open.name())
            )));
        }

        Ok(Self { nodes })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        Self::parse(std::str::from_utf8(bytes)?)
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), XmlError> {
    match node {
        XmlNode::Element(el) if el.self_closing && el.children.is_empty() => {
            writer.write_event(Event::Empty(el.start.borrow()))?;
        }
        XmlNode::Element(el) => {
            writer.write_event(Event::Start(el.start.borrow()))?;
            for child in &el.children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(el.start.to_end()))?;
        }
        XmlNode::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        }
        XmlNode::Other(event) => {
            writer.write_event(event.borrow())?;
        }
    }
    Ok(())
}
