//! Owned element tree over `quick-xml` events.
//!
//! Elements keep their qualified name, unescaped attributes in source order,
//! and children. Everything else (declaration, doctype, comments, text, CDATA,
//! processing instructions) is kept as the parsed event so that untouched
//! markup serializes back unchanged.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{MapError, Result, TEMPLATE_SOURCE_URL};

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<name/>` when it still has no children.
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
        }
    }

    fn from_start(start: &BytesStart<'_>, self_closing: bool) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(MapError::xml)?
            .to_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(MapError::xml)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(MapError::xml)?
                .to_owned();
            let value = attr.unescape_value().map_err(MapError::xml)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            self_closing,
        })
    }

    /// Name without any namespace prefix (`svg:g` → `g`).
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute in place, or append it if absent.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_owned(), value)),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn push(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Child elements, skipping text and other events.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Other(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Other(_) => None,
        })
    }

    /// Concatenated, unescaped text and CDATA of the direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Other(Event::Text(t)) => match t.unescape() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(&String::from_utf8_lossy(t)),
                },
                Node::Other(Event::CData(c)) => out.push_str(&String::from_utf8_lossy(c)),
                _ => {}
            }
        }
        out
    }

    /// Pre-order list of this element and all element descendants.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_pre_order(&mut out);
        out
    }

    fn collect_pre_order<'a>(&'a self, out: &mut Vec<&'a Element>) {
        out.push(self);
        for child in self.elements() {
            child.collect_pre_order(out);
        }
    }

    /// Visit every element of this subtree, children before their parent.
    pub fn visit_post_order_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        for child in self.elements_mut() {
            child.visit_post_order_mut(f);
        }
        f(self);
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        if self.children.is_empty() && self.self_closing {
            writer.write_event(Event::Empty(start)).map_err(MapError::xml)?;
            return Ok(());
        }
        writer.write_event(Event::Start(start)).map_err(MapError::xml)?;
        for child in &self.children {
            write_node(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(MapError::xml)?;
        Ok(())
    }
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(e) => e.write(writer),
        Node::Other(event) => writer.write_event(event.clone()).map_err(MapError::xml),
    }
}

/// A parsed template: top-level prolog/epilog events around one root element.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| MapError::Xml {
                message: format!("at byte {}: {e}", reader.buffer_position()),
            })?;
            match event {
                Event::Start(e) => stack.push(Element::from_start(&e, false)?),
                Event::Empty(e) => {
                    let el = Element::from_start(&e, true)?;
                    attach(&mut stack, &mut nodes, Node::Element(el));
                }
                Event::End(e) => {
                    let Some(el) = stack.pop() else {
                        return Err(MapError::xml(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    };
                    attach(&mut stack, &mut nodes, Node::Element(el));
                }
                Event::Eof => break,
                other => attach(&mut stack, &mut nodes, Node::Other(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(MapError::xml(format!("unclosed element <{}>", open.name)));
        }
        if !nodes.iter().any(|n| matches!(n, Node::Element(_))) {
            return Err(MapError::xml("document has no root element"));
        }
        Ok(Self { nodes })
    }

    /// Read the template from disk. A missing file is reported with a pointer
    /// to where the blank map can be downloaded.
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            MapError::asset(
                path,
                e,
                format!(
                    "please download '{TEMPLATE_SOURCE_URL}' and save it under the 'res' folder"
                ),
            )
        })?;
        Self::parse(&text)
    }

    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Other(_) => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Other(_) => None,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }

    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).map_err(MapError::xml)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| MapError::io(path, e))
    }
}

fn attach(stack: &mut [Element], nodes: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.push(node),
        None => nodes.push(node),
    }
}
