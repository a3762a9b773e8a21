//! XML document handling
//!
//! Schema documents are parsed into an arena of element nodes. Nodes keep a
//! link to their parent, their resolved namespace and the source line they
//! start on. [`NodeRef`] is the read-only handle the resolution code works
//! through; nothing outside this module touches the parser.

use crate::error::{Error, ParseError, Result};
use crate::namespaces::QName;
use crate::XML_NAMESPACE;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Index of a node inside its document
pub type NodeId = usize;

/// XML element in the document arena
#[derive(Debug, Clone)]
struct NodeData {
    /// Element qualified name (namespace resolved)
    qname: QName,
    /// Attributes by local name, in document order
    attributes: IndexMap<String, String>,
    /// Namespace declarations made on this element; the default namespace
    /// uses the empty prefix
    namespaces: Vec<(String, String)>,
    /// First non-blank text before any child element
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// 1-based line of the start tag
    line: usize,
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    /// Location the document was read from
    uri: String,
    nodes: Vec<NodeData>,
}

/// Tracks line numbers while the reader moves forward through the input.
struct LineCounter<'x> {
    input: &'x [u8],
    pos: usize,
    line: usize,
}

impl<'x> LineCounter<'x> {
    fn new(input: &'x [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    /// Line of the first non-whitespace byte at or after `offset`
    fn line_of_tag(&mut self, offset: usize) -> usize {
        let mut start = offset.min(self.input.len());
        while start < self.input.len() && self.input[start].is_ascii_whitespace() {
            start += 1;
        }
        if start > self.pos {
            self.line += self.input[self.pos..start]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.pos = start;
        }
        self.line
    }
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str, uri: impl Into<String>) -> Result<Self> {
        Self::parse(xml.as_bytes(), uri)
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], uri: impl Into<String>) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut doc = Document {
            uri: uri.into(),
            nodes: Vec::new(),
        };
        let mut element_stack: Vec<NodeId> = Vec::new();
        let mut lines = LineCounter::new(xml);
        let mut buf = Vec::new();

        loop {
            let offset = reader.buffer_position();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let line = lines.line_of_tag(offset);
                    let id = doc.open_element(&e, element_stack.last().copied(), line)?;
                    element_stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    let line = lines.line_of_tag(offset);
                    doc.open_element(&e, element_stack.last().copied(), line)?;
                }
                Ok(Event::End(_)) => {
                    element_stack.pop();
                }
                Ok(Event::Text(e)) => {
                    if let Some(&current) = element_stack.last() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                        doc.add_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(&current) = element_stack.last() {
                        let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                        doc.add_text(current, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {} in {}: {}",
                        reader.buffer_position(),
                        doc.uri,
                        e
                    )))
                }
                _ => {} // Comments, processing instructions, declarations
            }
            buf.clear();
        }

        if doc.nodes.is_empty() {
            return Err(Error::Parse(
                ParseError::new("Empty document").with_location(doc.uri.clone()),
            ));
        }

        Ok(doc)
    }

    /// Add an element node from a start tag
    fn open_element(&mut self, start: &BytesStart, parent: Option<NodeId>, line: usize) -> Result<NodeId> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut attributes = IndexMap::new();
        let mut namespaces = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.push((String::new(), attr_value));
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.push((prefix.to_string(), attr_value));
            } else {
                let local = match attr_name.split_once(':') {
                    Some((_, local)) => local.to_string(),
                    None => attr_name,
                };
                attributes.insert(local, attr_value);
            }
        }

        let id = self.nodes.len();
        self.nodes.push(NodeData {
            qname: QName::local(name.clone()),
            attributes,
            namespaces,
            text: None,
            parent,
            children: Vec::new(),
            line,
        });

        let (prefix, local) = match name.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", name.as_str()),
        };
        let namespace = self.lookup_namespace(id, prefix);
        if namespace.is_none() && !prefix.is_empty() {
            return Err(Error::Xml(format!(
                "Unbound namespace prefix '{}' at {}:{}",
                prefix, self.uri, line
            )));
        }
        self.nodes[id].qname = QName::new(namespace, local);

        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        Ok(id)
    }

    /// Resolve a prefix through the declarations in scope at `id`
    fn lookup_namespace(&self, id: NodeId, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id];
            if let Some((_, uri)) = node.namespaces.iter().find(|(p, _)| p == prefix) {
                return if uri.is_empty() { None } else { Some(uri.clone()) };
            }
            current = node.parent;
        }
        None
    }

    /// Keep the text that precedes the first child element; later text is
    /// tail text of a child and is dropped.
    fn add_text(&mut self, id: NodeId, text: &str) {
        let node = &mut self.nodes[id];
        if !node.children.is_empty() || text.trim().is_empty() {
            return;
        }
        match &mut node.text {
            Some(existing) => existing.push_str(text),
            None => node.text = Some(text.to_string()),
        }
    }

    /// Location the document was read from
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the root element
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { doc: self, id: 0 }
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        if id < self.nodes.len() {
            Some(NodeRef { doc: self, id })
        } else {
            None
        }
    }

    /// Number of element nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the document holds no elements (never the case once parsed)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Read-only handle to an element of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.id]
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef { doc: self.doc, id }
    }

    /// Node id within its document
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The owning document
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Qualified name of the element
    pub fn qname(&self) -> &'a QName {
        &self.data().qname
    }

    /// Local name of the element
    pub fn local_name(&self) -> &'a str {
        &self.data().qname.local_name
    }

    /// Namespace URI of the element
    pub fn namespace(&self) -> Option<&'a str> {
        self.data().qname.namespace.as_deref()
    }

    /// Get an attribute value by local name
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data().attributes.get(name).map(|s| s.as_str())
    }

    /// True if the attribute is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.data().attributes.contains_key(name)
    }

    /// Attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.data()
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Namespace declarations made on this element
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.data()
            .namespaces
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Parent element
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.at(id))
    }

    /// Ancestors, nearest first
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Direct child elements
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.data()
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    /// Direct child elements with the given local name, in any namespace
    pub fn children_named(&self, local_name: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children().filter(move |c| c.local_name() == local_name)
    }

    /// First direct child with the given local name
    pub fn child_named(&self, local_name: &'a str) -> Option<NodeRef<'a>> {
        self.children_named(local_name).next()
    }

    /// All descendant elements in document order (excluding self)
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            doc: self.doc,
            stack: self.data().children.iter().rev().copied().collect(),
        }
    }

    /// Descendant elements with the given local name, in any namespace
    pub fn descendants_named(&self, local_name: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.descendants().filter(move |d| d.local_name() == local_name)
    }

    /// First descendant with the given local name
    pub fn descendant_named(&self, local_name: &'a str) -> Option<NodeRef<'a>> {
        self.descendants_named(local_name).next()
    }

    /// The text directly inside this element, before any child
    pub fn own_text(&self) -> Option<&'a str> {
        self.data().text.as_deref()
    }

    /// The first non-blank text in this element's subtree with `\n`, `\t`
    /// and `\r` removed; empty when there is none.
    pub fn text(&self) -> String {
        std::iter::once(*self)
            .chain(self.descendants())
            .find_map(|node| node.own_text())
            .map(|text| text.chars().filter(|c| !matches!(c, '\n' | '\t' | '\r')).collect())
            .unwrap_or_default()
    }

    /// 1-based line of the element's start tag
    pub fn source_line(&self) -> usize {
        self.data().line
    }

    /// `uri:line` of the element, for diagnostics
    pub fn location(&self) -> String {
        format!("{}:{}", self.doc.uri, self.source_line())
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Iterator over the ancestors of a node, nearest first
pub struct Ancestors<'a> {
    next: Option<NodeRef<'a>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Depth-first iterator over the descendants of a node
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id].children.iter().rev().copied());
        Some(NodeRef { doc: self.doc, id })
    }
}
