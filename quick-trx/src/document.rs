// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ParseError, SerializeError, namespace::rewrite_namespace, reader::read_document,
    serialize::serialize_document,
};
use indexmap::map::IndexMap;
use std::{io, slice};

/// An XML document: a single root element plus everything nested inside it.
///
/// The XML declaration, document type and any top-level comments or processing instructions are
/// not retained. [`Document::serialize`] always writes a UTF-8 declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The root element of this document.
    pub root: Element,
}

impl Document {
    /// Creates a new `Document` with the given root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parses a document from a byte slice.
    ///
    /// Namespace prefixes are resolved while reading: every element in the returned tree carries
    /// its local name and the namespace URI it was bound to, if any. Namespace declarations
    /// (`xmlns` and `xmlns:*`) are consumed and do not appear as attributes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        read_document(bytes)
    }

    /// Parses a document from a buffered reader.
    pub fn from_reader(reader: impl io::BufRead) -> Result<Self, ParseError> {
        read_document(reader)
    }

    /// Returns the namespace of the root element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.root.namespace.as_deref()
    }

    /// Moves every element in this document into `namespace`.
    ///
    /// A blank `namespace` leaves the document untouched.
    pub fn replace_all_namespaces(&mut self, namespace: &str) -> &mut Self {
        if !namespace.trim().is_empty() {
            rewrite_namespace(&mut self.root, Some(namespace));
        }
        self
    }

    /// Serialize this document to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_document(self, writer)
    }

    /// Serialize this document to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        String::from_utf8(buf).map_err(|err| SerializeError::Utf8(err.utf8_error()))
    }
}

/// An XML element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// The local name of this element, without any prefix.
    pub name: String,

    /// The namespace URI this element belongs to, or `None` if it isn't in a namespace.
    pub namespace: Option<String>,

    /// Attributes, in document order.
    ///
    /// Unprefixed attributes are keyed by their name. Prefixed attributes keep their qualified
    /// name (e.g. `xml:space` or `ext:kind`), so they never collide with an unprefixed attribute
    /// of the same local name.
    pub attributes: IndexMap<String, String>,

    /// Namespace URIs for the prefixes used by qualified attribute names, other than `xml`.
    ///
    /// These are declared on this element when it is serialized.
    pub prefixes: IndexMap<String, String>,

    /// Child nodes, in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates a new, empty element without a namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: IndexMap::new(),
            prefixes: IndexMap::new(),
            children: vec![],
        }
    }

    /// Sets the namespace of this element only. Children are not affected.
    pub fn set_namespace(&mut self, namespace: Option<&str>) -> &mut Self {
        self.namespace = namespace.map(str::to_owned);
        self
    }

    /// Returns the value of the attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute, replacing any existing value but keeping its position.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Binds `prefix` to `uri` for the qualified attribute names of this element.
    pub fn declare_prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        self.prefixes.insert(prefix.into(), uri.into());
        self
    }

    /// Appends a child node.
    pub fn add_child(&mut self, child: impl Into<Node>) -> &mut Self {
        self.children.push(child.into());
        self
    }

    /// Appends several child nodes.
    pub fn add_children(&mut self, children: impl IntoIterator<Item = impl Into<Node>>) -> &mut Self {
        for child in children {
            self.add_child(child);
        }
        self
    }

    /// Iterates over the direct child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Iterates over all elements nested below this one (at any depth) with the given local name,
    /// in document order. The element itself is not included.
    pub fn descendants<'n>(&self, name: &'n str) -> Descendants<'_, 'n> {
        Descendants {
            name,
            stack: vec![self.children.iter()],
        }
    }

    /// Returns the first element below this one with the given local name.
    pub fn first_descendant(&self, name: &str) -> Option<&Element> {
        self.descendants(name).next()
    }
}

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),

    /// Character data, unescaped.
    Text(String),

    /// A `<![CDATA[...]]>` section, stored verbatim.
    CData(String),

    /// A comment, stored verbatim.
    Comment(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Iterator returned by [`Element::descendants`].
#[derive(Clone, Debug)]
pub struct Descendants<'a, 'n> {
    name: &'n str,
    stack: Vec<slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a, '_> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(Node::Element(element)) => {
                    self.stack.push(element.children.iter());
                    if element.name == self.name {
                        return Some(element);
                    }
                }
                Some(_) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
