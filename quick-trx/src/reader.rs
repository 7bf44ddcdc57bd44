// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read a `Document`, resolving namespace prefixes along the way.

use crate::{Document, Element, Node, ParseError};
use indexmap::map::IndexMap;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{io, str};

static XMLNS_ATTR: &[u8] = b"xmlns";
static XMLNS_PREFIX: &str = "xmlns";
static XML_PREFIX: &str = "xml";
static XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn read_document(input: impl io::BufRead) -> Result<Document, ParseError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut scopes = NamespaceScopes::default();
    // Elements that have been started but not yet closed, innermost last.
    let mut open: Vec<Element> = vec![];
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let element = start_element(&start, &mut scopes)?;
                open.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&start, &mut scopes)?;
                scopes.pop();
                close_element(element, &mut open, &mut root)?;
            }
            Event::End(_) => {
                // The reader has already checked that this matches the innermost start tag.
                scopes.pop();
                if let Some(element) = open.pop() {
                    close_element(element, &mut open, &mut root)?;
                }
            }
            Event::Text(text) => {
                if let Some(parent) = open.last_mut() {
                    parent.children.push(Node::Text(text.unescape()?.into_owned()));
                }
            }
            Event::CData(cdata) => {
                if let Some(parent) = open.last_mut() {
                    parent
                        .children
                        .push(Node::CData(str::from_utf8(&cdata)?.to_owned()));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = open.last_mut() {
                    parent
                        .children
                        .push(Node::Comment(str::from_utf8(&comment)?.to_owned()));
                }
            }
            Event::Eof => break,
            // The declaration, doctype and processing instructions are not retained.
            _ => {}
        }
        buf.clear();
    }

    if let Some(element) = open.last() {
        return Err(ParseError::UnclosedElement {
            name: element.name.clone(),
        });
    }

    root.map(Document::new).ok_or(ParseError::NoRootElement)
}

fn start_element(
    start: &BytesStart<'_>,
    scopes: &mut NamespaceScopes,
) -> Result<Element, ParseError> {
    let mut bindings = vec![];
    let mut attributes = IndexMap::new();
    // Prefixes of qualified attribute names, resolved once this element's declarations are known.
    let mut attribute_prefixes = vec![];

    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        let key = attr.key;

        if key.as_ref() == XMLNS_ATTR {
            bindings.push(Binding {
                prefix: None,
                uri: value,
            });
            continue;
        }

        let local_name = str::from_utf8(key.local_name().into_inner())?;
        match key.prefix() {
            Some(prefix) if prefix.as_ref() == XMLNS_PREFIX.as_bytes() => {
                bindings.push(Binding {
                    prefix: Some(local_name.to_owned()),
                    uri: value,
                });
            }
            Some(prefix) => {
                let prefix = str::from_utf8(prefix.into_inner())?;
                if prefix != XML_PREFIX && !attribute_prefixes.contains(&prefix) {
                    attribute_prefixes.push(prefix);
                }
                attributes.insert(str::from_utf8(key.into_inner())?.to_owned(), value);
            }
            None => {
                attributes.insert(local_name.to_owned(), value);
            }
        }
    }

    // Declarations on an element are in scope for the element's own name and attributes.
    scopes.push(bindings);

    let mut prefixes = IndexMap::new();
    for prefix in attribute_prefixes {
        if let Some(uri) = scopes.resolve(Some(prefix))? {
            prefixes.insert(prefix.to_owned(), uri);
        }
    }

    let name = start.name();
    let prefix = name
        .prefix()
        .map(|prefix| str::from_utf8(prefix.into_inner()))
        .transpose()?;
    let namespace = scopes.resolve(prefix)?;

    Ok(Element {
        name: str::from_utf8(name.local_name().into_inner())?.to_owned(),
        namespace,
        attributes,
        prefixes,
        children: vec![],
    })
}

fn close_element(
    mut element: Element,
    open: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    // Whitespace next to child markup is indentation. In a text-only element it is content.
    let has_markup = element
        .children
        .iter()
        .any(|child| matches!(child, Node::Element(_) | Node::Comment(_)));
    if has_markup {
        element
            .children
            .retain(|child| !matches!(child, Node::Text(text) if text.trim().is_empty()));
    }

    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(ParseError::MultipleRoots { name: element.name });
        }
        None => *root = Some(element),
    }
    Ok(())
}

#[derive(Debug)]
struct Binding {
    prefix: Option<String>,
    uri: String,
}

/// Namespace declarations in scope, one frame per open element.
#[derive(Debug, Default)]
struct NamespaceScopes {
    frames: Vec<Vec<Binding>>,
}

impl NamespaceScopes {
    fn push(&mut self, bindings: Vec<Binding>) {
        self.frames.push(bindings);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: Option<&str>) -> Result<Option<String>, ParseError> {
        if prefix == Some(XML_PREFIX) {
            return Ok(Some(XML_NAMESPACE.to_owned()));
        }

        let binding = self
            .frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|binding| binding.prefix.as_deref() == prefix);

        match (binding, prefix) {
            // `xmlns=""` takes the element out of any default namespace.
            (Some(binding), _) if binding.uri.is_empty() => Ok(None),
            (Some(binding), _) => Ok(Some(binding.uri.clone())),
            (None, None) => Ok(None),
            (None, Some(prefix)) => Err(ParseError::UnboundPrefix {
                prefix: prefix.to_owned(),
            }),
        }
    }
}
