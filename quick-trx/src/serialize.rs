// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Document`.

use crate::{Document, Element, Node, SerializeError};
use quick_xml::{
    Writer,
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::io;

static XMLNS_ATTR: &str = "xmlns";
static XMLNS_PREFIX: &str = "xmlns:";

pub(crate) fn serialize_document(
    document: &Document,
    writer: impl io::Write,
) -> Result<(), SerializeError> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_element(&document.root, None, &mut writer)?;

    // Add a trailing newline.
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn serialize_element(
    element: &Element,
    parent_namespace: Option<&str>,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Element {
        name,
        namespace,
        attributes,
        prefixes,
        children,
    } = element;

    let mut tag = BytesStart::new(name.as_str());
    // Only the default namespace is ever declared, and only where it changes.
    let namespace = namespace.as_deref();
    if namespace != parent_namespace {
        tag.push_attribute((XMLNS_ATTR, namespace.unwrap_or("")));
    }
    // Prefixes are only ever used by attributes, and are declared where they are used.
    for (prefix, uri) in prefixes {
        let declaration = format!("{XMLNS_PREFIX}{prefix}");
        tag.push_attribute((declaration.as_str(), uri.as_str()));
    }
    for (k, v) in attributes {
        tag.push_attribute((k.as_str(), v.as_str()));
    }

    if children.is_empty() {
        writer.write_event(Event::Empty(tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(tag))?;
    for child in children {
        match child {
            Node::Element(child) => serialize_element(child, namespace, writer)?,
            Node::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            Node::CData(text) => {
                writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
            }
            Node::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_document() -> Document {
        let mut output = Element::new("Output");
        output
            .set_namespace(Some("urn:trx"))
            .add_child(Node::Text("a < b & \"c\"".to_owned()));

        let mut result = Element::new("UnitTestResult");
        result
            .set_namespace(Some("urn:trx"))
            .set_attribute("testId", "1")
            .set_attribute("testName", "Adds <two> numbers")
            .add_child(output);

        let mut results = Element::new("Results");
        results.set_namespace(Some("urn:trx")).add_child(result);

        let mut foreign = Element::new("Foreign");
        foreign.add_child(Node::CData("raw <data>".to_owned()));

        let mut root = Element::new("TestRun");
        root.set_namespace(Some("urn:trx"))
            .add_child(results)
            .add_child(foreign);
        Document::new(root)
    }

    #[test]
    fn namespace_is_declared_only_where_it_changes() {
        let xml = sample_document().to_string().expect("serializing succeeds");

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"), "{xml}");
        assert!(xml.contains("<TestRun xmlns=\"urn:trx\">"), "{xml}");
        assert!(xml.contains("<Results>"), "{xml}");
        assert!(xml.contains("<Foreign xmlns=\"\">"), "{xml}");
        assert_eq!(xml.matches("xmlns=").count(), 2, "{xml}");
        assert!(xml.ends_with('\n'));
    }

    #[test]
    fn qualified_attributes_are_declared() {
        let mut result = Element::new("UnitTestResult");
        result
            .set_attribute("type", "plain")
            .set_attribute("ext:type", "prefixed")
            .declare_prefix("ext", "urn:ext");
        let document = Document::new(result);

        let xml = document.to_string().expect("serializing succeeds");
        assert!(
            xml.contains(r#"<UnitTestResult xmlns:ext="urn:ext" type="plain" ext:type="prefixed"/>"#),
            "{xml}"
        );
        let reread = Document::from_slice(xml.as_bytes()).expect("output parses");
        assert_eq!(reread, document);
    }

    #[test]
    fn whitespace_only_text_is_kept() {
        let mut std_out = Element::new("StdOut");
        std_out.add_child(Node::Text("   ".to_owned()));
        let mut output = Element::new("Output");
        output.add_child(std_out);
        let document = Document::new(output);

        let xml = document.to_string().expect("serializing succeeds");
        assert!(xml.contains("<StdOut>   </StdOut>"), "{xml}");
        let reread = Document::from_slice(xml.as_bytes()).expect("output parses");
        assert_eq!(reread, document);
    }

    #[test]
    fn serialized_document_reads_back() {
        let document = sample_document();
        let xml = document.to_string().expect("serializing succeeds");
        let reread = Document::from_slice(xml.as_bytes()).expect("output parses");
        assert_eq!(reread, document);
    }
}
