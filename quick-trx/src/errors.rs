// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::events::attributes::AttrError;
use std::{io, str::Utf8Error};
use thiserror::Error;

/// An error that occurs while reading a [`Document`](crate::Document).
///
/// Returned by [`Document::from_slice`](crate::Document::from_slice) and
/// [`Document::from_reader`](crate::Document::from_reader).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The input is not well-formed XML.
    #[error("XML syntax error")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("malformed attribute")]
    Attribute(#[from] AttrError),

    /// A name or value is not valid UTF-8.
    #[error("document is not valid UTF-8")]
    Utf8(#[from] Utf8Error),

    /// The input contains no element at all.
    #[error("document has no root element")]
    NoRootElement,

    /// A second element was found after the root element was closed.
    #[error("document has more than one root element (found `{name}` after the root)")]
    MultipleRoots {
        /// The local name of the extra element.
        name: String,
    },

    /// The input ended while elements were still open.
    #[error("document ended before `{name}` was closed")]
    UnclosedElement {
        /// The local name of the innermost open element.
        name: String,
    },

    /// An element used a namespace prefix that was never declared.
    #[error("namespace prefix `{prefix}` is not declared")]
    UnboundPrefix {
        /// The undeclared prefix.
        prefix: String,
    },
}

/// An error that occurs while serializing a [`Document`](crate::Document).
///
/// Returned by [`Document::serialize`](crate::Document::serialize) and
/// [`Document::to_string`](crate::Document::to_string).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// Writing to the underlying writer failed.
    #[error("error writing TRX document")]
    Io(#[from] io::Error),

    /// The XML writer reported an error.
    #[error("error serializing TRX document")]
    Xml(#[from] quick_xml::Error),

    /// The serialized output was not valid UTF-8.
    #[error("serialized TRX document is not valid UTF-8")]
    Utf8(#[source] Utf8Error),
}
