// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Read, transform and write TRX (Visual Studio test result) documents in Rust.
//!
//! TRX files are plain XML, usually in the
//! `http://microsoft.com/schemas/VisualStudio/TeamTest/2010` namespace. This crate parses them into
//! a small owned tree ([`Document`] and [`Element`]) in which every element is addressed by its
//! *local* name, with the resolved namespace URI kept alongside. That makes lookups independent of
//! whichever prefix (if any) a producer chose, and lets the namespace of a whole document be
//! rewritten in a single pass before serializing it again.

mod document;
mod errors;
mod namespace;
mod reader;
mod serialize;

pub use document::*;
pub use errors::*;
pub use namespace::rewrite_namespace;
