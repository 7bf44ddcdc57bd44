// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{Element, Node};

/// Moves `element` and every element nested inside it into `namespace`.
///
/// Passing `None` takes the whole subtree out of any namespace. Since the reader never keeps
/// namespace declarations as attributes, a rewritten subtree serializes with exactly one
/// default declaration at its top. Prefixes used by qualified attribute names are left alone.
pub fn rewrite_namespace(element: &mut Element, namespace: Option<&str>) {
    element.set_namespace(namespace);
    for child in &mut element.children {
        if let Node::Element(child) = child {
            rewrite_namespace(child, namespace);
        }
    }
}
