// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merge TRX (Visual Studio test results) files into one.
//!
//! When a test appears in more than one file, only its most recent result is kept. This makes it
//! possible to rerun failed tests and combine the reruns with the original run.
//!
//! For the merge logic itself, see the `trx-merge-engine` crate.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
