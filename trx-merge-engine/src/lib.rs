// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [trx-merge](https://crates.io/crates/trx-merge).
//!
//! The entry point is [`merge::TrxMerger`], built through [`merge::MergerBuilder`]. It folds an
//! ordered list of [`source::TrxSource`]s into a single [`quick_trx::Document`]:
//!
//! * every `UnitTestResult` is keyed by its [`identity::TestIdentity`] (`testId` plus `testName`),
//!   and only the result with the latest `endTime` survives;
//! * an [`outcome::OutcomeLedger`] keeps per-outcome counts up to date as results are retained or
//!   displaced, and classifies the overall run;
//! * a [`times::TimeEnvelope`] tracks the widest `Times` window across all sources.

pub mod config;
pub mod errors;
pub mod identity;
pub mod merge;
pub mod outcome;
mod record;
pub mod source;
pub mod times;

pub use record::TestRecord;
