// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by trx-merge.

use camino::Utf8PathBuf;
use config::ConfigError;
use quick_trx::ParseError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse trx-merge config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// An error that occurred while looking for source documents on disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoverSourcesError {
    /// The directory to search doesn't exist or isn't a directory.
    #[error("`{dir}` is not a directory")]
    NotADirectory {
        /// The directory that was requested.
        dir: Utf8PathBuf,
    },

    /// Walking the directory failed.
    #[error("failed to scan `{dir}` for source files")]
    Walk {
        /// The directory being scanned.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// A file was found whose path is not valid UTF-8.
    #[error("path `{}` is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

/// An error that occurred while reading a source document from disk.
#[derive(Debug, Error)]
#[error("failed to read `{path}`")]
pub struct SourceReadError {
    path: Utf8PathBuf,
    #[source]
    err: io::Error,
}

impl SourceReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error returned while parsing a TRX timestamp.
#[derive(Clone, Debug, Error)]
#[error("`{input}` is not a valid timestamp")]
pub struct TimestampParseError {
    input: String,
    #[source]
    err: chrono::ParseError,
}

impl TimestampParseError {
    pub(crate) fn new(input: impl Into<String>, err: chrono::ParseError) -> Self {
        Self {
            input: input.into(),
            err,
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that aborted a merge, tagged with the source document at fault.
///
/// Merges are all-or-nothing: if any source fails, no merged document is produced.
#[derive(Debug, Error)]
#[error("failed to merge `{source_name}`")]
pub struct MergeError {
    source_name: String,
    #[source]
    kind: MergeErrorKind,
}

impl MergeError {
    pub(crate) fn new(source_name: impl Into<String>, kind: MergeErrorKind) -> Self {
        Self {
            source_name: source_name.into(),
            kind,
        }
    }

    /// Returns the name of the source that caused the merge to fail.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns the underlying reason for the failure.
    pub fn kind(&self) -> &MergeErrorKind {
        &self.kind
    }
}

/// The reason a source document couldn't be merged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MergeErrorKind {
    /// The document isn't well-formed XML, or has no root element.
    #[error("document could not be parsed")]
    Parse(#[from] ParseError),

    /// A required attribute is absent.
    #[error("`{element}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element kind, e.g. `UnitTestResult`.
        element: &'static str,

        /// The attribute that is missing.
        attribute: &'static str,
    },

    /// A required attribute is present but empty.
    #[error("`{element}` has an empty `{attribute}` attribute")]
    EmptyAttribute {
        /// The element kind, e.g. `UnitTestResult`.
        element: &'static str,

        /// The attribute that is empty.
        attribute: &'static str,
    },

    /// A timestamp attribute couldn't be parsed.
    #[error("attribute `{attribute}` of `{element}` is invalid")]
    InvalidTimestamp {
        /// The element kind, e.g. `Times`.
        element: &'static str,

        /// The attribute holding the timestamp.
        attribute: &'static str,

        /// The underlying error.
        #[source]
        err: TimestampParseError,
    },
}

impl MergeErrorKind {
    /// Returns the broad category this error falls into.
    pub fn category(&self) -> MergeErrorCategory {
        match self {
            Self::MissingAttribute { .. } => MergeErrorCategory::MissingRequiredAttribute,
            Self::Parse(_) | Self::EmptyAttribute { .. } | Self::InvalidTimestamp { .. } => {
                MergeErrorCategory::MalformedSource
            }
        }
    }
}

/// Broad categories of [`MergeErrorKind`]. Both are fatal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergeErrorCategory {
    /// The source is not a usable document: bad XML, no root element, or an unparseable value.
    MalformedSource,

    /// A `UnitTestResult` lacks one of the attributes needed to merge it.
    MissingRequiredAttribute,
}
