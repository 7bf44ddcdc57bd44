// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use quick_trx::SerializeError;
use std::{error::Error, io};
use thiserror::Error;
use trx_merge_engine::errors::{
    ConfigParseError, DiscoverSourcesError, MergeError, MergeErrorCategory, SourceReadError,
};

/// Documented exit codes for `trx-merge` failures.
///
/// A merged run whose outcome is `Failed` is not a process failure: the exit code is 0 as long as
/// the merged document was written.
pub enum TrxMergeExitCode {}

impl TrxMergeExitCode {
    /// The merge completed and the output was written, or there was nothing to merge.
    pub const OK: i32 = 0;

    /// Setup failed: invalid arguments or configuration, or source files couldn't be found or
    /// read.
    pub const SETUP_ERROR: i32 = 96;

    /// A source document was malformed or lacked a required attribute.
    pub const MALFORMED_SOURCE: i32 = 97;

    /// The merged document couldn't be written.
    pub const WRITE_OUTPUT_FAILED: i32 = 98;
}

/// An error that `trx-merge` knows how to present to the user.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    GetCurrentDirFailed {
        #[source]
        err: io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("discovering source files failed")]
    DiscoverSourcesError {
        #[from]
        err: DiscoverSourcesError,
    },
    #[error("reading source file failed")]
    SourceReadError {
        #[from]
        err: SourceReadError,
    },
    #[error("merge failed")]
    MergeError {
        #[from]
        err: MergeError,
    },
    #[error("creating output directory failed")]
    CreateOutputDirError {
        dir: Utf8PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("writing output failed")]
    WriteOutputError {
        path: Utf8PathBuf,
        #[source]
        err: atomicwrites::Error<SerializeError>,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::GetCurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::DiscoverSourcesError { .. }
            | Self::SourceReadError { .. } => TrxMergeExitCode::SETUP_ERROR,
            Self::MergeError { .. } => TrxMergeExitCode::MALFORMED_SOURCE,
            Self::CreateOutputDirError { .. } | Self::WriteOutputError { .. } => {
                TrxMergeExitCode::WRITE_OUTPUT_FAILED
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::GetCurrentDirFailed { err } => {
                tracing::error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!(
                    "current directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::DiscoverSourcesError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::SourceReadError { err } => {
                tracing::error!(
                    "failed to read source file `{}`",
                    err.path().style(styles.bold)
                );
                err.source()
            }
            Self::MergeError { err } => {
                let what = match err.kind().category() {
                    MergeErrorCategory::MalformedSource => "malformed",
                    MergeErrorCategory::MissingRequiredAttribute => {
                        "missing a required attribute"
                    }
                };
                tracing::error!(
                    "source `{}` is {}; no output was written",
                    err.source_name().style(styles.bold),
                    what.style(styles.warning_text),
                );
                Some(err.kind() as &dyn Error)
            }
            Self::CreateOutputDirError { dir, err } => {
                tracing::error!(
                    "failed to create output directory `{}`",
                    dir.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { path, err } => {
                tracing::error!(
                    "failed to write merged document to `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
