// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating and reading the documents to merge.

use crate::errors::{DiscoverSourcesError, SourceReadError};
use camino::{Utf8Path, Utf8PathBuf};
use std::{cmp::Ordering, fs};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// The default extension of TRX files, without the leading dot.
pub const DEFAULT_EXTENSION: &str = "trx";

/// One document to merge: a display name (typically its path) plus its raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrxSource {
    name: String,
    contents: Vec<u8>,
}

impl TrxSource {
    /// Creates a source from bytes already in memory.
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Reads a source from disk. The path is used as its name.
    pub fn from_path(path: &Utf8Path) -> Result<Self, SourceReadError> {
        let contents = fs::read(path).map_err(|err| SourceReadError::new(path, err))?;
        Ok(Self::new(path.as_str(), contents))
    }

    /// The name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw document.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

/// Which files to merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSelection {
    /// An explicit list of files, merged in the order given.
    Files(Vec<Utf8PathBuf>),

    /// Every file with a matching extension in a directory.
    Directory {
        /// The directory to search.
        dir: Utf8PathBuf,

        /// Whether to descend into subdirectories.
        recursive: bool,
    },
}

impl SourceSelection {
    /// Resolves the selection into an ordered list of paths.
    ///
    /// Directory scans are deterministic: within each directory, files come before
    /// subdirectories and both are sorted by name. The extension is matched case-insensitively.
    /// Explicit file lists are returned as given, without checking that they exist.
    pub fn discover(&self, extension: &str) -> Result<Vec<Utf8PathBuf>, DiscoverSourcesError> {
        let paths = match self {
            Self::Files(files) => files.clone(),
            Self::Directory { dir, recursive } => scan_dir(dir, *recursive, extension)?,
        };
        debug!("Found {} files to merge", paths.len());
        Ok(paths)
    }
}

fn scan_dir(
    dir: &Utf8Path,
    recursive: bool,
    extension: &str,
) -> Result<Vec<Utf8PathBuf>, DiscoverSourcesError> {
    if !dir.is_dir() {
        return Err(DiscoverSourcesError::NotADirectory {
            dir: dir.to_owned(),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by(files_first);

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| DiscoverSourcesError::Walk {
            dir: dir.to_owned(),
            err,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.into_path())
            .map_err(|err| DiscoverSourcesError::NonUtf8Path {
                path: err.into_path_buf(),
            })?;
        if has_extension(&path, extension) {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn has_extension(path: &Utf8Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}

/// Reads every path, in order. Fails on the first file that can't be read.
pub fn read_sources(paths: &[Utf8PathBuf]) -> Result<Vec<TrxSource>, SourceReadError> {
    paths.iter().map(|path| TrxSource::from_path(path)).collect()
}
