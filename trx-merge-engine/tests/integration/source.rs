// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use trx_merge_engine::{
    merge::MergerBuilder,
    source::{DEFAULT_EXTENSION, SourceSelection, read_sources},
};

#[test]
fn merges_fixture_directory() -> Result<()> {
    let selection = SourceSelection::Directory {
        dir: fixtures_dir(),
        recursive: false,
    };
    let paths = selection.discover(DEFAULT_EXTENSION)?;
    let names: Vec<_> = paths.iter().filter_map(|path| path.file_name()).collect();
    assert_eq!(
        names,
        vec![
            "error-no-times.trx",
            "initial-run.trx",
            "malformed.trx",
            "missing-end-time.trx",
            "prefixed.trx",
            "rerun.trx",
        ]
    );

    // Skip the fixtures that are meant to fail.
    let mergeable: Vec<_> = paths
        .into_iter()
        .filter(|path| {
            !matches!(
                path.file_name(),
                Some("malformed.trx" | "missing-end-time.trx")
            )
        })
        .collect();
    let sources = read_sources(&mergeable)?;
    let run = MergerBuilder::new().build().merge(&sources)?;
    assert_eq!(run.result_count(), 5);
    Ok(())
}
