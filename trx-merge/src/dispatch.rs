// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, TrxMergeExitCode},
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles, clap_styles},
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use itertools::Itertools;
use owo_colors::OwoColorize;
use quick_trx::{Document, SerializeError};
use std::{
    fs,
    io::{BufWriter, Write},
};
use tracing::{debug, warn};
use trx_merge_engine::{
    config::TrxMergeConfig,
    merge::{MergedRun, MergerBuilder},
    outcome::RunOutcome,
    source::{SourceSelection, read_sources},
};

/// Merge TRX test result files, keeping the latest result for every test.
///
/// Results are matched by test ID and name. When a test appears in more than one file, the result
/// with the latest end time is kept, so reruns of failed tests replace the original failures.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "trx-merge",
    styles = clap_styles::style(),
    max_term_width = 100
)]
pub struct TrxMergeApp {
    #[clap(flatten)]
    sources: SourceOpts,

    #[clap(flatten)]
    merge: MergeOpts,

    #[clap(flatten)]
    config: ConfigOpts,

    #[clap(flatten)]
    output: OutputOpts,
}

impl TrxMergeApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code on success.
    pub fn exec(self, output_writer: &mut OutputWriter) -> Result<i32, ExpectedError> {
        let cwd = std::env::current_dir()
            .map_err(|err| ExpectedError::GetCurrentDirFailed { err })?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })?;
        self.exec_in(&cwd, output_writer)
    }

    fn exec_in(
        self,
        cwd: &Utf8Path,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let config = TrxMergeConfig::from_sources(cwd, self.config.config_file.as_deref())?;
        if let Some(config_file) = config.config_file() {
            debug!("using config file {config_file}");
        }
        let merge_config = config.merge();

        let selection = self
            .sources
            .selection(cwd, self.sources.recursive || merge_config.recursive);
        let paths = selection.discover(&merge_config.extension)?;
        if paths.is_empty() {
            warn!("no files to merge; no output was written");
            return Ok(TrxMergeExitCode::OK);
        }

        let sources = read_sources(&paths)?;

        let mut builder = MergerBuilder::new();
        if let Some(namespace) = self.merge.namespace.as_ref().or(merge_config.namespace.as_ref())
        {
            builder.set_namespace(namespace);
        }
        // The engine logs its own diagnostics as it goes.
        let run = builder.build().merge(&sources)?;

        let output_path = match self.merge.output.as_deref().or(merge_config.output.as_deref()) {
            Some(path) => cwd.join(path),
            None => cwd.join(default_output_name()),
        };
        persist(&run.document, &output_path)?;
        debug!("Document {output_path} was saved");

        let styles = OutputContext {
            color: self.output.color,
        }
        .stdout_styles();
        let mut writer = output_writer.stdout_writer();
        // A closed stdout shouldn't fail a merge that has already been written.
        let _ = write_summary(&mut writer, &run, sources.len(), &output_path, &styles)
            .and_then(|()| writer.flush());

        Ok(TrxMergeExitCode::OK)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Source options")]
struct SourceOpts {
    /// TRX file to merge (can be specified multiple times)
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present = "dir",
        conflicts_with_all = ["dir", "recursive"]
    )]
    file: Vec<Utf8PathBuf>,

    /// Directory to search for TRX files
    #[arg(short, long, value_name = "DIR")]
    dir: Option<Utf8PathBuf>,

    /// Search subdirectories of --dir as well
    #[arg(short, long, requires = "dir")]
    recursive: bool,
}

impl SourceOpts {
    fn selection(&self, cwd: &Utf8Path, recursive: bool) -> SourceSelection {
        match &self.dir {
            Some(dir) => SourceSelection::Directory {
                dir: cwd.join(dir),
                recursive,
            },
            None => SourceSelection::Files(self.file.iter().map(|file| cwd.join(file)).collect()),
        }
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Merge options")]
struct MergeOpts {
    /// Namespace to move every element of the merged document into
    ///
    /// If not specified, the namespace of the last merged file is used. An empty value is the same
    /// as not specifying one.
    #[arg(short, long, value_name = "URI")]
    namespace: Option<String>,

    /// Path to write the merged document to [default: ./mergedTrx_<timestamp>.trx]
    #[arg(short, long, value_name = "PATH")]
    output: Option<Utf8PathBuf>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: .config/trx-merge.toml in the current directory]
    #[arg(long, global = true, value_name = "PATH", env = "TRX_MERGE_CONFIG_FILE")]
    config_file: Option<Utf8PathBuf>,
}

fn default_output_name() -> String {
    format!(
        "mergedTrx_{}.trx",
        chrono::Local::now().format("%Y%m%d%H%M%S%3f")
    )
}

fn persist(document: &Document, path: &Utf8Path) -> Result<(), ExpectedError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|err| ExpectedError::CreateOutputDirError {
            dir: dir.to_owned(),
            err,
        })?;
    }

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| {
            let mut writer = BufWriter::new(file);
            document.serialize(&mut writer)?;
            writer.flush()?;
            Ok::<_, SerializeError>(())
        })
        .map_err(|err| ExpectedError::WriteOutputError {
            path: path.to_owned(),
            err,
        })
}

fn write_summary(
    writer: &mut impl Write,
    run: &MergedRun,
    source_count: usize,
    output_path: &Utf8Path,
    styles: &StdoutStyles,
) -> std::io::Result<()> {
    let outcome_style = match run.summary.outcome {
        RunOutcome::Completed => styles.pass,
        _ => styles.fail,
    };
    let counters = run
        .summary
        .counters
        .iter()
        .map(|(outcome, count)| format!("{} {outcome}", count.style(styles.count)))
        .join(", ");

    writeln!(
        writer,
        "Merged {} {} from {} {} into {}: {} ({counters})",
        run.result_count().style(styles.count),
        plural(run.result_count(), "result", "results"),
        source_count.style(styles.count),
        plural(source_count, "file", "files"),
        output_path.style(styles.path),
        run.summary.outcome.style(outcome_style),
    )
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}
