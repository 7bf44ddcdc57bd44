// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository configuration, read from `.config/trx-merge.toml`.
//!
//! Configuration is layered: the defaults embedded in this crate come first, then the config file.
//! Command-line arguments are applied on top of the result by the caller.

use crate::{errors::ConfigParseError, source::DEFAULT_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Handles warnings produced while loading configuration.
pub trait ConfigWarnings {
    /// Called with the keys in `config_file` that aren't recognized.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        base_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Logs configuration warnings through `tracing`.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        base_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file.strip_prefix(base_dir).unwrap_or(config_file),
        )
    }
}

/// Configuration for trx-merge.
#[derive(Clone, Debug)]
pub struct TrxMergeConfig {
    config_file: Option<Utf8PathBuf>,
    merge: MergeConfig,
}

impl TrxMergeConfig {
    /// The path to the config file, relative to the base directory.
    pub const CONFIG_PATH: &'static str = ".config/trx-merge.toml";

    /// The embedded default configuration.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads configuration.
    ///
    /// If `config_file` is given, it must exist. Otherwise `.config/trx-merge.toml` under
    /// `base_dir` is read if present, and the defaults are used if not.
    pub fn from_sources(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(base_dir, config_file, &mut DefaultConfigWarnings)
    }

    /// Reads configuration, with custom warning handling.
    pub fn from_sources_with_warnings(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = base_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        let exists = config_file.is_file();

        let builder = Self::make_default_config().add_source(source);
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|err| ConfigParseError::new(&config_file, err))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, base_dir, &unknown);
        }

        Ok(Self {
            config_file: exists.then_some(config_file),
            merge: deserialized.merge,
        })
    }

    /// Returns the default configuration.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        let (deserialized, _) = Self::build_and_deserialize_config(&Self::make_default_config())
            .map_err(|err| ConfigParseError::new("<default config>", err))?;
        Ok(Self {
            config_file: None,
            merge: deserialized.merge,
        })
    }

    /// The config file that was read, if there was one.
    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }

    /// The `[merge]` section.
    pub fn merge(&self) -> &MergeConfig {
        &self.merge
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(TrxMergeConfigDeserialize, BTreeSet<String>), ConfigError> {
        let config = builder.build_cloned()?;

        let mut ignored = BTreeSet::new();
        let config: TrxMergeConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                ignored.insert(path.to_string());
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TrxMergeConfigDeserialize {
    merge: MergeConfig,
}

/// The `[merge]` section of the config.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct MergeConfig {
    /// The namespace the merged document is moved into.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Where to write the merged document.
    #[serde(default)]
    pub output: Option<Utf8PathBuf>,

    /// Whether directory scans descend into subdirectories.
    #[serde(default)]
    pub recursive: bool,

    /// The extension of files to pick up when scanning a directory.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_owned()
}
