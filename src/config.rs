//! # Configuration Management
//!
//! This module handles loading the settings that decide which files make up a
//! snapshot and how their contents are digested. Configuration is loaded from
//! TOML files; every field is optional and falls back to its default.
//!
//! ## Example Configuration File (snapshot.toml)
//! ```toml
//! include_extensions = ["cpp", "c", "h", "cc", "py", "sh"]
//! exclude_patterns = ["/build-aux/", "/obj/", "-config.h"]
//! identity_leaf = "0000000000000000000000000000000000000000000000000000000000000000"
//! content_mode = "lines"
//! follow_symlinks = false
//! max_concurrent_reads = 64
//! ```

use anyhow::{Context, Result};
use config::{Config as ConfigLib, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tree::Hash;

/// How file contents are turned into the bytes that get digested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Digest the file bytes exactly as stored.
    #[default]
    Raw,
    /// Re-terminate every line with `\n` and append one extra `\n`, the way
    /// the legacy line-by-line reader did. Needed to reproduce roots recorded
    /// by that tool.
    Lines,
}

/// Settings for discovering, digesting and assembling a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions to include, without the leading dot.
    /// An empty list includes every regular file.
    pub include_extensions: Vec<String>,

    /// Any path containing one of these substrings is skipped
    /// (e.g. "/.git/", "/qt/", "-config.h").
    pub exclude_patterns: Vec<String>,

    /// Hex value of the reserved leaf at index 0.
    pub identity_leaf: String,

    /// Content normalization applied before digesting.
    pub content_mode: ContentMode,

    /// Whether symbolic links are followed while walking.
    pub follow_symlinks: bool,

    /// Upper bound on files read and hashed at the same time.
    pub max_concurrent_reads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_extensions: Vec::new(),
            exclude_patterns: vec!["/.git/".to_string()],
            identity_leaf: Hash::ZERO.to_hex(),
            content_mode: ContentMode::Raw,
            follow_symlinks: false,
            max_concurrent_reads: 64,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - Parsed configuration or error if the file is invalid
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ConfigLib::builder().add_source(File::from(path)).build()?;

        let config: Config = settings.try_deserialize()?;
        config.identity()?;
        Ok(config)
    }

    /// Load from `path` if one is given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(Self::default()),
        }
    }

    /// The identity leaf as a hash.
    pub fn identity(&self) -> Result<Hash> {
        Hash::from_hex(&self.identity_leaf).context("invalid identity_leaf")
    }
}
