//! # File Discovery and Digesting
//!
//! Enumerates the files that make up a snapshot and digests their contents.
//!
//! ## Discovery
//!
//! Regular files under the root, and symlinks that resolve to regular files,
//! are kept when their path ends with one of the
//! configured extensions (all files when the list is empty) and dropped when
//! their root-relative path, written with a leading `/`, contains any exclude
//! pattern. The result is sorted by the byte order of the path string, so the
//! same tree always yields the same leaf order. Symlinked directories are only
//! descended when `follow_symlinks` is set.
//!
//! ## Digesting
//!
//! Files are read and hashed on tokio's blocking pool, at most
//! `max_concurrent_reads` at a time. A new read starts as soon as one finishes.
//! Output order always matches input order, and the first failing file in that
//! order is the error reported. Reads not yet started are cancelled on failure.

use log::{debug, info, trace, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinHandle};
use walkdir::WalkDir;

use crate::config::{Config, ContentMode};
use crate::error::ScanError;
use crate::tree::Hash;

/// Walks directories and digests files according to a `Config`.
#[derive(Debug, Clone)]
pub struct Scanner {
    include_extensions: Vec<String>,
    exclude_patterns: Vec<String>,
    content_mode: ContentMode,
    follow_symlinks: bool,
    max_concurrent_reads: usize,
}

impl Scanner {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_extensions: config
                .include_extensions
                .iter()
                .map(|ext| format!(".{}", ext.trim_start_matches('.')))
                .collect(),
            exclude_patterns: config.exclude_patterns.clone(),
            content_mode: config.content_mode,
            follow_symlinks: config.follow_symlinks,
            max_concurrent_reads: config.max_concurrent_reads.max(1),
        }
    }

    pub fn content_mode(&self) -> ContentMode {
        self.content_mode
    }

    fn is_included(&self, path: &str) -> bool {
        self.include_extensions.is_empty()
            || self.include_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| relative.contains(pattern.as_str()))
    }

    /// Recursively list the files under `root` in deterministic order.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::MissingRoot(root.to_path_buf()));
        }

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = entry?;
            // without following, walkdir reports links as links; keep those
            // pointing at files but never descend through them
            let is_file = if entry.path_is_symlink() && !self.follow_symlinks {
                links_to_file(entry.path())
            } else {
                entry.file_type().is_file()
            };
            if !is_file {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let key = format!("/{}", relative.to_string_lossy());
            if !self.is_included(&key) || self.is_excluded(&key) {
                trace!("skipping {}", path.display());
                continue;
            }
            files.push((key, path.to_path_buf()));
        }

        files.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        info!("discovered {} files under {}", files.len(), root.display());
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Digest every file in `paths`, preserving order.
    pub async fn digest_files(&self, paths: &[PathBuf]) -> Result<Vec<Hash>, ScanError> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_reads));
        let mode = self.content_mode;

        let handles: Vec<JoinHandle<Result<Hash, ScanError>>> = paths
            .iter()
            .cloned()
            .map(|path| {
                let permits = Arc::clone(&permits);
                task::spawn(async move {
                    let _permit = permits.acquire_owned().await?;
                    task::spawn_blocking(move || digest_file(&path, mode)).await?
                })
            })
            .collect();

        let mut digests = Vec::with_capacity(paths.len());
        let mut pending = handles.into_iter();
        while let Some(handle) = pending.next() {
            match handle.await.map_err(ScanError::from).and_then(|digest| digest) {
                Ok(digest) => digests.push(digest),
                Err(err) => {
                    permits.close();
                    for handle in pending {
                        handle.abort();
                    }
                    return Err(err);
                }
            }
        }
        debug!("digested {} files", digests.len());
        Ok(digests)
    }

    /// Discover and digest in one step.
    pub async fn scan(&self, root: &Path) -> Result<(Vec<PathBuf>, Vec<Hash>), ScanError> {
        let files = self.discover(root)?;
        let digests = self.digest_files(&files).await?;
        Ok((files, digests))
    }
}

/// Whether a symlink resolves to a regular file. Dangling links are skipped.
fn links_to_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(err) => {
            warn!("skipping unresolved link {}: {}", path.display(), err);
            false
        }
    }
}

/// Read `path` and digest its contents under `mode`.
pub fn digest_file(path: &Path, mode: ContentMode) -> Result<Hash, ScanError> {
    let bytes = std::fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(digest_contents(bytes, mode))
}

/// Digest in-memory contents under `mode`.
pub fn digest_contents(mut bytes: Vec<u8>, mode: ContentMode) -> Hash {
    if mode == ContentMode::Lines {
        normalize_lines(&mut bytes);
    }
    Hash::digest(&bytes)
}

/// Every line ends with `\n`, followed by one extra `\n`. A missing final
/// newline is added; an empty input becomes a single `\n`.
fn normalize_lines(bytes: &mut Vec<u8>) {
    if !bytes.is_empty() && bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    bytes.push(b'\n');
}
