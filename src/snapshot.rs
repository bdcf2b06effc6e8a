//! # Directory Snapshots
//!
//! Ties the pieces together: discover the files under a directory, digest
//! them, assemble the leaves (identity leaf first, cyclic padding last) and
//! build the tree. A snapshot can then be re-versioned through the identity
//! leaf or refreshed one file at a time without rehashing the whole tree.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task;

use crate::config::Config;
use crate::scan::{digest_file, Scanner};
use crate::tree::leaves::{self, IDENTITY_INDEX};
use crate::tree::{Hash, MerkleTree, Proof, SharedTree};

/// The fingerprint of one directory tree.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root_dir: PathBuf,
    canonical_root: PathBuf,
    files: Vec<PathBuf>,
    tree: MerkleTree,
    scanner: Scanner,
}

impl Snapshot {
    /// Scan `root_dir` and build its tree.
    pub async fn capture(root_dir: &Path, config: &Config) -> Result<Self> {
        let identity = config.identity()?;
        let scanner = Scanner::from_config(config);

        let started = Instant::now();
        let (files, digests) = scanner
            .scan(root_dir)
            .await
            .with_context(|| format!("failed to scan {}", root_dir.display()))?;
        let hashed = started.elapsed();
        let canonical_root = std::fs::canonicalize(root_dir)
            .with_context(|| format!("failed to resolve {}", root_dir.display()))?;

        let started = Instant::now();
        let mut tree = MerkleTree::from_digests(identity, digests)?;
        let root = tree.compute_root();
        let formed = started.elapsed();

        info!(
            "{}: {} files, {} leaves, root {}",
            root_dir.display(),
            files.len(),
            tree.len(),
            root
        );
        debug!("read and hash: {:?}, form tree: {:?}", hashed, formed);

        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            canonical_root,
            files,
            tree,
            scanner,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Files in leaf order; file `i` lives at leaf `i + 1`.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn root(&mut self) -> Hash {
        self.tree.root()
    }

    /// Current value of the identity leaf.
    pub fn version(&self) -> Result<Hash> {
        Ok(self.tree.leaf(IDENTITY_INDEX)?)
    }

    /// Hand the tree over to a `SharedTree` for concurrent readers.
    pub fn into_shared(self) -> SharedTree {
        SharedTree::new(self.tree)
    }

    /// `path` relative to the snapshot root, or `None` when it lies outside.
    fn relative_to_root(&self, path: &Path) -> Option<PathBuf> {
        if let Ok(rest) = path.strip_prefix(&self.root_dir) {
            return Some(rest.to_path_buf());
        }
        if !path.is_absolute() {
            return Some(path.to_path_buf());
        }
        if let Ok(rest) = path.strip_prefix(&self.canonical_root) {
            return Some(rest.to_path_buf());
        }
        // the query may reach the root through a symlinked ancestor; resolve
        // only the parent so a symlinked file keeps its own name
        let parent = std::fs::canonicalize(path.parent()?).ok()?;
        let rest = parent.strip_prefix(&self.canonical_root).ok()?;
        Some(rest.join(path.file_name()?))
    }

    /// Leaf index of `path`, given relative to the snapshot root, including
    /// the root as passed to `capture`, or as an absolute path.
    pub fn leaf_index(&self, path: &Path) -> Option<u64> {
        let path = self.root_dir.join(self.relative_to_root(path)?);
        self.files
            .iter()
            .position(|file| *file == path)
            .map(|position| position as u64 + 1)
    }

    fn require_index(&self, path: &Path) -> Result<u64> {
        self.leaf_index(path)
            .ok_or_else(|| anyhow!("{} is not part of the snapshot", path.display()))
    }

    /// Overwrite the identity leaf and recompute the root.
    ///
    /// Only leaf 0 changes. A padding copy of the identity leaf keeps the
    /// value it had when the snapshot was captured.
    pub fn set_version(&mut self, version: Hash) -> Result<Hash> {
        self.tree.update(IDENTITY_INDEX, version)?;
        Ok(self.tree.compute_root())
    }

    /// Re-digest one file and update its leaf, along with every padding copy
    /// of it, then recompute the root.
    pub async fn refresh_file(&mut self, path: &Path) -> Result<Hash> {
        let index = self.require_index(path)? as usize;
        let file = self.files[index - 1].clone();
        let mode = self.scanner.content_mode();
        let digest = task::spawn_blocking(move || digest_file(&file, mode)).await??;

        let assembled = self.files.len() + 1;
        let padded = self.tree.len() as usize;
        for position in leaves::copies_of(index, assembled, padded) {
            self.tree.update(position as u64, digest)?;
        }
        let root = self.tree.compute_root();
        debug!(
            "refreshed {} (leaf {}), recomputed {} nodes",
            path.display(),
            index,
            self.tree.recomputed_nodes()
        );
        Ok(root)
    }

    /// Leaf index, leaf hash and inclusion proof for `path`.
    pub fn prove(&self, path: &Path) -> Result<(u64, Hash, Proof)> {
        let index = self.require_index(path)?;
        let leaf = self.tree.leaf(index)?;
        let proof = self.tree.path(index)?;
        Ok((index, leaf, proof))
    }

    /// Compare the root against a previously recorded checksum.
    pub fn check(&mut self, expected: &Hash) -> bool {
        let actual = self.root();
        if actual != *expected {
            warn!(
                "{}: root {} does not match expected {}",
                self.root_dir.display(),
                actual,
                expected
            );
            return false;
        }
        true
    }
}
