//! # Shared Tree
//!
//! Thread-safe handle around a `MerkleTree` for one writer and many readers.
//!
//! - **Writers** hold the exclusive lock for the whole update → recompute
//!   sequence, so no reader ever sees a half-recomputed tree.
//! - **Readers** take a shared lock and only observe clean state: the strict
//!   `root_hash` is used, and because every write ends with `compute_root`
//!   it always succeeds.

use parking_lot::RwLock;
use std::sync::Arc;

use super::hash::Hash;
use super::merkle::MerkleTree;
use super::proof::Proof;
use crate::error::{Result, TreeError};

/// Cloneable handle; clones share the same underlying tree.
#[derive(Debug, Clone)]
pub struct SharedTree {
    inner: Arc<RwLock<MerkleTree>>,
}

impl SharedTree {
    /// Wrap a tree, recomputing any pending updates first.
    pub fn new(mut tree: MerkleTree) -> Self {
        tree.compute_root();
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Apply a batch of leaf updates and recompute the root under a single
    /// exclusive lock.
    ///
    /// Every index is validated before any leaf is touched, so a bad index
    /// leaves the tree exactly as it was.
    pub fn apply<I>(&self, updates: I) -> Result<Hash>
    where
        I: IntoIterator<Item = (u64, Hash)>,
    {
        let updates: Vec<(u64, Hash)> = updates.into_iter().collect();
        let mut tree = self.inner.write();
        let leaves = tree.len();
        if let Some(&(index, _)) = updates.iter().find(|(index, _)| *index >= leaves) {
            return Err(TreeError::IndexOutOfRange { index, leaves });
        }
        for (index, hash) in updates {
            tree.update(index, hash)?;
        }
        Ok(tree.compute_root())
    }

    /// Single-leaf form of `apply`.
    pub fn update(&self, index: u64, hash: Hash) -> Result<Hash> {
        self.apply([(index, hash)])
    }

    pub fn root(&self) -> Result<Hash> {
        self.inner.read().root_hash()
    }

    pub fn path(&self, index: u64) -> Result<Proof> {
        self.inner.read().path(index)
    }

    pub fn leaf(&self, index: u64) -> Result<Hash> {
        self.inner.read().leaf(index)
    }

    /// Root, leaf hash and proof for `index`, all read under one lock.
    pub fn prove(&self, index: u64) -> Result<(Hash, Hash, Proof)> {
        let tree = self.inner.read();
        Ok((tree.root_hash()?, tree.leaf(index)?, tree.path(index)?))
    }

    pub fn len(&self) -> u64 {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
