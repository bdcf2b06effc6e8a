//! # Merkle Tree Engine
//!
//! A perfect binary hash tree stored as a flat, heap-ordered array of
//! `2T - 1` nodes: the root lives at position 0, the children of position `p`
//! at `2p + 1` and `2p + 2`, and leaf `i` at `T - 1 + i`.
//!
//! ## Lazy recomputation
//!
//! `update` only overwrites the leaf and flags every node on the path from the
//! root down to that leaf as dirty. `compute_root` later rehashes the dirty
//! internal nodes bottom-up, so ancestors shared by several updated leaves are
//! rehashed once per batch rather than once per update.
//!
//! ## Root policy
//!
//! `root()` recomputes pending updates before returning. `root_hash()` is the
//! strict read-only variant and fails with `TreeError::StaleRoot` instead.

use log::{debug, trace};

use super::hash::Hash;
use super::leaves;
use super::proof::{Proof, ProofStep, Side};
use crate::error::{Result, TreeError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    hash: Hash,
    /// Set when this node's subtree changed after `hash` was last computed.
    dirty: bool,
}

impl Node {
    fn clean(hash: Hash) -> Self {
        Node { hash, dirty: false }
    }
}

/// Heap positions visited when descending from the root to leaf `index`.
///
/// The `height` low bits of `index` are consumed most-significant first:
/// a 0 bit selects the left child, a 1 bit the right child.
fn descent(height: u32, index: u64) -> impl Iterator<Item = usize> {
    let mut pos = 0usize;
    std::iter::once(0).chain((0..height).rev().map(move |level| {
        let bit = ((index >> level) & 1) as usize;
        pos = 2 * pos + 1 + bit;
        pos
    }))
}

/// Perfect binary Merkle tree with dirty-flagged incremental updates.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nodes: Vec<Node>,
    leaf_count: u64,
    height: u32,
    /// Internal nodes rehashed by the most recent `compute_root`.
    recomputed: usize,
}

impl MerkleTree {
    /// Build a tree over `leaves`, whose length must be a non-zero power of
    /// two. All nodes start clean.
    ///
    /// # Errors
    /// * `TreeError::InvalidTreeShape` - no tree is produced
    pub fn build(leaves: Vec<Hash>) -> Result<Self> {
        let count = leaves.len();
        if count == 0 || !count.is_power_of_two() {
            return Err(TreeError::InvalidTreeShape { leaves: count });
        }

        let base = count - 1;
        let mut nodes = Vec::with_capacity(2 * count - 1);
        nodes.resize(base, Node::clean(Hash::ZERO));
        nodes.extend(leaves.into_iter().map(Node::clean));

        for pos in (0..base).rev() {
            nodes[pos].hash = Hash::compress(&nodes[2 * pos + 1].hash, &nodes[2 * pos + 2].hash);
        }

        let height = count.trailing_zeros();
        debug!("built merkle tree: {} leaves, height {}", count, height);

        Ok(Self {
            nodes,
            leaf_count: count as u64,
            height,
            recomputed: 0,
        })
    }

    /// Assemble leaves from content digests (identity leaf plus cyclic
    /// padding) and build the tree over them.
    pub fn from_digests(identity: Hash, digests: impl IntoIterator<Item = Hash>) -> Result<Self> {
        Self::build(leaves::assemble(identity, digests))
    }

    /// Number of leaves (always a power of two).
    pub fn len(&self) -> u64 {
        self.leaf_count
    }

    /// Never true: a tree always has at least one leaf.
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when updates are pending and the root hash is stale.
    pub fn is_dirty(&self) -> bool {
        self.nodes[0].dirty
    }

    /// Internal nodes rehashed by the most recent `compute_root` call.
    pub fn recomputed_nodes(&self) -> usize {
        self.recomputed
    }

    fn leaf_base(&self) -> usize {
        (self.leaf_count - 1) as usize
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.leaf_count {
            return Err(TreeError::IndexOutOfRange {
                index,
                leaves: self.leaf_count,
            });
        }
        Ok(())
    }

    /// Current hash stored at leaf `index`.
    pub fn leaf(&self, index: u64) -> Result<Hash> {
        self.check_index(index)?;
        Ok(self.nodes[self.leaf_base() + index as usize].hash)
    }

    /// All leaf hashes in order.
    pub fn leaves(&self) -> impl Iterator<Item = Hash> + '_ {
        self.nodes[self.leaf_base()..].iter().map(|node| node.hash)
    }

    /// Descend to leaf `index`, optionally flagging every visited node
    /// (root and leaf included) as dirty. Returns the leaf's heap position.
    fn walk_to(&mut self, index: u64, mark_dirty: bool) -> Result<usize> {
        self.check_index(index)?;
        let mut target = 0;
        for pos in descent(self.height, index) {
            if mark_dirty {
                self.nodes[pos].dirty = true;
            }
            target = pos;
        }
        debug_assert_eq!(target, self.leaf_base() + index as usize);
        Ok(target)
    }

    /// Replace leaf `index` with `hash`. Ancestors are only marked stale;
    /// they are rehashed by the next `compute_root`.
    ///
    /// # Errors
    /// * `TreeError::IndexOutOfRange` - the tree is not modified
    pub fn update(&mut self, index: u64, hash: Hash) -> Result<()> {
        let pos = self.walk_to(index, true)?;
        self.nodes[pos].hash = hash;
        trace!("leaf {} set to {}", index, hash);
        Ok(())
    }

    /// Rehash every dirty internal node bottom-up, clear all dirty flags and
    /// return the root hash. Work is proportional to the number of dirty
    /// nodes; calling it again without updates rehashes nothing.
    pub fn compute_root(&mut self) -> Hash {
        self.recomputed = self.recompute(0);
        if self.recomputed > 0 {
            debug!(
                "recomputed {} internal nodes, root {}",
                self.recomputed, self.nodes[0].hash
            );
        }
        self.nodes[0].hash
    }

    fn recompute(&mut self, pos: usize) -> usize {
        if !self.nodes[pos].dirty {
            return 0;
        }
        let mut count = 0;
        if pos < self.leaf_base() {
            let (left, right) = (2 * pos + 1, 2 * pos + 2);
            count += self.recompute(left);
            count += self.recompute(right);
            self.nodes[pos].hash = Hash::compress(&self.nodes[left].hash, &self.nodes[right].hash);
            count += 1;
        }
        self.nodes[pos].dirty = false;
        count
    }

    /// Root hash, recomputing pending updates first.
    pub fn root(&mut self) -> Hash {
        if self.is_dirty() {
            self.compute_root()
        } else {
            self.nodes[0].hash
        }
    }

    /// Root hash without recomputation.
    ///
    /// # Errors
    /// * `TreeError::StaleRoot` - updates are pending
    pub fn root_hash(&self) -> Result<Hash> {
        if self.is_dirty() {
            return Err(TreeError::StaleRoot);
        }
        Ok(self.nodes[0].hash)
    }

    /// Inclusion proof for leaf `index`.
    ///
    /// # Errors
    /// * `TreeError::IndexOutOfRange` - no such leaf
    /// * `TreeError::StaleProof` - a node on the path, or one of the
    ///   collected siblings, has not been recomputed
    pub fn path(&self, index: u64) -> Result<Proof> {
        self.check_index(index)?;
        let stale = || TreeError::StaleProof { index };

        let mut steps = Vec::with_capacity(self.height as usize);
        let mut pos = self.leaf_base() + index as usize;
        while pos > 0 {
            // odd positions are left children
            let (sibling, side) = if pos % 2 == 1 {
                (pos + 1, Side::Right)
            } else {
                (pos - 1, Side::Left)
            };
            if self.nodes[pos].dirty || self.nodes[sibling].dirty {
                return Err(stale());
            }
            steps.push(ProofStep {
                sibling: self.nodes[sibling].hash,
                side,
            });
            pos = (pos - 1) / 2;
        }
        if self.nodes[0].dirty {
            return Err(stale());
        }

        Ok(Proof {
            index,
            height: self.height,
            steps,
        })
    }
}
