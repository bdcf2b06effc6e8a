//! # Error Types
//!
//! Errors raised by the tree engine and by the file scanner. Engine errors are
//! either local to one call (bad index, stale read) or fatal to a single
//! construction attempt (bad shape). A failed proof verification is not an
//! error: `Proof::verify` simply returns `false`.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the tree engine.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors produced by the Merkle tree engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The requested leaf does not exist. The tree is left untouched.
    #[error("leaf index {index} out of range for tree with {leaves} leaves")]
    IndexOutOfRange { index: u64, leaves: u64 },

    /// The leaf count handed to `build` is zero or not a power of two.
    #[error("invalid tree shape: {leaves} leaves is not a non-zero power of two")]
    InvalidTreeShape { leaves: usize },

    /// The root was read without recomputing pending updates.
    #[error("root hash is stale; call compute_root first")]
    StaleRoot,

    /// A proof was requested across a subtree that has not been recomputed.
    #[error("cannot build proof for leaf {index}: path contains stale hashes")]
    StaleProof { index: u64 },

    /// A hex string could not be decoded into a hash.
    #[error("invalid hash '{input}': {reason}")]
    InvalidHash { input: String, reason: String },
}

/// Errors produced while discovering and digesting files.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan root does not exist or is not a directory: {0:?}")]
    MissingRoot(PathBuf),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("digest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("digest queue closed: {0}")]
    Queue(#[from] tokio::sync::AcquireError),
}
