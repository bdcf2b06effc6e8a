//! # merkle_snapshot
//!
//! Fingerprints an ordered collection of files (typically a whole source tree)
//! into a single Merkle root, and recomputes that root cheaply after isolated
//! leaf changes instead of rehashing everything.
//!
//! ## Architecture Overview
//!
//! - **Scanner** (`scan`): recursive discovery with include/exclude filters and
//!   deterministic ordering, plus SHA-256 digests of file contents
//! - **Leaf Set Builder** (`tree::leaves`): identity leaf at index 0 and cyclic
//!   padding up to a power of two
//! - **Tree Engine** (`tree::merkle`): array-backed perfect binary tree with
//!   dirty-flagged lazy recomputation and inclusion proofs
//! - **Snapshot** (`snapshot`): the end-to-end directory → root pipeline

pub mod config;
pub mod error;
pub mod scan;
pub mod snapshot;
pub mod tree;

pub use config::{Config, ContentMode};
pub use error::{ScanError, TreeError};
pub use scan::Scanner;
pub use snapshot::Snapshot;
pub use tree::{Hash, MerkleTree, Proof, ProofStep, SharedTree, Side};
