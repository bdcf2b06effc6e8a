//! # Merkle Tree Module
//!
//! - **`hash`**: SHA-256 hash values, leaf digests and the `compress` function
//! - **`leaves`**: identity leaf and cyclic power-of-two padding
//! - **`merkle`**: the dirty-flagged tree engine
//! - **`proof`**: inclusion proofs and their verification
//! - **`shared`**: single-writer / multi-reader handle around the engine

pub mod hash;
pub mod leaves;
pub mod merkle;
pub mod proof;
pub mod shared;

pub use hash::{Hash, HASH_LEN};
pub use merkle::MerkleTree;
pub use proof::{Proof, ProofStep, Side};
pub use shared::SharedTree;
