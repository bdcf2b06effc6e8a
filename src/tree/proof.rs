//! # Inclusion Proofs
//!
//! A proof is the list of sibling hashes from a leaf up to the root, each
//! tagged with the side it occupies in the `compress` call that produced the
//! parent. Verification needs nothing but the proof, the leaf hash and the
//! claimed root.

use std::fmt;

use super::hash::Hash;

/// Which operand of `compress` the sibling is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The sibling is the left operand: `parent = compress(sibling, current)`.
    Left,
    /// The sibling is the right operand: `parent = compress(current, sibling)`.
    Right,
}

/// One level of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Hash,
    pub side: Side,
}

/// Sibling path from leaf `index` to the root of a tree of the given height.
///
/// Steps are ordered from the leaf level upwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub index: u64,
    pub height: u32,
    pub steps: Vec<ProofStep>,
}

impl Proof {
    /// Fold `compress` over `leaf` and the recorded siblings.
    pub fn fold(&self, leaf: &Hash) -> Hash {
        self.steps.iter().fold(*leaf, |current, step| match step.side {
            Side::Left => Hash::compress(&step.sibling, &current),
            Side::Right => Hash::compress(&current, &step.sibling),
        })
    }

    /// True iff folding `leaf` through this proof yields `root`.
    pub fn verify(&self, root: &Hash, leaf: &Hash) -> bool {
        self.steps.len() == self.height as usize && self.fold(leaf) == *root
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "leaf {} (height {})", self.index, self.height)?;
        for step in &self.steps {
            let tag = match step.side {
                Side::Left => 'L',
                Side::Right => 'R',
            };
            writeln!(f, "  {} {}", tag, step.sibling)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_two_levels() {
        let leaves: Vec<Hash> = (0u8..4).map(|i| Hash::digest([i])).collect();
        let left = Hash::compress(&leaves[0], &leaves[1]);
        let right = Hash::compress(&leaves[2], &leaves[3]);
        let root = Hash::compress(&left, &right);

        // leaf 2: sibling 3 on the right, then the left subtree on the left
        let proof = Proof {
            index: 2,
            height: 2,
            steps: vec![
                ProofStep { sibling: leaves[3], side: Side::Right },
                ProofStep { sibling: left, side: Side::Left },
            ],
        };
        assert_eq!(proof.fold(&leaves[2]), root);
        assert!(proof.verify(&root, &leaves[2]));
        assert!(!proof.verify(&root, &leaves[3]));
    }

    #[test]
    fn test_empty_proof_for_single_leaf() {
        let leaf = Hash::digest(b"only");
        let proof = Proof { index: 0, height: 0, steps: vec![] };
        assert!(proof.verify(&leaf, &leaf));
        assert!(!proof.verify(&Hash::ZERO, &leaf));
    }

    #[test]
    fn test_truncated_proof_is_rejected() {
        let a = Hash::digest(b"a");
        let b = Hash::digest(b"b");
        let root = Hash::compress(&a, &b);
        let proof = Proof {
            index: 0,
            height: 2,
            steps: vec![ProofStep { sibling: b, side: Side::Right }],
        };
        assert!(!proof.verify(&root, &a));
    }

    #[test]
    fn test_display() {
        let proof = Proof {
            index: 1,
            height: 1,
            steps: vec![ProofStep { sibling: Hash::ZERO, side: Side::Left }],
        };
        let text = proof.to_string();
        assert!(text.starts_with("leaf 1 (height 1)"));
        assert!(text.contains(&format!("L {}", Hash::ZERO)));
    }
}
