//! # Leaf Set Builder
//!
//! Turns an ordered list of content digests into the leaf sequence the tree
//! engine expects:
//!
//! 1. an identity (version) leaf is placed at index 0;
//! 2. the sequence is padded to the next power of two by repeating it
//!    cyclically from the start (leaf `M + k` is leaf `k mod M`).
//!
//! The cyclic padding rule changes the root bit-for-bit, so it is fixed:
//! never pad with zeros or with copies of the last element.

use super::hash::Hash;

/// Index of the reserved identity leaf.
pub const IDENTITY_INDEX: u64 = 0;

/// Number of leaves a sequence of `len` items is padded to.
pub fn padded_len(len: usize) -> usize {
    len.max(1).next_power_of_two()
}

/// Prepend `identity` and pad cyclically to a power of two.
pub fn assemble(identity: Hash, digests: impl IntoIterator<Item = Hash>) -> Vec<Hash> {
    let digests = digests.into_iter();
    let mut leaves = Vec::with_capacity(digests.size_hint().0 + 1);
    leaves.push(identity);
    leaves.extend(digests);
    pad_cyclic(&mut leaves);
    leaves
}

/// Pad `leaves` in place by cyclic repetition. An empty input stays empty.
pub fn pad_cyclic(leaves: &mut Vec<Hash>) {
    let original = leaves.len();
    if original == 0 {
        return;
    }
    let target = padded_len(original);
    leaves.reserve(target - original);
    for k in 0..target - original {
        leaves.push(leaves[k % original]);
    }
}

/// Every leaf position that holds a copy of the item at `source` once a
/// sequence of `original` items is padded to `padded` leaves.
pub fn copies_of(source: usize, original: usize, padded: usize) -> impl Iterator<Item = usize> {
    (source..padded).step_by(original.max(1)).take_while(move |_| source < original)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u8) -> Hash {
        Hash::digest([n])
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 1);
        assert_eq!(padded_len(1), 1);
        assert_eq!(padded_len(2), 2);
        assert_eq!(padded_len(3), 4);
        assert_eq!(padded_len(5), 8);
        assert_eq!(padded_len(8), 8);
        assert_eq!(padded_len(1025), 2048);
    }

    #[test]
    fn test_identity_only() {
        let leaves = assemble(Hash::ZERO, Vec::new());
        assert_eq!(leaves, vec![Hash::ZERO]);
    }

    #[test]
    fn test_exact_power_of_two_is_not_padded() {
        let leaves = assemble(Hash::ZERO, vec![h(1), h(2), h(3)]);
        assert_eq!(leaves, vec![Hash::ZERO, h(1), h(2), h(3)]);
    }

    #[test]
    fn test_cyclic_padding() {
        // identity + 4 digests = 5 leaves, padded to 8 with leaves 0, 1, 2
        let leaves = assemble(Hash::ZERO, vec![h(1), h(2), h(3), h(4)]);
        assert_eq!(
            leaves,
            vec![Hash::ZERO, h(1), h(2), h(3), h(4), Hash::ZERO, h(1), h(2)]
        );
    }

    #[test]
    fn test_padding_is_deterministic() {
        let digests: Vec<Hash> = (0..37).map(h).collect();
        let a = assemble(Hash::ZERO, digests.clone());
        let b = assemble(Hash::ZERO, digests);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        for k in 38..64 {
            assert_eq!(a[k], a[k - 38]);
        }
    }

    #[test]
    fn test_copies_of() {
        // 5 items padded to 8: item 1 also lives at 6, item 4 has no copy
        assert_eq!(copies_of(1, 5, 8).collect::<Vec<_>>(), vec![1, 6]);
        assert_eq!(copies_of(4, 5, 8).collect::<Vec<_>>(), vec![4]);
        // 3 items padded to 4: item 0 also lives at 3
        assert_eq!(copies_of(0, 3, 4).collect::<Vec<_>>(), vec![0, 3]);
        // beyond the original items there is nothing to copy
        assert_eq!(copies_of(5, 5, 8).count(), 0);
    }
}
