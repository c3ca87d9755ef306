use crate::value::canonical_amount;
use sha2::{Digest, Sha256};

/// Computes a coin's id: `sha256(parent ∥ puzzle_hash ∥ canonical(amount))`,
/// Chia's canonical coin identity function.
#[must_use]
pub fn coin_id(parent_id: [u8; 32], puzzle_hash: [u8; 32], amount: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(parent_id);
    hasher.update(puzzle_hash);
    hasher.update(canonical_amount(amount));
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_zero_hashes_like_empty_atom() {
        let id_a = coin_id([1; 32], [2; 32], 0);
        let mut hasher = Sha256::new();
        hasher.update([1u8; 32]);
        hasher.update([2u8; 32]);
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(id_a, expected);
    }

    #[test]
    fn distinct_amounts_hash_differently() {
        let a = coin_id([1; 32], [2; 32], 1);
        let b = coin_id([1; 32], [2; 32], 2);
        assert_ne!(a, b);
    }
}
