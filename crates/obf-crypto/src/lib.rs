//! Minimal crypto substrate: SHA-256 pair compression and zero-subtree hashes.
//!
//! ## Overview
//! - [`hash_pair`] is the single binary-Merkle primitive used across the
//!   workspace: `h(left, right) = SHA256(left ‖ right)` over two 32-byte nodes.
//! - [`ZeroHashes`] is a depth-indexed cache of the hashes of all-zero
//!   subtrees: `Z[0]` is the 32-byte zero leaf and `Z[k] = h(Z[k-1], Z[k-1])`.
//!
//! Both sides of a dispute must agree on these bytes exactly; there is no
//! domain separation and no length framing inside the hash, by construction.
//!
//! ### Example
//! ```
//! use obf_crypto::{hash_pair, ZeroHashes};
//!
//! let zeros = ZeroHashes::new(4);
//! assert_eq!(zeros.get(0), [0u8; 32]);
//! assert_eq!(zeros.get(2), hash_pair(&zeros.get(1), &zeros.get(1)));
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use sha2::{Digest, Sha256};

/// Hash two 32-byte nodes into their parent: `SHA256(left ‖ right)`.
#[inline]
#[must_use]
pub fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(left);
    h.update(right);
    h.finalize().into()
}

/// Precomputed hashes of all-zero subtrees, indexed by subtree height.
///
/// `get(0)` is the zero leaf; `get(k)` is the root of a height-`k` perfect
/// tree whose leaves are all zero. The table is immutable once computed.
#[derive(Clone, Debug)]
pub struct ZeroHashes {
    table: Vec<[u8; 32]>,
}

impl ZeroHashes {
    /// Build the table up to and including `max_height`.
    #[must_use]
    pub fn new(max_height: u32) -> Self {
        let mut table = Vec::with_capacity(max_height as usize + 1);
        table.push([0u8; 32]);
        for k in 1..=max_height as usize {
            let below = table[k - 1];
            table.push(hash_pair(&below, &below));
        }
        Self { table }
    }

    /// The zero-subtree hash for the given height.
    ///
    /// # Panics
    /// Panics if `height` exceeds the height the table was built for.
    #[inline]
    #[must_use]
    pub fn get(&self, height: u32) -> [u8; 32] {
        self.table[height as usize]
    }

    /// Largest height the table covers.
    #[inline]
    #[must_use]
    pub fn max_height(&self) -> u32 {
        (self.table.len() - 1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::{hash_pair, ZeroHashes};

    #[test]
    fn hash_pair_is_deterministic_and_ordered() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(hash_pair(&a, &b), hash_pair(&a, &b));
        // Swapping children must change the parent.
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn zero_table_chains() {
        let zeros = ZeroHashes::new(8);
        assert_eq!(zeros.max_height(), 8);
        assert_eq!(zeros.get(0), [0u8; 32]);
        for k in 1..=8 {
            let below = zeros.get(k - 1);
            assert_eq!(zeros.get(k), hash_pair(&below, &below));
        }
    }

    #[test]
    fn zero_levels_are_distinct() {
        let zeros = ZeroHashes::new(8);
        for k in 1..=8 {
            assert_ne!(zeros.get(k), zeros.get(k - 1));
        }
    }
}
