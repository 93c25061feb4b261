// crates/obf-core/src/layout.rs

//! The state layout: a pure, compile-time mapping from named fields to
//! generalized indices in one tree.
//!
//! ## Shape (schema v1)
//!
//! One sparse binary Merkle tree of uniform leaf depth [`TREE_DEPTH`]` = 18`.
//! Gindex 2 roots the **world state**, gindex 3 the **execution state**:
//!
//! - World: 256 contract slots at depth 9, four field slots per contract at
//!   depth 11 (`code` list, `cells` list, `ptr` scalar, one reserved).
//! - Execution: 16 slots at depth 5 (transaction target, `input`, `pc`,
//!   `in_ptr`, `stack`, `status`, `gas`, `output`, and the two rollback
//!   snapshot slots).
//!
//! A **scalar** slot stores its value in the leftmost depth-18 leaf beneath
//! it, little-endian in the first 8 bytes (status uses only byte 0). A
//! **list** slot `s` splits into a body root `2s` (elements packed
//! little-endian into depth-18 leaves, fixed width per list) and a length
//! scalar under `2s + 1`. Leaves beyond a list's length are zero, so a
//! missing node at depth `d` always resolves to the zero subtree of height
//! `18 - d`.
//!
//! Every gindex here is a constant of the protocol; changing any of them is a
//! schema version bump.

use obf_merkle::{gindex, Gindex};

/// Tree depth: all leaves live at depth 18.
pub const TREE_DEPTH: u32 = 18;

/// Number of contract slots in the world state.
pub const MAX_CONTRACTS: u64 = 256;

/// Leading input bytes reserved for the L1 sender address.
pub const SENDER_LEN: usize = 20;

/// Capacity of a contract's `code` list in bytes (64 leaves × 32).
pub const CODE_CAPACITY: u64 = 2048;

/// Capacity of a contract's `cells` tape in bytes.
pub const CELLS_CAPACITY: u64 = 2048;

/// Logical capacity of the transaction `input` list in bytes.
pub const INPUT_CAPACITY: u64 = 2048;

/// Logical capacity of the `output` list in bytes.
pub const OUTPUT_CAPACITY: u64 = 2048;

/// Logical capacity of the loop-return `stack` in entries.
pub const STACK_CAPACITY: u64 = 1024;

/// Flat gas stipend granted to every transaction.
pub const GAS_STIPEND: u64 = 1000;

/// Gas granted per user payload byte (sender bytes are free).
pub const GAS_PER_PAYLOAD_BYTE: u64 = 128;

const WORLD: Gindex = 2;
const EXEC: Gindex = 3;
const CONTRACT_BITS: u32 = 8;
const EXEC_SLOT_BITS: u32 = 4;

/// Execution slot: addressed contract id (u64 scalar).
pub const TX_CONTRACT_SLOT: Gindex = EXEC << EXEC_SLOT_BITS;
/// Execution slot: transaction input bytes (sender ‖ payload).
pub const INPUT_SLOT: Gindex = TX_CONTRACT_SLOT + 1;
/// Execution slot: program counter (u64 scalar).
pub const PC_SLOT: Gindex = TX_CONTRACT_SLOT + 2;
/// Execution slot: next input read index (u64 scalar).
pub const IN_PTR_SLOT: Gindex = TX_CONTRACT_SLOT + 3;
/// Execution slot: loop-return program counters (u64 list).
pub const STACK_SLOT: Gindex = TX_CONTRACT_SLOT + 4;
/// Execution slot: status byte (u8 scalar).
pub const STATUS_SLOT: Gindex = TX_CONTRACT_SLOT + 5;
/// Execution slot: remaining gas (u64 scalar).
pub const GAS_SLOT: Gindex = TX_CONTRACT_SLOT + 6;
/// Execution slot: bytes emitted so far (byte list).
pub const OUTPUT_SLOT: Gindex = TX_CONTRACT_SLOT + 7;
/// Execution slot: pre-transition snapshot of the addressed contract's
/// `cells` field root (opaque 32-byte value).
pub const SNAP_CELLS_SLOT: Gindex = TX_CONTRACT_SLOT + 8;
/// Execution slot: pre-transition snapshot of the addressed contract's
/// `ptr` leaf (opaque 32-byte value).
pub const SNAP_PTR_SLOT: Gindex = TX_CONTRACT_SLOT + 9;

/// Root of contract `id`'s subtree (depth 9).
#[inline]
#[must_use]
pub fn contract_root(id: u8) -> Gindex {
    (WORLD << CONTRACT_BITS) | Gindex::from(id)
}

/// Slot of contract `id`'s `code` list (depth 11).
#[inline]
#[must_use]
pub fn code_slot(id: u8) -> Gindex {
    contract_root(id) << 2
}

/// Slot of contract `id`'s `cells` list (depth 11).
#[inline]
#[must_use]
pub fn cells_slot(id: u8) -> Gindex {
    (contract_root(id) << 2) | 1
}

/// Slot of contract `id`'s `ptr` scalar (depth 11).
#[inline]
#[must_use]
pub fn ptr_slot(id: u8) -> Gindex {
    (contract_root(id) << 2) | 2
}

/// The depth-18 leaf carrying a scalar slot's value.
#[inline]
#[must_use]
pub fn scalar_leaf(slot: Gindex) -> Gindex {
    slot << (TREE_DEPTH - gindex::depth(slot))
}

/// A list slot's body root (its left child).
#[inline]
#[must_use]
pub fn list_body_root(slot: Gindex) -> Gindex {
    slot << 1
}

/// The leaf carrying a list slot's length.
#[inline]
#[must_use]
pub fn list_len_leaf(slot: Gindex) -> Gindex {
    scalar_leaf((slot << 1) | 1)
}

/// The `leaf_index`-th body leaf of a list slot.
#[inline]
#[must_use]
pub fn list_leaf(slot: Gindex, leaf_index: u64) -> Gindex {
    (list_body_root(slot) << (TREE_DEPTH - gindex::depth(slot) - 1)) | leaf_index
}

/// Leaf gindex and byte offset of the `index`-th u8 element of a list.
#[inline]
#[must_use]
pub fn byte_elem(slot: Gindex, index: u64) -> (Gindex, usize) {
    (list_leaf(slot, index / 32), (index % 32) as usize)
}

/// Leaf gindex and byte offset of the `index`-th u64 element of a list.
#[inline]
#[must_use]
pub fn u64_elem(slot: Gindex, index: u64) -> (Gindex, usize) {
    (list_leaf(slot, index / 4), ((index % 4) * 8) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use obf_merkle::gindex::depth;

    #[test]
    fn slot_depths_match_the_schema() {
        assert_eq!(depth(contract_root(0)), 9);
        assert_eq!(depth(contract_root(255)), 9);
        assert_eq!(depth(code_slot(7)), 11);
        assert_eq!(depth(cells_slot(7)), 11);
        assert_eq!(depth(ptr_slot(7)), 11);
        assert_eq!(depth(STATUS_SLOT), 5);
        assert_eq!(depth(SNAP_PTR_SLOT), 5);
    }

    #[test]
    fn every_addressable_leaf_is_at_tree_depth() {
        assert_eq!(depth(scalar_leaf(PC_SLOT)), TREE_DEPTH);
        assert_eq!(depth(scalar_leaf(ptr_slot(3))), TREE_DEPTH);
        assert_eq!(depth(list_len_leaf(code_slot(3))), TREE_DEPTH);
        assert_eq!(depth(list_leaf(code_slot(3), 0)), TREE_DEPTH);
        assert_eq!(depth(list_leaf(code_slot(3), 63)), TREE_DEPTH);
        assert_eq!(depth(list_leaf(INPUT_SLOT, 0)), TREE_DEPTH);
        let (g, off) = byte_elem(cells_slot(0), CELLS_CAPACITY - 1);
        assert_eq!(depth(g), TREE_DEPTH);
        assert_eq!(off, 31);
        let (g, off) = u64_elem(STACK_SLOT, STACK_CAPACITY - 1);
        assert_eq!(depth(g), TREE_DEPTH);
        assert_eq!(off, 24);
    }

    #[test]
    fn contract_regions_are_disjoint() {
        use obf_merkle::gindex::is_in_subtree;
        assert!(!is_in_subtree(code_slot(1), contract_root(0)));
        assert!(is_in_subtree(code_slot(1), contract_root(1)));
        assert!(is_in_subtree(list_leaf(cells_slot(9), 5), contract_root(9)));
        // World and execution regions never overlap.
        assert!(!is_in_subtree(scalar_leaf(STATUS_SLOT), 2));
        assert!(is_in_subtree(scalar_leaf(STATUS_SLOT), 3));
        assert!(is_in_subtree(scalar_leaf(ptr_slot(200)), 2));
    }

    #[test]
    fn adjacent_elements_share_leaves_as_packed() {
        let (g0, o0) = byte_elem(INPUT_SLOT, 0);
        let (g31, o31) = byte_elem(INPUT_SLOT, 31);
        let (g32, o32) = byte_elem(INPUT_SLOT, 32);
        assert_eq!(g0, g31);
        assert_eq!((o0, o31), (0, 31));
        assert_eq!(g32, g0 + 1);
        assert_eq!(o32, 0);

        let (s0, so0) = u64_elem(STACK_SLOT, 0);
        let (s3, so3) = u64_elem(STACK_SLOT, 3);
        let (s4, so4) = u64_elem(STACK_SLOT, 4);
        assert_eq!(s0, s3);
        assert_eq!((so0, so3), (0, 24));
        assert_eq!(s4, s0 + 1);
        assert_eq!(so4, 0);
    }
}
