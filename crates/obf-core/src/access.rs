// crates/obf-core/src/access.rs

//! Typed accessors over the state tree.
//!
//! The step VM never touches raw gindices: every read and write goes through
//! one of these helpers, which compute the canonical gindex from the layout,
//! call the tree's `get`/`set` (which logs the access when a recorder is
//! active), and decode/encode the little-endian packing.

use obf_merkle::{BinaryMerkleTree, Gindex, Node, TreeError};

use crate::layout;
use crate::status::Status;

/// Borrowed view over a state tree with typed field access.
pub struct StateAccess<'t> {
    tree: &'t mut BinaryMerkleTree,
}

impl<'t> StateAccess<'t> {
    /// Wrap a tree for typed access.
    pub fn new(tree: &'t mut BinaryMerkleTree) -> Self {
        Self { tree }
    }

    /* ------------------------------ scalars ------------------------------ */

    /// Read a u64 scalar slot (little-endian, first 8 leaf bytes).
    pub fn u64_slot(&mut self, slot: Gindex) -> Result<u64, TreeError> {
        let leaf = self.tree.get(layout::scalar_leaf(slot))?;
        Ok(u64_at(&leaf, 0))
    }

    /// Overwrite a u64 scalar slot.
    pub fn set_u64_slot(&mut self, slot: Gindex, value: u64) -> Result<(), TreeError> {
        let mut leaf = [0u8; 32];
        leaf[..8].copy_from_slice(&value.to_le_bytes());
        self.tree.set(layout::scalar_leaf(slot), leaf)
    }

    /// Execution status.
    pub fn status(&mut self) -> Result<Status, TreeError> {
        let leaf = self.tree.get(layout::scalar_leaf(layout::STATUS_SLOT))?;
        Ok(Status::from_byte(leaf[0]))
    }

    /// Overwrite the execution status.
    pub fn set_status(&mut self, status: Status) -> Result<(), TreeError> {
        let mut leaf = [0u8; 32];
        leaf[0] = status.as_byte();
        self.tree.set(layout::scalar_leaf(layout::STATUS_SLOT), leaf)
    }

    /// Program counter.
    pub fn pc(&mut self) -> Result<u64, TreeError> {
        self.u64_slot(layout::PC_SLOT)
    }

    /// Overwrite the program counter.
    pub fn set_pc(&mut self, pc: u64) -> Result<(), TreeError> {
        self.set_u64_slot(layout::PC_SLOT, pc)
    }

    /// Remaining gas.
    pub fn gas(&mut self) -> Result<u64, TreeError> {
        self.u64_slot(layout::GAS_SLOT)
    }

    /// Overwrite the remaining gas.
    pub fn set_gas(&mut self, gas: u64) -> Result<(), TreeError> {
        self.set_u64_slot(layout::GAS_SLOT, gas)
    }

    /// Next input read index.
    pub fn in_ptr(&mut self) -> Result<u64, TreeError> {
        self.u64_slot(layout::IN_PTR_SLOT)
    }

    /// Overwrite the input read index.
    pub fn set_in_ptr(&mut self, v: u64) -> Result<(), TreeError> {
        self.set_u64_slot(layout::IN_PTR_SLOT, v)
    }

    /// Addressed contract id (masked to the 256 contract slots).
    pub fn tx_contract(&mut self) -> Result<u8, TreeError> {
        Ok((self.u64_slot(layout::TX_CONTRACT_SLOT)? & 0xff) as u8)
    }

    /// Stage the addressed contract id.
    pub fn set_tx_contract(&mut self, id: u8) -> Result<(), TreeError> {
        self.set_u64_slot(layout::TX_CONTRACT_SLOT, u64::from(id))
    }

    /// Contract `id`'s tape pointer.
    pub fn ptr(&mut self, id: u8) -> Result<u64, TreeError> {
        self.u64_slot(layout::ptr_slot(id))
    }

    /// Overwrite contract `id`'s tape pointer.
    pub fn set_ptr(&mut self, id: u8, v: u64) -> Result<(), TreeError> {
        self.set_u64_slot(layout::ptr_slot(id), v)
    }

    /* ------------------------------- lists ------------------------------- */

    /// Length of a list slot.
    pub fn list_len(&mut self, slot: Gindex) -> Result<u64, TreeError> {
        let leaf = self.tree.get(layout::list_len_leaf(slot))?;
        Ok(u64_at(&leaf, 0))
    }

    /// Overwrite the length of a list slot.
    pub fn set_list_len(&mut self, slot: Gindex, len: u64) -> Result<(), TreeError> {
        let mut leaf = [0u8; 32];
        leaf[..8].copy_from_slice(&len.to_le_bytes());
        self.tree.set(layout::list_len_leaf(slot), leaf)
    }

    /// Read the `index`-th byte element of a list.
    pub fn byte_at(&mut self, slot: Gindex, index: u64) -> Result<u8, TreeError> {
        let (g, off) = layout::byte_elem(slot, index);
        Ok(self.tree.get(g)?[off])
    }

    /// Overwrite the `index`-th byte element of a list (read-modify-write,
    /// the other 31 bytes of the leaf are preserved).
    pub fn set_byte_at(&mut self, slot: Gindex, index: u64, value: u8) -> Result<(), TreeError> {
        let (g, off) = layout::byte_elem(slot, index);
        let mut leaf = self.tree.get(g)?;
        leaf[off] = value;
        self.tree.set(g, leaf)
    }

    /// Read the `index`-th u64 element of a list (the stack).
    pub fn u64_at_index(&mut self, slot: Gindex, index: u64) -> Result<u64, TreeError> {
        let (g, off) = layout::u64_elem(slot, index);
        let leaf = self.tree.get(g)?;
        Ok(u64_at(&leaf, off))
    }

    /// Overwrite the `index`-th u64 element of a list.
    pub fn set_u64_at_index(
        &mut self,
        slot: Gindex,
        index: u64,
        value: u64,
    ) -> Result<(), TreeError> {
        let (g, off) = layout::u64_elem(slot, index);
        let mut leaf = self.tree.get(g)?;
        leaf[off..off + 8].copy_from_slice(&value.to_le_bytes());
        self.tree.set(g, leaf)
    }

    /* ----------------------------- snapshots ----------------------------- */

    /// The saved `cells` field root (opaque 32 bytes).
    pub fn snapshot_cells(&mut self) -> Result<Node, TreeError> {
        self.tree.get(layout::scalar_leaf(layout::SNAP_CELLS_SLOT))
    }

    /// Save a `cells` field root into the snapshot slot.
    pub fn set_snapshot_cells(&mut self, node: Node) -> Result<(), TreeError> {
        self.tree.set(layout::scalar_leaf(layout::SNAP_CELLS_SLOT), node)
    }

    /// The saved `ptr` leaf (opaque 32 bytes).
    pub fn snapshot_ptr(&mut self) -> Result<Node, TreeError> {
        self.tree.get(layout::scalar_leaf(layout::SNAP_PTR_SLOT))
    }

    /// Save a `ptr` leaf into the snapshot slot.
    pub fn set_snapshot_ptr(&mut self, node: Node) -> Result<(), TreeError> {
        self.tree.set(layout::scalar_leaf(layout::SNAP_PTR_SLOT), node)
    }

    /// Contract `id`'s whole `cells` field root (body + length).
    pub fn cells_root(&mut self, id: u8) -> Result<Node, TreeError> {
        self.tree.get(layout::cells_slot(id))
    }

    /// Replace contract `id`'s whole `cells` field with a saved root.
    pub fn set_cells_root(&mut self, id: u8, node: Node) -> Result<(), TreeError> {
        self.tree.set(layout::cells_slot(id), node)
    }

    /// Contract `id`'s raw `ptr` leaf.
    pub fn ptr_leaf(&mut self, id: u8) -> Result<Node, TreeError> {
        self.tree.get(layout::scalar_leaf(layout::ptr_slot(id)))
    }

    /// Replace contract `id`'s raw `ptr` leaf.
    pub fn set_ptr_leaf(&mut self, id: u8, node: Node) -> Result<(), TreeError> {
        self.tree.set(layout::scalar_leaf(layout::ptr_slot(id)), node)
    }
}

#[inline]
fn u64_at(leaf: &Node, off: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&leaf[off..off + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{cells_slot, STACK_SLOT, TREE_DEPTH};

    fn fresh() -> BinaryMerkleTree {
        BinaryMerkleTree::new(TREE_DEPTH)
    }

    #[test]
    fn scalar_roundtrips() {
        let mut tree = fresh();
        let mut st = StateAccess::new(&mut tree);
        assert_eq!(st.pc().unwrap(), 0);
        st.set_pc(42).unwrap();
        st.set_gas(1128).unwrap();
        st.set_ptr(3, 7).unwrap();
        assert_eq!(st.pc().unwrap(), 42);
        assert_eq!(st.gas().unwrap(), 1128);
        assert_eq!(st.ptr(3).unwrap(), 7);
        // Untouched contracts are unaffected.
        assert_eq!(st.ptr(4).unwrap(), 0);
    }

    #[test]
    fn status_defaults_to_success_byte() {
        let mut tree = fresh();
        let mut st = StateAccess::new(&mut tree);
        // A pristine tree reads the zero byte, i.e. "success".
        assert_eq!(st.status().unwrap(), Status::Success);
        st.set_status(Status::Running).unwrap();
        assert_eq!(st.status().unwrap(), Status::Running);
        st.set_status(Status::Error(0x05)).unwrap();
        assert_eq!(st.status().unwrap(), Status::Error(0x05));
    }

    #[test]
    fn byte_elements_pack_into_shared_leaves() {
        let mut tree = fresh();
        let mut st = StateAccess::new(&mut tree);
        let slot = cells_slot(0);
        for i in 0..40u64 {
            st.set_byte_at(slot, i, i as u8).unwrap();
        }
        for i in 0..40u64 {
            assert_eq!(st.byte_at(slot, i).unwrap(), i as u8);
        }
        // Writing one element leaves its leaf neighbours intact.
        st.set_byte_at(slot, 5, 0xee).unwrap();
        assert_eq!(st.byte_at(slot, 4).unwrap(), 4);
        assert_eq!(st.byte_at(slot, 6).unwrap(), 6);
    }

    #[test]
    fn u64_elements_roundtrip() {
        let mut tree = fresh();
        let mut st = StateAccess::new(&mut tree);
        for i in 0..9u64 {
            st.set_u64_at_index(STACK_SLOT, i, 1000 + i).unwrap();
        }
        for i in 0..9u64 {
            assert_eq!(st.u64_at_index(STACK_SLOT, i).unwrap(), 1000 + i);
        }
    }

    #[test]
    fn cells_root_restore_rolls_back_writes() {
        let mut tree = fresh();
        let mut st = StateAccess::new(&mut tree);
        st.set_byte_at(cells_slot(0), 0, 9).unwrap();
        st.set_list_len(cells_slot(0), 1).unwrap();
        let saved = st.cells_root(0).unwrap();

        st.set_byte_at(cells_slot(0), 0, 200).unwrap();
        st.set_byte_at(cells_slot(0), 1, 201).unwrap();
        st.set_list_len(cells_slot(0), 2).unwrap();
        assert_ne!(st.cells_root(0).unwrap(), saved);

        st.set_cells_root(0, saved).unwrap();
        assert_eq!(st.cells_root(0).unwrap(), saved);
    }
}
