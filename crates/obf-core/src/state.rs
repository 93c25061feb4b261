// crates/obf-core/src/state.rs

//! The world-state model: up to 256 contracts, each with persisted `code`,
//! `cells`, and `ptr`, and its projection into (and out of) the state tree.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use obf_merkle::{BinaryMerkleTree, TreeError};
use serde::{Deserialize, Serialize};

use crate::access::StateAccess;
use crate::layout;

/// One contract slot: program bytes, memory tape, and tape pointer.
///
/// `code` is a string of Brainfuck source bytes; only the eight opcode
/// characters have an effect, everything else is a gas-consuming no-op.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    /// Program source; fixed at creation.
    pub code: String,
    /// Current tape index.
    pub ptr: u64,
    /// Memory tape.
    #[serde(default)]
    pub cells: Vec<u8>,
}

/// The full world state: contract slots by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldState {
    /// Populated contract slots (absent ids hash as zero subtrees).
    pub contracts: BTreeMap<u8, ContractState>,
}

impl WorldState {
    /// Normalize loaded fields: `cells` is zero-extended so `ptr` is always
    /// addressable, with a minimum length of one.
    pub fn normalize(&mut self) {
        for contract in self.contracts.values_mut() {
            let want = (contract.ptr as usize + 1).max(1);
            if contract.cells.len() < want {
                contract.cells.resize(want, 0);
            }
        }
    }

    /// Project the world state into a fresh complete tree.
    ///
    /// Bounds are checked against the schema capacities; the execution
    /// subtree is left untouched (all zero).
    pub fn build_tree(&self) -> Result<BinaryMerkleTree> {
        let mut tree = BinaryMerkleTree::new(layout::TREE_DEPTH);
        for (&id, contract) in &self.contracts {
            write_contract(&mut tree, id, contract)
                .with_context(|| format!("loading contract {id} into the state tree"))?;
        }
        Ok(tree)
    }
}

fn write_contract(tree: &mut BinaryMerkleTree, id: u8, contract: &ContractState) -> Result<()> {
    let code = contract.code.as_bytes();
    if code.len() as u64 > layout::CODE_CAPACITY {
        bail!(
            "code is {} bytes, capacity is {}",
            code.len(),
            layout::CODE_CAPACITY
        );
    }
    if contract.cells.len() as u64 > layout::CELLS_CAPACITY {
        bail!(
            "cells tape is {} bytes, capacity is {}",
            contract.cells.len(),
            layout::CELLS_CAPACITY
        );
    }
    if contract.ptr >= layout::CELLS_CAPACITY {
        bail!(
            "ptr {} is outside the cell capacity {}",
            contract.ptr,
            layout::CELLS_CAPACITY
        );
    }

    let mut st = StateAccess::new(tree);
    for (i, &b) in code.iter().enumerate() {
        st.set_byte_at(layout::code_slot(id), i as u64, b)?;
    }
    st.set_list_len(layout::code_slot(id), code.len() as u64)?;
    for (i, &b) in contract.cells.iter().enumerate() {
        st.set_byte_at(layout::cells_slot(id), i as u64, b)?;
    }
    st.set_list_len(layout::cells_slot(id), contract.cells.len() as u64)?;
    st.set_ptr(id, contract.ptr)?;
    Ok(())
}

/// Read a contract's persisted `cells` and `ptr` back out of a tree.
///
/// `code` is immutable during execution, so callers take it from the model
/// rather than decoding tree bytes.
pub fn read_persisted(tree: &mut BinaryMerkleTree, id: u8) -> Result<(Vec<u8>, u64), TreeError> {
    let mut st = StateAccess::new(tree);
    let len = st.list_len(layout::cells_slot(id))?;
    let mut cells = Vec::with_capacity(len as usize);
    for i in 0..len {
        cells.push(st.byte_at(layout::cells_slot(id), i)?);
    }
    let ptr = st.ptr(id)?;
    Ok((cells, ptr))
}
