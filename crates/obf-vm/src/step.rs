// crates/obf-vm/src/step.rs

//! The pure step function: `step(tree, index)` advances the Merkleized state
//! by exactly one step.
//!
//! Step 0 activates a staged transaction; every later step charges one gas
//! and executes one opcode. Execution-layer failures are written into the
//! status byte (with the persisted `cells`/`ptr` restored from the snapshot
//! slots in the same step); only tree-access failures become Rust errors.

use obf_core::layout::{
    self, cells_slot, code_slot, GAS_PER_PAYLOAD_BYTE, GAS_STIPEND, INPUT_SLOT, OUTPUT_SLOT,
    SENDER_LEN, STACK_SLOT,
};
use obf_core::status::{exit_code, Status};
use obf_core::StateAccess;
use obf_merkle::{BinaryMerkleTree, TreeError};

/// Apply step `index` to the tree.
///
/// The function is total over well-formed trees: every deterministic outcome
/// of the opcode (including every error code) is encoded into the post-state.
/// An `Err` only means the tree could not answer an access, which on a
/// partial tree is the insufficient-witness condition.
pub fn step(tree: &mut BinaryMerkleTree, index: u64) -> Result<(), TreeError> {
    let mut st = StateAccess::new(tree);
    if index == 0 {
        return activate(&mut st);
    }
    if !st.status()?.is_running() {
        // Halted: structural no-op, the post-root equals the pre-root.
        return Ok(());
    }

    let id = st.tx_contract()?;
    let pc = st.pc()?;
    let code_len = st.list_len(code_slot(id))?;
    if pc >= code_len {
        return halt_with_error(&mut st, id, exit_code::OUT_OF_CODE);
    }

    // One gas per opcode, charged before execution.
    let gas = st.gas()?;
    if gas == 0 {
        return halt_with_error(&mut st, id, exit_code::OUT_OF_GAS);
    }
    st.set_gas(gas - 1)?;

    let op = st.byte_at(code_slot(id), pc)?;
    match op {
        b'>' => move_right(&mut st, id, pc),
        b'<' => move_left(&mut st, id, pc),
        b'+' => add_to_cell(&mut st, id, pc, 1),
        b'-' => add_to_cell(&mut st, id, pc, 255),
        b'.' => emit_output(&mut st, id, pc),
        b',' => read_input(&mut st, id, pc),
        b'[' => loop_enter(&mut st, id, pc, code_len),
        b']' => loop_exit(&mut st, id, pc),
        // Anything else is a no-op that still costs the step and the gas.
        _ => st.set_pc(pc + 1),
    }
}

/// Step 0: turn the staged transaction into live execution state.
///
/// Everything written here derives from tree reads (input length, contract
/// id, the persisted fields being snapshotted), which keeps the activation
/// step replayable from a witness alone.
fn activate(st: &mut StateAccess<'_>) -> Result<(), TreeError> {
    let id = st.tx_contract()?;
    let input_len = st.list_len(INPUT_SLOT)?;
    let payload_len = input_len.saturating_sub(SENDER_LEN as u64);

    st.set_pc(0)?;
    st.set_in_ptr(0)?;
    st.set_list_len(STACK_SLOT, 0)?;
    st.set_list_len(OUTPUT_SLOT, 0)?;
    st.set_gas(GAS_STIPEND + GAS_PER_PAYLOAD_BYTE * payload_len)?;

    let cells = st.cells_root(id)?;
    st.set_snapshot_cells(cells)?;
    let ptr = st.ptr_leaf(id)?;
    st.set_snapshot_ptr(ptr)?;

    st.set_status(Status::Running)
}

/// Halt with an execution error: write the status byte and restore the
/// persisted `cells`/`ptr` from the snapshot slots, all within this step.
fn halt_with_error(st: &mut StateAccess<'_>, id: u8, code: u8) -> Result<(), TreeError> {
    let cells = st.snapshot_cells()?;
    st.set_cells_root(id, cells)?;
    let ptr = st.snapshot_ptr()?;
    st.set_ptr_leaf(id, ptr)?;
    st.set_status(Status::Error(code))
}

fn move_right(st: &mut StateAccess<'_>, id: u8, pc: u64) -> Result<(), TreeError> {
    let ptr = st.ptr(id)?;
    if ptr + 1 >= layout::CELLS_CAPACITY {
        return halt_with_error(st, id, exit_code::TAPE_OVERFLOW);
    }
    let ptr = ptr + 1;
    st.set_ptr(id, ptr)?;
    let len = st.list_len(cells_slot(id))?;
    if ptr == len {
        // Grow the tape by one zero cell so the pointer stays addressable.
        st.set_list_len(cells_slot(id), len + 1)?;
    }
    st.set_pc(pc + 1)
}

fn move_left(st: &mut StateAccess<'_>, id: u8, pc: u64) -> Result<(), TreeError> {
    let ptr = st.ptr(id)?;
    if ptr == 0 {
        return halt_with_error(st, id, exit_code::TAPE_UNDERFLOW);
    }
    st.set_ptr(id, ptr - 1)?;
    st.set_pc(pc + 1)
}

fn add_to_cell(st: &mut StateAccess<'_>, id: u8, pc: u64, delta: u8) -> Result<(), TreeError> {
    let ptr = st.ptr(id)?;
    let v = st.byte_at(cells_slot(id), ptr)?;
    st.set_byte_at(cells_slot(id), ptr, v.wrapping_add(delta))?;
    st.set_pc(pc + 1)
}

fn emit_output(st: &mut StateAccess<'_>, id: u8, pc: u64) -> Result<(), TreeError> {
    let ptr = st.ptr(id)?;
    let v = st.byte_at(cells_slot(id), ptr)?;
    let len = st.list_len(OUTPUT_SLOT)?;
    if len >= layout::OUTPUT_CAPACITY {
        return halt_with_error(st, id, exit_code::OUTPUT_OVERFLOW);
    }
    st.set_byte_at(OUTPUT_SLOT, len, v)?;
    st.set_list_len(OUTPUT_SLOT, len + 1)?;
    match v {
        0x00 => {
            st.set_pc(pc + 1)?;
            st.set_status(Status::Success)
        }
        // 0xff is the running sentinel: appended but never a halt.
        0xff => st.set_pc(pc + 1),
        code => halt_with_error(st, id, code),
    }
}

fn read_input(st: &mut StateAccess<'_>, id: u8, pc: u64) -> Result<(), TreeError> {
    let in_ptr = st.in_ptr()?;
    let input_len = st.list_len(INPUT_SLOT)?;
    if in_ptr >= input_len {
        return halt_with_error(st, id, exit_code::INPUT_EXHAUSTED);
    }
    let v = st.byte_at(INPUT_SLOT, in_ptr)?;
    let ptr = st.ptr(id)?;
    st.set_byte_at(cells_slot(id), ptr, v)?;
    st.set_in_ptr(in_ptr + 1)?;
    st.set_pc(pc + 1)
}

fn loop_enter(st: &mut StateAccess<'_>, id: u8, pc: u64, code_len: u64) -> Result<(), TreeError> {
    let ptr = st.ptr(id)?;
    let v = st.byte_at(cells_slot(id), ptr)?;
    if v == 0 {
        return scan_to_matching_bracket(st, id, pc, code_len);
    }
    let depth = st.list_len(STACK_SLOT)?;
    if depth >= layout::STACK_CAPACITY {
        return halt_with_error(st, id, exit_code::STACK_OVERFLOW);
    }
    st.set_u64_at_index(STACK_SLOT, depth, pc)?;
    st.set_list_len(STACK_SLOT, depth + 1)?;
    st.set_pc(pc + 1)
}

/// Forward branch: advance `pc` to one past the matching `]`.
///
/// The scan is a strictly left-to-right walk over `code` within this single
/// step; every probed byte is an access the witness must cover.
fn scan_to_matching_bracket(
    st: &mut StateAccess<'_>,
    id: u8,
    pc: u64,
    code_len: u64,
) -> Result<(), TreeError> {
    let mut nesting = 1u64;
    let mut i = pc + 1;
    while i < code_len {
        match st.byte_at(code_slot(id), i)? {
            b'[' => nesting += 1,
            b']' => {
                nesting -= 1;
                if nesting == 0 {
                    return st.set_pc(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    halt_with_error(st, id, exit_code::UNMATCHED_BRACKET)
}

fn loop_exit(st: &mut StateAccess<'_>, id: u8, pc: u64) -> Result<(), TreeError> {
    let depth = st.list_len(STACK_SLOT)?;
    if depth == 0 {
        return halt_with_error(st, id, exit_code::STACK_UNDERFLOW);
    }
    let ptr = st.ptr(id)?;
    let v = st.byte_at(cells_slot(id), ptr)?;
    if v == 0 {
        // Leave the loop: pop and fall through. The popped entry is zeroed so
        // stack contents beyond the length leaf stay canonical.
        st.set_u64_at_index(STACK_SLOT, depth - 1, 0)?;
        st.set_list_len(STACK_SLOT, depth - 1)?;
        st.set_pc(pc + 1)
    } else {
        // Loop again: jump back to the `[` without popping.
        let back = st.u64_at_index(STACK_SLOT, depth - 1)?;
        st.set_pc(back)
    }
}
