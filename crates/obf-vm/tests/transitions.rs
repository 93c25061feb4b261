//! End-to-end transition semantics: commit on success, rollback on every
//! execution error, and halt idempotence.

use obf_core::layout::{cells_slot, contract_root, OUTPUT_SLOT};
use obf_core::state::read_persisted;
use obf_core::status::{exit_code, Status};
use obf_core::{ContractState, StateAccess, WorldState};
use obf_vm::{apply_transaction, run_transition, stage_transaction, step, Transaction};

/// 21 reads to skip the sender and load the payload byte, a multiply-by-7
/// loop, then a success-emitting `.` on the zeroed cell.
const MUL7: &str = ",,,,,,,,,,,,,,,,,,,,,[->+++++++<].";

fn single_contract_state(code: &str, cells: Vec<u8>, ptr: u64) -> WorldState {
    let mut state = WorldState::default();
    state.contracts.insert(
        0,
        ContractState {
            code: code.to_owned(),
            ptr,
            cells,
        },
    );
    state.normalize();
    state
}

fn tx(payload: &[u8]) -> Transaction {
    Transaction {
        sender: [0xaa; 20],
        contract: 0,
        payload: payload.to_vec(),
    }
}

#[test]
fn multiply_by_seven_commits() {
    let mut state = single_contract_state(MUL7, vec![0], 0);
    let outcome = apply_transaction(&mut state, &tx(&[0x03])).unwrap();

    assert_eq!(outcome.status, Status::Success);
    assert_eq!(state.contracts[&0].cells, vec![0, 21]);
    assert_eq!(state.contracts[&0].ptr, 0);
    assert_eq!(state.contracts[&0].code, MUL7);
    // Activation + 21 reads + 3 loop iterations + the final skip and emit.
    assert_eq!(outcome.steps, 59);
    assert_ne!(outcome.pre_root, outcome.post_root);
}

#[test]
fn out_of_gas_rolls_back() {
    // `[]` around a cell that stays nonzero never terminates on its own.
    let mut state = single_contract_state("+[]", vec![0], 0);
    let before = state.clone();
    let outcome = apply_transaction(&mut state, &tx(&[])).unwrap();

    assert_eq!(outcome.status, Status::Error(exit_code::OUT_OF_GAS));
    assert_eq!(state, before);
}

#[test]
fn incrementing_loop_wraps_and_runs_off_the_code() {
    // The looped cell wraps mod 256 back to zero after 255 iterations
    // (~766 gas), so the loop exits and the pc falls off the end well
    // before the 1000-gas stipend is spent.
    let mut state = single_contract_state("+[+]", vec![0], 0);
    let before = state.clone();
    let outcome = apply_transaction(&mut state, &tx(&[])).unwrap();

    assert_eq!(outcome.status, Status::Error(exit_code::OUT_OF_CODE));
    assert_eq!(outcome.steps, 768);
    assert_eq!(state, before);
}

#[test]
fn input_exhaustion_rolls_back() {
    // 22 reads against a 21-byte input (20 sender bytes + 1 payload byte).
    let mut state = single_contract_state(&",".repeat(22), vec![0], 0);
    let before = state.clone();
    let outcome = apply_transaction(&mut state, &tx(&[0x01])).unwrap();

    assert_eq!(outcome.status, Status::Error(exit_code::INPUT_EXHAUSTED));
    assert_eq!(state, before);
}

#[test]
fn unmatched_bracket_rolls_back() {
    let mut state = single_contract_state("[+", vec![0], 0);
    let before = state.clone();
    let outcome = apply_transaction(&mut state, &tx(&[0x07])).unwrap();

    assert_eq!(outcome.status, Status::Error(exit_code::UNMATCHED_BRACKET));
    assert_eq!(state, before);
}

#[test]
fn tape_underflow_rolls_back() {
    let mut state = single_contract_state("+<", vec![0], 0);
    let outcome = apply_transaction(&mut state, &tx(&[])).unwrap();
    assert_eq!(outcome.status, Status::Error(exit_code::TAPE_UNDERFLOW));
    // The `+` before the underflow must not survive.
    assert_eq!(state.contracts[&0].cells, vec![0]);
}

#[test]
fn contract_emitted_error_rolls_back() {
    // Put 2 in the cell and emit it: a contract-chosen error code.
    let mut state = single_contract_state("++.", vec![0], 0);
    let outcome = apply_transaction(&mut state, &tx(&[])).unwrap();
    assert_eq!(outcome.status, Status::Error(0x02));
    assert_eq!(state.contracts[&0].cells, vec![0]);
}

#[test]
fn running_sentinel_output_does_not_halt() {
    // 255 in the cell, emit (no halt), clear the cell, emit success.
    let code = concat!(
        "-",   // cell = 255
        ".",   // append 0xff, keep running
        "+",   // cell = 0 again
        "."    // append 0x00, success
    );
    let state = single_contract_state(code, vec![0], 0);
    let mut tree = state.build_tree().unwrap();
    stage_transaction(&mut tree, &tx(&[])).unwrap();
    let outcome = run_transition(&mut tree).unwrap();

    assert_eq!(outcome.status, Status::Success);
    let mut st = StateAccess::new(&mut tree);
    assert_eq!(st.list_len(OUTPUT_SLOT).unwrap(), 2);
    assert_eq!(st.byte_at(OUTPUT_SLOT, 0).unwrap(), 0xff);
    assert_eq!(st.byte_at(OUTPUT_SLOT, 1).unwrap(), 0x00);
}

#[test]
fn running_off_the_code_end_is_an_error() {
    let mut state = single_contract_state("+", vec![0], 0);
    let before = state.clone();
    let outcome = apply_transaction(&mut state, &tx(&[])).unwrap();
    assert_eq!(outcome.status, Status::Error(exit_code::OUT_OF_CODE));
    assert_eq!(state, before);
}

#[test]
fn forward_scan_skips_nested_loops_in_one_step() {
    // Zero cell at `[`: one step jumps past the matching `]`, nesting
    // respected, landing straight on the success-emitting `.`.
    let state = single_contract_state("[[-]-].", vec![0], 0);
    let mut tree = state.build_tree().unwrap();
    stage_transaction(&mut tree, &tx(&[])).unwrap();
    let outcome = run_transition(&mut tree).unwrap();

    assert_eq!(outcome.status, Status::Success);
    // Activation, the scanning `[`, then `.`.
    assert_eq!(outcome.steps, 3);
}

#[test]
fn unknown_bytes_are_noops_that_cost_gas() {
    let state = single_contract_state("ab.", vec![0], 0);
    let mut tree = state.build_tree().unwrap();
    stage_transaction(&mut tree, &tx(&[])).unwrap();
    let outcome = run_transition(&mut tree).unwrap();

    assert_eq!(outcome.status, Status::Success);
    // Activation + 'a' + 'b' + '.'.
    assert_eq!(outcome.steps, 4);
    let mut st = StateAccess::new(&mut tree);
    assert_eq!(st.gas().unwrap(), 1000 - 3);
}

#[test]
fn rollback_restores_the_contract_subtree_root() {
    let state = single_contract_state("+>+[+", vec![3, 1, 4], 1);
    let mut pre_tree = state.build_tree().unwrap();
    let pre_contract_root = pre_tree.peek(contract_root(0)).unwrap();

    stage_transaction(&mut pre_tree, &tx(&[0x09])).unwrap();
    let outcome = run_transition(&mut pre_tree).unwrap();
    assert_eq!(outcome.status, Status::Error(exit_code::OUT_OF_CODE));

    // cells and ptr reverted in-tree, code untouched: same contract root.
    assert_eq!(pre_tree.peek(contract_root(0)).unwrap(), pre_contract_root);
    assert_eq!(pre_tree.peek(cells_slot(0)).unwrap(), {
        let mut fresh = state.build_tree().unwrap();
        fresh.get(cells_slot(0)).unwrap()
    });
}

#[test]
fn stepping_a_halted_tree_is_a_no_op() {
    let state = single_contract_state("+<", vec![0], 0);
    let mut tree = state.build_tree().unwrap();
    stage_transaction(&mut tree, &tx(&[])).unwrap();
    let outcome = run_transition(&mut tree).unwrap();
    assert!(outcome.status.is_error());

    let halted_root = tree.root().unwrap();
    for extra in 0..3 {
        step(&mut tree, outcome.steps + extra).unwrap();
        assert_eq!(tree.root().unwrap(), halted_root);
    }
}

#[test]
fn tape_grows_with_zero_cells_on_demand() {
    let state = single_contract_state(">+>.", vec![0], 0);
    let mut tree = state.build_tree().unwrap();
    stage_transaction(&mut tree, &tx(&[])).unwrap();
    let outcome = run_transition(&mut tree).unwrap();

    assert_eq!(outcome.status, Status::Success);
    let (cells, ptr) = read_persisted(&mut tree, 0).unwrap();
    assert_eq!(cells, vec![0, 1, 0]);
    assert_eq!(ptr, 2);
}

#[test]
fn unknown_contract_is_a_host_error() {
    let mut state = single_contract_state("+", vec![0], 0);
    let mut bad = tx(&[]);
    bad.contract = 5;
    assert!(apply_transaction(&mut state, &bad).is_err());
}
