// crates/obf-vm/src/driver.rs

//! The transition driver: stage a transaction, step to termination, and
//! commit or keep the pre-state according to the terminal status.

use anyhow::{bail, Context, Result};
use obf_core::layout::{self, INPUT_SLOT, SENDER_LEN};
use obf_core::state::read_persisted;
use obf_core::status::Status;
use obf_core::{StateAccess, WorldState};
use obf_merkle::{BinaryMerkleTree, Node};
use tracing::{debug, info};

use crate::step::step;

/// A transaction bound for an L2 contract.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// L1 sender address, prepended to the contract-visible input.
    pub sender: [u8; SENDER_LEN],
    /// Addressed contract slot.
    pub contract: u8,
    /// User payload; gas is granted against this length only.
    pub payload: Vec<u8>,
}

impl Transaction {
    /// The contract-visible input bytes: sender ‖ payload.
    #[must_use]
    pub fn input_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SENDER_LEN + self.payload.len());
        out.extend_from_slice(&self.sender);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// What a finished transition looked like.
#[derive(Clone, Copy, Debug)]
pub struct TransitionOutcome {
    /// Terminal status (never `Running`).
    pub status: Status,
    /// Number of steps taken, the activation step included.
    pub steps: u64,
    /// Root before the activation step (transaction already staged).
    pub pre_root: Node,
    /// Root after the terminal step.
    pub post_root: Node,
}

/// Stage a transaction into the execution subtree.
///
/// This happens *before* the first recorded root: the activation step then
/// derives everything else from tree reads, so every recorded step of the
/// transition is replayable from a witness alone.
pub fn stage_transaction(tree: &mut BinaryMerkleTree, tx: &Transaction) -> Result<()> {
    let input = tx.input_bytes();
    if input.len() as u64 > layout::INPUT_CAPACITY {
        bail!(
            "transaction input is {} bytes, capacity is {}",
            input.len(),
            layout::INPUT_CAPACITY
        );
    }

    let mut st = StateAccess::new(tree);
    st.set_tx_contract(tx.contract)
        .context("staging contract id")?;
    for (i, &b) in input.iter().enumerate() {
        st.set_byte_at(INPUT_SLOT, i as u64, b)
            .context("staging input byte")?;
    }
    st.set_list_len(INPUT_SLOT, input.len() as u64)
        .context("staging input length")?;
    Ok(())
}

/// Step a staged tree until the status leaves `Running`.
pub fn run_transition(tree: &mut BinaryMerkleTree) -> Result<TransitionOutcome> {
    let pre_root = tree.root().context("pre-transition root")?;

    let mut index = 0u64;
    let status = loop {
        step(tree, index).with_context(|| format!("step {index}"))?;
        index += 1;
        let status = StateAccess::new(tree).status().context("status")?;
        if !status.is_running() {
            break status;
        }
        debug!(step = index, "transition step applied");
    };

    let post_root = tree.root().context("post-transition root")?;
    info!(steps = index, %status, "transition finished");
    Ok(TransitionOutcome {
        status,
        steps: index,
        pre_root,
        post_root,
    })
}

/// Apply one transaction to a world state.
///
/// On success the updated `cells`/`ptr` are committed back into the model; on
/// an execution error the model keeps its pre-transition values (the in-tree
/// restore already happened inside the terminal step).
pub fn apply_transaction(state: &mut WorldState, tx: &Transaction) -> Result<TransitionOutcome> {
    if !state.contracts.contains_key(&tx.contract) {
        bail!("unknown contract {}", tx.contract);
    }

    let mut tree = state.build_tree().context("building state tree")?;
    stage_transaction(&mut tree, tx).context("staging transaction")?;
    let outcome = run_transition(&mut tree).context("running transition")?;

    if outcome.status == Status::Success {
        let (cells, ptr) =
            read_persisted(&mut tree, tx.contract).context("reading post-transition state")?;
        let contract = state
            .contracts
            .get_mut(&tx.contract)
            .context("contract vanished mid-transition")?;
        contract.cells = cells;
        contract.ptr = ptr;
    }
    Ok(outcome)
}
