// crates/obf-trace/src/witness.rs

//! Witness extraction: project one step's minimal multiproof out of a trace.

use std::collections::BTreeSet;

use anyhow::{bail, ensure, Context, Result};
use obf_core::layout::TREE_DEPTH;
use obf_merkle::{support_set, BinaryMerkleTree, Gindex};
use obf_vm::step;

use crate::format::{StepWitness, Trace};

/// Build the witness for step `step_index` of `trace`.
///
/// The trace's node dictionary holds pre-transition values, so the extractor
/// rebuilds the pre-transition partial tree, replays the preceding steps to
/// reach the step's pre-state, and harvests the multiproof support of the
/// recorded access set from there.
pub fn extract_step_witness(trace: &Trace, step_index: u64) -> Result<StepWitness> {
    let n = trace.step_count() as u64;
    if step_index >= n {
        bail!("step {step_index} out of range: trace has {n} steps");
    }
    ensure!(
        trace.step_roots.len() == trace.access.len() + 1,
        "malformed trace: {} roots for {} steps",
        trace.step_roots.len(),
        trace.access.len()
    );

    let mut tree = BinaryMerkleTree::from_nodes(TREE_DEPTH, trace.nodes.clone());
    let root = tree.root().context("hashing trace nodes")?;
    ensure!(
        root == trace.step_roots[0],
        "trace nodes do not reproduce the pre-transition root"
    );

    for k in 0..step_index {
        step(&mut tree, k).with_context(|| format!("replaying step {k}"))?;
    }
    let pre_root = tree.root().context("pre-state root")?;
    ensure!(
        pre_root == trace.step_roots[step_index as usize],
        "replay diverged from the recorded root at step {step_index}"
    );

    let touched: BTreeSet<Gindex> = trace.access[step_index as usize].iter().copied().collect();
    let mut node_by_gindex = std::collections::BTreeMap::new();
    for g in support_set(&touched) {
        node_by_gindex.insert(g, tree.peek(g).context("projecting witness node")?);
    }

    Ok(StepWitness {
        node_by_gindex,
        pre_root,
        post_root: trace.step_roots[step_index as usize + 1],
        step: step_index,
    })
}
