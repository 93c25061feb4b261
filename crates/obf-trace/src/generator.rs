// crates/obf-trace/src/generator.rs

//! The instrumented executor: runs a transition with access logging on and
//! accumulates the trace the witness extractor consumes.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use obf_core::{StateAccess, WorldState};
use obf_merkle::{support_set, Gindex, Node};
use obf_vm::{stage_transaction, step, Transaction};
use tracing::info;

use crate::format::Trace;

/// Execute `tx` against `state`, recording a full fraud-proof trace.
///
/// The returned trace spans the whole transition: the activation step, every
/// opcode step, and the terminal (error-restoring or success) step.
pub fn generate_trace(state: &WorldState, tx: &Transaction) -> Result<Trace> {
    if !state.contracts.contains_key(&tx.contract) {
        bail!("unknown contract {}", tx.contract);
    }

    let mut tree = state.build_tree().context("building state tree")?;
    stage_transaction(&mut tree, tx).context("staging transaction")?;

    // Frozen pre-transition view; every node dictionary entry is harvested
    // from here so the flat gindex → node map stays version-free.
    let base = tree.clone();

    let mut nodes: BTreeMap<Gindex, Node> = BTreeMap::new();
    let mut step_roots = vec![tree.root().context("pre-transition root")?];
    let mut access: Vec<Vec<Gindex>> = Vec::new();

    let mut index = 0u64;
    loop {
        tree.begin_access_log();
        step(&mut tree, index).with_context(|| format!("step {index}"))?;
        let touched = tree.take_access_log();

        for g in support_set(&touched) {
            if !nodes.contains_key(&g) {
                nodes.insert(g, base.peek(g).context("harvesting witness node")?);
            }
        }
        access.push(touched.into_iter().collect());
        step_roots.push(tree.root().context("post-step root")?);

        let status = StateAccess::new(&mut tree).status().context("status")?;
        index += 1;
        if !status.is_running() {
            info!(steps = index, %status, nodes = nodes.len(), "trace complete");
            break;
        }
    }

    Ok(Trace {
        nodes,
        step_roots,
        access,
    })
}
