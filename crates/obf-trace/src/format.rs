// crates/obf-trace/src/format.rs

//! Trace and witness envelopes shared by the generator, extractor, and
//! verifier.

use std::collections::BTreeMap;

use obf_merkle::{Gindex, Node};

/// Everything needed to bisect a transition and replay any single step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    /// Pre-transition value of every gindex any step's multiproof touches.
    ///
    /// Values are as of `step_roots[0]`; since all mutation flows through the
    /// recorded accesses, that is also each node's value whenever it first
    /// becomes relevant, so the flat map reconstructs every step.
    pub nodes: BTreeMap<Gindex, Node>,
    /// Roots `r_0 ..= r_n`, one more than there are steps.
    pub step_roots: Vec<Node>,
    /// Per step, the gindices actually read or written (sorted).
    pub access: Vec<Vec<Gindex>>,
}

impl Trace {
    /// Number of recorded steps (`access.len()`, one less than the roots).
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.access.len()
    }

    /// Pre-transition root.
    #[inline]
    #[must_use]
    pub fn pre_root(&self) -> Node {
        self.step_roots[0]
    }

    /// Post-transition root.
    #[inline]
    #[must_use]
    pub fn post_root(&self) -> Node {
        self.step_roots[self.step_roots.len() - 1]
    }
}

/// The minimal data to replay one step from scratch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepWitness {
    /// Multiproof of the step's accesses against `pre_root`, sibling
    /// propagation paths included.
    pub node_by_gindex: BTreeMap<Gindex, Node>,
    /// Root the witness nodes must hash to.
    pub pre_root: Node,
    /// Root the honest replay is expected to produce.
    pub post_root: Node,
    /// Step index within the transition (0 is the activation step).
    pub step: u64,
}
