// crates/obf-trace/src/verify.rs

//! Single-step verification: replay one step against a witness alone.

use obf_core::layout::TREE_DEPTH;
use obf_merkle::{BinaryMerkleTree, Gindex, Node, TreeError};
use obf_vm::step;
use thiserror::Error;

/// Verification failures. Both protocol outcomes are fatal for the call and
/// never silently recovered.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The witness nodes do not hash to the declared pre-root.
    #[error("bad pre-root: witness nodes hash to 0x{}, witness declares 0x{}",
        hex::encode(.got), hex::encode(.expected))]
    BadPreRoot {
        /// Root declared by the witness.
        expected: Node,
        /// Root the witness nodes actually hash to.
        got: Node,
    },
    /// The replay touched state the witness does not cover.
    #[error("insufficient witness: step accessed uncovered gindex {0}")]
    InsufficientWitness(Gindex),
    /// Malformed witness (gindex outside the tree, and the like).
    #[error("malformed witness: {0}")]
    Malformed(TreeError),
}

impl From<TreeError> for VerifyError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::MissingNode(g) | TreeError::UnwitnessedWrite(g) => {
                Self::InsufficientWitness(g)
            }
            other => Self::Malformed(other),
        }
    }
}

/// Re-execute the witnessed step and return the recomputed post-root.
///
/// The caller judges fraud by comparing the result against the claimed
/// post-root; this function only replays and reports.
pub fn execute_step_witness(witness: &crate::StepWitness) -> Result<Node, VerifyError> {
    // A fresh tree backed by exactly the witness dictionary; it never aliases
    // the prover's storage.
    let mut tree = BinaryMerkleTree::from_nodes(TREE_DEPTH, witness.node_by_gindex.clone());

    let got = tree.root()?;
    if got != witness.pre_root {
        return Err(VerifyError::BadPreRoot {
            expected: witness.pre_root,
            got,
        });
    }

    step(&mut tree, witness.step)?;
    Ok(tree.root()?)
}
