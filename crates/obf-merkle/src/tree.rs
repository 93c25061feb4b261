//! The sparse fixed-depth tree itself.

use std::collections::{BTreeMap, BTreeSet};

use obf_crypto::{hash_pair, ZeroHashes};
use thiserror::Error;

use crate::gindex::{self, Gindex, Node};

/// Errors surfaced by tree access.
///
/// `MissingNode` and `UnwitnessedWrite` only arise on partial trees; they are
/// the "insufficient witness" outcomes the verifier must report verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The gindex is zero or deeper than the tree allows.
    #[error("gindex {0} is outside a depth-{1} tree")]
    OutOfRange(Gindex, u32),
    /// A read reached a region the witness dictionary does not cover.
    #[error("witness has no node covering gindex {0}")]
    MissingNode(Gindex),
    /// A write targeted a gindex the witness dictionary does not cover.
    #[error("write to unwitnessed gindex {0}")]
    UnwitnessedWrite(Gindex),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Absent nodes resolve to the depth-derived zero subtree.
    Complete,
    /// Storage is exactly a witness dictionary; anything else is an error.
    Partial,
}

/// Sparse binary Merkle tree of fixed depth.
///
/// Storage maps gindex → node for every node whose value differs from the
/// zero subtree at its depth; `set` keeps the ancestor chain up to the root
/// materialized, so `root()` is cheap after the first write. Setting an inner
/// gindex replaces the entire subtree beneath it.
#[derive(Clone, Debug)]
pub struct BinaryMerkleTree {
    depth: u32,
    mode: Mode,
    nodes: BTreeMap<Gindex, Node>,
    zeros: ZeroHashes,
    access_log: Option<BTreeSet<Gindex>>,
}

impl BinaryMerkleTree {
    /// Empty complete tree: every node is the zero subtree of its height.
    #[must_use]
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            mode: Mode::Complete,
            nodes: BTreeMap::new(),
            zeros: ZeroHashes::new(depth),
            access_log: None,
        }
    }

    /// Partial tree backed by exactly `nodes` (a witness dictionary).
    ///
    /// Reads resolve from the stored nodes (hashing upward where the
    /// dictionary stores a deeper frontier); anything outside the covered
    /// region fails with [`TreeError::MissingNode`] / `UnwitnessedWrite`.
    #[must_use]
    pub fn from_nodes(depth: u32, nodes: BTreeMap<Gindex, Node>) -> Self {
        Self {
            depth,
            mode: Mode::Partial,
            nodes,
            zeros: ZeroHashes::new(depth),
            access_log: None,
        }
    }

    /// Tree depth `D`: leaves live at depth `D`.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether this tree rejects access outside its stored nodes.
    #[inline]
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.mode == Mode::Partial
    }

    /// Start collecting the gindices of subsequent `get`/`set` calls.
    pub fn begin_access_log(&mut self) {
        self.access_log = Some(BTreeSet::new());
    }

    /// Stop collecting and return the gindices touched since
    /// [`Self::begin_access_log`].
    pub fn take_access_log(&mut self) -> BTreeSet<Gindex> {
        self.access_log.take().unwrap_or_default()
    }

    /// Read the node at `g`, logging the access.
    pub fn get(&mut self, g: Gindex) -> Result<Node, TreeError> {
        self.check_range(g)?;
        self.record(g);
        self.resolve(g)
    }

    /// Read the node at `g` without logging. Used by proof extraction and
    /// tests; never by the step function.
    pub fn peek(&self, g: Gindex) -> Result<Node, TreeError> {
        self.check_range(g)?;
        self.resolve(g)
    }

    /// Current root.
    pub fn root(&self) -> Result<Node, TreeError> {
        self.resolve(1)
    }

    /// Write `node` at `g`, logging the access, purging any stored
    /// descendants and recomputing the ancestor chain up to the root.
    pub fn set(&mut self, g: Gindex, node: Node) -> Result<(), TreeError> {
        self.check_range(g)?;
        if self.mode == Mode::Partial && !self.nodes.contains_key(&g) {
            return Err(TreeError::UnwitnessedWrite(g));
        }
        self.record(g);

        // An inner write shadows everything below it.
        for k in 1..=(self.depth - gindex::depth(g)) {
            let doomed: Vec<Gindex> =
                self.nodes.range(g << k..(g + 1) << k).map(|(d, _)| *d).collect();
            for d in doomed {
                self.nodes.remove(&d);
            }
        }

        self.store(g, node);

        let mut a = gindex::parent(g);
        while a >= 1 {
            let left = self.resolve(gindex::left_child(a))?;
            let right = self.resolve(gindex::right_child(a))?;
            self.store(a, hash_pair(&left, &right));
            if a == 1 {
                break;
            }
            a = gindex::parent(a);
        }
        Ok(())
    }

    /// Iterate over the stored (non-zero) nodes.
    pub fn stored_nodes(&self) -> impl Iterator<Item = (Gindex, &Node)> {
        self.nodes.iter().map(|(g, n)| (*g, n))
    }

    fn check_range(&self, g: Gindex) -> Result<(), TreeError> {
        if g == 0 || 63 - g.leading_zeros() > self.depth {
            return Err(TreeError::OutOfRange(g, self.depth));
        }
        Ok(())
    }

    fn record(&mut self, g: Gindex) {
        if let Some(log) = self.access_log.as_mut() {
            log.insert(g);
        }
    }

    fn store(&mut self, g: Gindex, node: Node) {
        // Complete trees keep only non-zero nodes; partial trees must keep
        // every witnessed value so the coverage check stays meaningful.
        if self.mode == Mode::Complete && node == self.zero_at(g) {
            self.nodes.remove(&g);
        } else {
            self.nodes.insert(g, node);
        }
    }

    fn zero_at(&self, g: Gindex) -> Node {
        self.zeros.get(self.depth - gindex::depth(g))
    }

    fn has_stored_descendant(&self, g: Gindex) -> bool {
        let levels = self.depth - gindex::depth(g);
        (1..=levels).any(|k| self.nodes.range(g << k..(g + 1) << k).next().is_some())
    }

    fn resolve(&self, g: Gindex) -> Result<Node, TreeError> {
        if let Some(v) = self.nodes.get(&g) {
            return Ok(*v);
        }
        if self.has_stored_descendant(g) {
            let left = self.resolve(gindex::left_child(g))?;
            let right = self.resolve(gindex::right_child(g))?;
            return Ok(hash_pair(&left, &right));
        }
        match self.mode {
            Mode::Complete => Ok(self.zero_at(g)),
            Mode::Partial => Err(TreeError::MissingNode(g)),
        }
    }
}
