//! Sparse binary Merkle tree over generalized indices.
//!
//! ## Overview
//! This crate is the commitment layer under the whole system state:
//!
//! - [`Gindex`] navigation (root = 1, children `2g` / `2g+1`) and the 32-byte
//!   big-endian wire encoding used by proof files.
//! - [`BinaryMerkleTree`], a fixed-depth sparse tree storing only nodes whose
//!   value differs from the depth-derived zero subtree. It comes in two
//!   flavours: a *complete* tree (absent nodes resolve to zero hashes; the
//!   prover side) and a *partial* tree whose storage is exactly a witness
//!   dictionary and which fails with [`TreeError::MissingNode`] on any access
//!   outside it (the verifier side).
//! - [`support_set`] / [`multiproof`] / [`verify_multiproof`], the minimal
//!   sibling-closure machinery that turns a set of accessed gindices into a
//!   self-contained node dictionary.
//!
//! The tree optionally records every gindex passed through public
//! [`BinaryMerkleTree::get`] / [`BinaryMerkleTree::set`]; the recorder is
//! per-tree state, drained by the caller between steps.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

pub mod gindex;
mod proof;
mod tree;

pub use gindex::{Gindex, Node};
pub use proof::{multiproof, support_set, verify_multiproof};
pub use tree::{BinaryMerkleTree, TreeError};
