//! obf-core — the stable boundary shared by prover, verifier, and CLI.
//!
//! This crate pins down everything both sides of a dispute must agree on:
//! - the **state layout**: the compile-time mapping from named state fields
//!   to generalized-index regions of one binary Merkle tree ([`layout`]),
//! - the **status byte** taxonomy written by the VM ([`status`]),
//! - **typed accessors** that mediate every state read/write through the
//!   tree so accesses are logged at canonical gindices ([`access`]),
//! - the **world-state model** and its JSON file format ([`state`], [`io`]).
//!
//! The layout is a versioned schema: it is defined once here and never
//! re-derived at runtime.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Typed accessors over the state tree.
pub mod access;
/// JSON I/O for world-state files.
pub mod io;
/// Gindex assignment for every state field (the schema).
pub mod layout;
/// World-state model: contracts with code, cells, and pointer.
pub mod state;
/// Execution status byte and exit codes.
pub mod status;

pub use access::StateAccess;
pub use state::{ContractState, WorldState};
pub use status::Status;

/// Commonly-used items for quick imports.
pub mod prelude {
    pub use crate::access::StateAccess;
    pub use crate::state::{ContractState, WorldState};
    pub use crate::status::{exit_code, Status};
}
