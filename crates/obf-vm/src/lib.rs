//! obf-vm — the step VM and transition driver.
//!
//! ## Overview
//! The VM consumes **one opcode per step**; a step is the atomic unit the
//! fraud-proof protocol bisects down to. Every state read and write goes
//! through `obf_core::StateAccess`, so a recording tree observes the exact
//! gindex set a witness must cover.
//!
//! - [`step`] applies step `index` to a tree: index 0 is the activation step
//!   (it turns a staged transaction into live execution state), later indices
//!   charge gas and execute one opcode, and a halted state is a strict no-op.
//! - [`stage_transaction`] / [`run_transition`] / [`apply_transaction`] drive
//!   a whole transaction: stage input, step to termination, and commit or
//!   keep the pre-state according to the terminal status.
//!
//! The step function works identically on a complete (prover) tree and on a
//! partial (witness) tree; on the latter, any access outside the witness
//! surfaces as a `TreeError` instead of fabricated state.

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

mod driver;
mod step;

pub use driver::{apply_transaction, run_transition, stage_transaction, Transaction, TransitionOutcome};
pub use step::step;
