//! obf-trace — fraud-proof traces, witnesses, and the step verifier.
//!
//! ## Overview
//! A disputed transition is summarised by a [`Trace`]: per-step roots, the
//! per-step accessed-gindex sets, and one flat node dictionary holding the
//! *pre-transition* value of every node any step's multiproof needs. From a
//! trace, [`extract_step_witness`] projects the minimal [`StepWitness`] for
//! one step, and [`execute_step_witness`] replays that single step against
//! the witness alone, rejecting any access outside it.
//!
//! The pipeline the CLI wires together:
//!
//! ```text
//! generate_trace ──► Trace ──► extract_step_witness ──► StepWitness
//!                                                            │
//!                          claimed post-root ── compare ◄── execute_step_witness
//! ```

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

mod format;
mod generator;
/// JSON I/O for proof and witness files.
pub mod io;
mod verify;
mod witness;

pub use format::{StepWitness, Trace};
pub use generator::generate_trace;
pub use verify::{execute_step_witness, VerifyError};
pub use witness::extract_step_witness;
