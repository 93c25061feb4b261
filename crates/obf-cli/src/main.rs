// crates/obf-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use obf_core::io::{read_state_json, write_state_json};
use obf_core::layout::SENDER_LEN;
use obf_core::{ContractState, WorldState};
use obf_trace::io::{
    decode_node_hex, encode_node_hex, read_trace_json, read_witness_json, write_trace_json,
    write_witness_json,
};
use obf_trace::{execute_step_witness, extract_step_witness, generate_trace};
use obf_vm::{apply_transaction, Transaction};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "obf",
    about = "Optimistic Brainfuck rollup: fraud-provable transitions over a Merkleized state",
    long_about = "Optimistic Brainfuck rollup CLI.\n\nApply transactions to a Merkleized world state, emit fraud-proof traces, project single-step witnesses, and re-execute a disputed step from a witness alone.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Write a canonical example state with contract 0 populated.
    InitState {
        /// Output path for the state (JSON)
        out: PathBuf,
    },

    /// Apply one transaction and write the post-state.
    Transition {
        /// Input pre-state (JSON)
        pre: PathBuf,
        /// Output post-state (JSON)
        post: PathBuf,
        /// L1 sender address (0x + 40 hex digits)
        sender: String,
        /// Addressed contract slot (0..=255)
        contract_id: u8,
        /// User payload (0x-prefixed hex, may be empty)
        payload: String,
    },

    /// Apply one transaction and emit the fraud-proof trace instead of a
    /// post-state.
    Gen {
        /// Input pre-state (JSON)
        pre: PathBuf,
        /// Output proof (JSON)
        proof: PathBuf,
        /// L1 sender address (0x + 40 hex digits)
        sender: String,
        /// Addressed contract slot (0..=255)
        contract_id: u8,
        /// User payload (0x-prefixed hex, may be empty)
        payload: String,
    },

    /// Project the witness for a single step out of a proof.
    StepWitness {
        /// Input proof (JSON)
        proof: PathBuf,
        /// Output witness (JSON)
        witness: PathBuf,
        /// Step index within the trace
        step: u64,
    },

    /// Re-execute one step from its witness and compare against a claimed
    /// post-root.
    Verify {
        /// Input witness (JSON)
        witness: PathBuf,
        /// Claimed post-root (0x + 64 hex digits)
        claimed_post_root: String,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::InitState { out } => init_state(out),
        Cmd::Transition {
            pre,
            post,
            sender,
            contract_id,
            payload,
        } => transition(pre, post, &sender, contract_id, &payload),
        Cmd::Gen {
            pre,
            proof,
            sender,
            contract_id,
            payload,
        } => gen(pre, proof, &sender, contract_id, &payload),
        Cmd::StepWitness {
            proof,
            witness,
            step,
        } => step_witness(proof, witness, step),
        Cmd::Verify {
            witness,
            claimed_post_root,
        } => verify(witness, &claimed_post_root),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// The example contract: skip the 20 sender bytes, read the payload byte,
/// multiply it by 7 into the second cell, then emit success.
const EXAMPLE_CODE: &str = ",,,,,,,,,,,,,,,,,,,,,[->+++++++<].";

fn init_state(out: PathBuf) -> Result<()> {
    let mut state = WorldState::default();
    state.contracts.insert(
        0,
        ContractState {
            code: EXAMPLE_CODE.to_owned(),
            ptr: 0,
            cells: vec![0],
        },
    );
    write_state_json(&out, &state)
        .with_context(|| format!("writing example state to {}", out.display()))?;
    println!("Wrote example state with contract 0 to {}", out.display());
    Ok(())
}

fn parse_sender(s: &str) -> Result<[u8; SENDER_LEN]> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).with_context(|| format!("invalid sender hex {s:?}"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("sender must be exactly {SENDER_LEN} bytes (40 hex digits)"))
}

fn parse_payload(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).with_context(|| format!("invalid payload hex {s:?}"))
}

fn parse_tx(sender: &str, contract_id: u8, payload: &str) -> Result<Transaction> {
    Ok(Transaction {
        sender: parse_sender(sender)?,
        contract: contract_id,
        payload: parse_payload(payload)?,
    })
}

fn transition(
    pre: PathBuf,
    post: PathBuf,
    sender: &str,
    contract_id: u8,
    payload: &str,
) -> Result<()> {
    let tx = parse_tx(sender, contract_id, payload)?;
    let mut state =
        read_state_json(&pre).with_context(|| format!("reading pre-state {}", pre.display()))?;

    info!(contract = contract_id, payload = tx.payload.len(), "applying transaction");
    let outcome = apply_transaction(&mut state, &tx).context("applying transaction")?;

    write_state_json(&post, &state)
        .with_context(|| format!("writing post-state {}", post.display()))?;
    println!(
        "Transition finished with status {} after {} steps → {}",
        outcome.status,
        outcome.steps,
        post.display()
    );
    Ok(())
}

fn gen(pre: PathBuf, proof: PathBuf, sender: &str, contract_id: u8, payload: &str) -> Result<()> {
    let tx = parse_tx(sender, contract_id, payload)?;
    let state =
        read_state_json(&pre).with_context(|| format!("reading pre-state {}", pre.display()))?;

    info!(contract = contract_id, "generating fraud-proof trace");
    let trace = generate_trace(&state, &tx).context("generating trace")?;

    write_trace_json(&proof, &trace)
        .with_context(|| format!("writing proof {}", proof.display()))?;
    println!(
        "Traced {} steps ({} nodes) → {}",
        trace.step_count(),
        trace.nodes.len(),
        proof.display()
    );
    Ok(())
}

fn step_witness(proof: PathBuf, witness: PathBuf, step: u64) -> Result<()> {
    let trace =
        read_trace_json(&proof).with_context(|| format!("reading proof {}", proof.display()))?;
    let w = extract_step_witness(&trace, step)
        .with_context(|| format!("extracting witness for step {step}"))?;

    write_witness_json(&witness, &w)
        .with_context(|| format!("writing witness {}", witness.display()))?;
    println!(
        "Witness for step {} covers {} nodes → {}",
        step,
        w.node_by_gindex.len(),
        witness.display()
    );
    Ok(())
}

fn verify(witness: PathBuf, claimed_post_root: &str) -> Result<()> {
    let claimed = decode_node_hex(claimed_post_root).context("parsing claimed post-root")?;
    let w = read_witness_json(&witness)
        .with_context(|| format!("reading witness {}", witness.display()))?;

    let recomputed = execute_step_witness(&w).context("replaying witnessed step")?;

    println!("post contract root: {}", encode_node_hex(&recomputed));
    if recomputed == claimed {
        println!("root matches, no fraud");
        Ok(())
    } else {
        use std::io::Write as _;
        println!("root did not match, fraud detected!");
        let _ = std::io::stdout().flush();
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_payload, parse_sender};

    #[test]
    fn sender_parsing_enforces_length() {
        let s = format!("0x{}", "aa".repeat(20));
        assert_eq!(parse_sender(&s).unwrap(), [0xaa; 20]);
        assert!(parse_sender("0xaabb").is_err());
        assert!(parse_sender("not-hex").is_err());
    }

    #[test]
    fn payload_parsing_accepts_empty() {
        assert_eq!(parse_payload("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_payload("0x0307").unwrap(), vec![3, 7]);
    }
}
