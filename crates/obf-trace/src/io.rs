// crates/obf-trace/src/io.rs

//! Proof and witness JSON files.
//!
//! Wire conventions: every 32-byte value is `0x`-prefixed lowercase hex;
//! gindices are encoded as 32-byte big-endian integers. The proof file
//! carries `nodes` / `step_roots` / `access`, the witness file carries
//! `node_by_gindex` / `pre_root` / `post_root` / `step`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use obf_merkle::{gindex, Gindex, Node};
use serde::{Deserialize, Serialize};

use crate::format::{StepWitness, Trace};

/* ------------------------------ hex helpers ------------------------------ */

/// Encode 32 bytes as `0x`-prefixed lowercase hex.
#[must_use]
pub fn encode_node_hex(node: &Node) -> String {
    format!("0x{}", hex::encode(node))
}

/// Decode a `0x`-prefixed (or bare) 64-digit hex string into 32 bytes.
pub fn decode_node_hex(s: &str) -> Result<Node> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).with_context(|| format!("invalid hex {s:?}"))?;
    let arr: Node = bytes
        .try_into()
        .map_err(|_| anyhow!("expected 32 bytes of hex, got {s:?}"))?;
    Ok(arr)
}

fn encode_gindex_hex(g: Gindex) -> String {
    encode_node_hex(&gindex::to_be_bytes32(g))
}

fn decode_gindex_hex(s: &str) -> Result<Gindex> {
    let bytes = decode_node_hex(s)?;
    gindex::from_be_bytes32(&bytes).ok_or_else(|| anyhow!("gindex {s:?} out of range"))
}

/* ------------------------------- proof file ------------------------------ */

#[derive(Serialize, Deserialize)]
struct TraceFile {
    nodes: BTreeMap<String, String>,
    step_roots: Vec<String>,
    access: Vec<Vec<String>>,
}

impl TraceFile {
    fn from_trace(trace: &Trace) -> Self {
        Self {
            nodes: trace
                .nodes
                .iter()
                .map(|(g, n)| (encode_gindex_hex(*g), encode_node_hex(n)))
                .collect(),
            step_roots: trace.step_roots.iter().map(encode_node_hex).collect(),
            access: trace
                .access
                .iter()
                .map(|gs| gs.iter().map(|&g| encode_gindex_hex(g)).collect())
                .collect(),
        }
    }

    fn into_trace(self) -> Result<Trace> {
        let mut nodes = BTreeMap::new();
        for (g, n) in &self.nodes {
            nodes.insert(decode_gindex_hex(g)?, decode_node_hex(n)?);
        }
        let step_roots = self
            .step_roots
            .iter()
            .map(|s| decode_node_hex(s))
            .collect::<Result<Vec<_>>>()?;
        let access = self
            .access
            .iter()
            .map(|gs| gs.iter().map(|g| decode_gindex_hex(g)).collect())
            .collect::<Result<Vec<_>>>()?;
        Ok(Trace {
            nodes,
            step_roots,
            access,
        })
    }
}

/// Read a proof (full-trace) JSON file.
pub fn read_trace_json<P: AsRef<Path>>(path: P) -> Result<Trace> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(f);
    let file: TraceFile =
        serde_json::from_reader(rdr).with_context(|| "deserialize JSON proof")?;
    file.into_trace()
}

/// Write a proof (full-trace) JSON file (pretty).
pub fn write_trace_json<P: AsRef<Path>>(path: P, trace: &Trace) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &TraceFile::from_trace(trace))
        .with_context(|| "serialize JSON proof")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/* ------------------------------ witness file ----------------------------- */

#[derive(Serialize, Deserialize)]
struct WitnessFile {
    node_by_gindex: BTreeMap<String, String>,
    pre_root: String,
    post_root: String,
    step: u64,
}

/// Read a single-step witness JSON file.
pub fn read_witness_json<P: AsRef<Path>>(path: P) -> Result<StepWitness> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(f);
    let file: WitnessFile =
        serde_json::from_reader(rdr).with_context(|| "deserialize JSON witness")?;

    let mut node_by_gindex = BTreeMap::new();
    for (g, n) in &file.node_by_gindex {
        node_by_gindex.insert(decode_gindex_hex(g)?, decode_node_hex(n)?);
    }
    Ok(StepWitness {
        node_by_gindex,
        pre_root: decode_node_hex(&file.pre_root)?,
        post_root: decode_node_hex(&file.post_root)?,
        step: file.step,
    })
}

/// Write a single-step witness JSON file (pretty).
pub fn write_witness_json<P: AsRef<Path>>(path: P, witness: &StepWitness) -> Result<()> {
    let path = path.as_ref();
    let file = WitnessFile {
        node_by_gindex: witness
            .node_by_gindex
            .iter()
            .map(|(g, n)| (encode_gindex_hex(*g), encode_node_hex(n)))
            .collect(),
        pre_root: encode_node_hex(&witness.pre_root),
        post_root: encode_node_hex(&witness.post_root),
        step: witness.step,
    };
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &file).with_context(|| "serialize JSON witness")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_hex_roundtrips() {
        let mut node = [0u8; 32];
        node[0] = 0xde;
        node[31] = 0x01;
        let s = encode_node_hex(&node);
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66);
        assert_eq!(decode_node_hex(&s).unwrap(), node);
        // Bare hex is accepted too.
        assert_eq!(decode_node_hex(&s[2..]).unwrap(), node);
        assert!(decode_node_hex("0x1234").is_err());
    }

    #[test]
    fn gindex_hex_roundtrips() {
        for g in [1u64, 48, 512, (1 << 18) + 7] {
            assert_eq!(decode_gindex_hex(&encode_gindex_hex(g)).unwrap(), g);
        }
    }
}
