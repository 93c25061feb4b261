// crates/obf-core/src/io.rs

//! World-state JSON files.
//!
//! The wire format keys contracts by their decimal id:
//!
//! ```json
//! { "contracts": { "0": { "code": "+[+]", "ptr": 0, "cells": [0, 1] } } }
//! ```
//!
//! Reads normalize the loaded state (see [`WorldState::normalize`]) so a
//! parse/serialize round-trip is stable byte-for-byte afterwards.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::{ContractState, WorldState};

#[derive(Serialize, Deserialize)]
struct WorldStateFile {
    contracts: BTreeMap<String, ContractState>,
}

impl WorldStateFile {
    fn into_state(self) -> Result<WorldState> {
        let mut contracts = BTreeMap::new();
        for (key, contract) in self.contracts {
            let id: u8 = key
                .parse()
                .map_err(|_| anyhow!("contract id {key:?} is not in 0..=255"))?;
            contracts.insert(id, contract);
        }
        Ok(WorldState { contracts })
    }

    fn from_state(state: &WorldState) -> Self {
        Self {
            contracts: state
                .contracts
                .iter()
                .map(|(id, c)| (id.to_string(), c.clone()))
                .collect(),
        }
    }
}

/// Read and normalize a world-state JSON file.
pub fn read_state_json<P: AsRef<Path>>(path: P) -> Result<WorldState> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(f);
    let file: WorldStateFile =
        serde_json::from_reader(rdr).with_context(|| "deserialize JSON world state")?;
    let mut state = file.into_state()?;
    state.normalize();
    Ok(state)
}

/// Write a world-state JSON file (pretty).
pub fn write_state_json<P: AsRef<Path>>(path: P, state: &WorldState) -> Result<()> {
    let path = path.as_ref();
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, &WorldStateFile::from_state(state))
        .with_context(|| "serialize JSON world state")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}
