//! JSON-lines input loading
//!
//! Contents load first so every creation record in the transfer file can
//! backfill the genesis height of its content. A record without an
//! inscription id, or a transfer without a location, stops the load.

use orc20_core::{InscriptionContent, InscriptionTransfer, Orc20Error, Result};
use orc20_store::LedgerStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Record counts of one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Contents stored
    pub contents: usize,
    /// Transfers queued
    pub transfers: usize,
    /// Contents whose genesis height was set from a creation record
    pub backfilled: usize,
}

/// Load both input files into `ledger`
pub fn load_inputs(
    ledger: &mut LedgerStore,
    contents_path: &Path,
    transfers_path: &Path,
) -> Result<LoadSummary> {
    let contents = load_contents(ledger, contents_path)?;
    let (transfers, backfilled) = load_transfers(ledger, transfers_path)?;
    let summary = LoadSummary {
        contents,
        transfers,
        backfilled,
    };
    tracing::info!(
        contents = summary.contents,
        transfers = summary.transfers,
        backfilled = summary.backfilled,
        "inputs loaded"
    );
    Ok(summary)
}

/// Store every content record of `path`; returns the number stored
pub fn load_contents(ledger: &mut LedgerStore, path: &Path) -> Result<usize> {
    let mut count = 0;
    for_each_record(path, |content: InscriptionContent| {
        require("inscriptionId", &content.inscription_id)?;
        ledger.put_content(content);
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Queue every transfer record of `path`; returns the number queued and the
/// number of genesis heights backfilled
pub fn load_transfers(ledger: &mut LedgerStore, path: &Path) -> Result<(usize, usize)> {
    let mut queued = 0;
    let mut backfilled = 0;
    for_each_record(path, |transfer: InscriptionTransfer| {
        require("inscriptionId", &transfer.inscription_id)?;
        require("toLocation", &transfer.to_location)?;
        if !transfer.is_transfer {
            if ledger.backfill_genesis_height(&transfer.inscription_id, transfer.block_height) {
                backfilled += 1;
            } else {
                tracing::warn!(
                    inscription_id = %transfer.inscription_id,
                    height = transfer.block_height,
                    "creation record without content"
                );
            }
        }
        ledger.push_transfer(transfer);
        queued += 1;
        Ok(())
    })?;
    Ok((queued, backfilled))
}

fn require(field: &'static str, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("missing {field}"));
    }
    Ok(())
}

fn for_each_record<T, F>(path: &Path, mut visit: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> std::result::Result<(), String>,
{
    let file = File::open(path)
        .map_err(|e| Orc20Error::io(format!("Failed to open {}: {}", path.display(), e)))?;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let number = index + 1;
        let line = line.map_err(|e| {
            Orc20Error::io(format!("Failed to read {}:{}: {}", path.display(), number, e))
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            Orc20Error::serialization(format!("{}:{}: {}", path.display(), number, e))
        })?;
        visit(record).map_err(|problem| {
            Orc20Error::invalid(format!("{}:{}: {}", path.display(), number, problem))
        })?;
    }
    Ok(())
}
