//! # ORC-20 Indexer
//!
//! Input loading and report rendering behind the `orc20-indexer` binary.
//! The binary loads contents and transfers, replays them through
//! [`orc20_engine::LedgerEngine`] and prints the resulting ledger.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// JSON-lines input loading
pub mod loader;

/// Text and JSON ledger dumps
pub mod report;

pub use loader::{load_inputs, LoadSummary};
pub use report::{Report, ReportFormat};
