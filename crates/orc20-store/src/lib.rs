//! # ORC-20 Store - Indexed Ledger Tables
//!
//! Owned, in-memory tables for every record the replay engine reads and
//! writes, each with the secondary indices the transitions query.
//!
//! ## Design
//!
//! - Tables are `BTreeMap`s keyed by stable string or composite keys
//! - Secondary indices hold keys, never references into the tables
//! - Every mutation goes through one method that updates the table and all of
//!   its indices together, so indices never disagree with the tables
//! - Moving a balance to a new holder is delete-then-reinsert under the new key
//!
//! The store is passed explicitly to the engine; there is no global state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Ledger tables, indices and the era B snapshot
pub mod store;

/// Per-address, per-tick balance summary
pub mod summary;

pub use store::LedgerStore;
pub use summary::BalanceSummary;
