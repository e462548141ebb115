//! # ORC-20 Core - Foundation Crate
//!
//! Domain records, protocol era rules and payload validation shared by the
//! ledger store, the replay engine and the command-line indexer.
//!
//! ## Core Concepts
//!
//! - **Records**: inscription contents and transfers (inputs), tick metadata,
//!   balances and ledger events (derived state)
//! - **Closed tags**: operation, status and error codes are enums, so every
//!   dispatch over them is exhaustiveness-checked
//! - **Era rules**: pure predicates mapping a block height to the protocol
//!   rules in force at that height
//! - **Payloads**: case-folded, lenient JSON decoding of inscription bodies
//!   into typed per-operation payloads
//!
//! ## What's NOT in this crate
//!
//! - Indexed storage (belongs in `orc20-store`)
//! - State transitions (belong in `orc20-engine`)
//! - File loading and report rendering (belong in `orc20-cli`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Unified error type for infrastructure failures
pub mod errors;

/// Indexer configuration loading
pub mod config;

/// Lenient JSON decoding used for inscription bodies
pub mod json;

/// Strict parsing of numeric strings
pub mod number;

/// Inscription payload schemas
pub mod payload;

/// Protocol era thresholds, fixed addresses and deploy defaults
pub mod protocol;

/// Ledger records and their closed tag enums
pub mod types;

pub use bigdecimal::BigDecimal;
pub use config::IndexerConfig;
pub use errors::{Orc20Error, Result};
pub use number::{exceeds_precision, parse_decimal, parse_int, parse_long, NumberError};
pub use payload::{
    BasePayload, CancelPayload, DeployPayload, MintPayload, Operation, PayloadError, SendPayload,
    UpgradePayload,
};
pub use protocol::ProtocolRules;
pub use types::{
    Address, Balance, BalanceKey, BalanceStatus, ErrorCode, EventId, EventStatus, EventType,
    InscriptionContent, InscriptionId, InscriptionTransfer, LedgerEvent, OpTag, TickId,
    TickMetadata,
};
