//! # ORC-20 Engine - Ledger Replay
//!
//! Applies inscription creations and transfers, in block order, to a
//! [`LedgerStore`](orc20_store::LedgerStore).
//!
//! ## Dispatch
//!
//! Each transfer is routed by whether it is a creation ("inscribe") or a
//! later movement ("transfer"), then by the payload's declared operation:
//!
//! | op | inscribe | transfer |
//! |---|---|---|
//! | deploy | create tick | change deployer, swing pending upgrades |
//! | mint | mint into inscriber | move balance, or deposit to the ATM |
//! | send | pending send / batch close (before era B), withdraw (era B) | move balance, or deposit to the ATM |
//! | cancel | cancel pending sends by nonce | no effect |
//! | upgrade | handshake phase 1 | handshake phase 2 |
//!
//! Protocol violations are never Rust errors: they are recorded as failed
//! events. Inputs that do not concern the protocol, or that point at state
//! that does not exist, are skipped and reported as [`SkipReason`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod credit;
mod deploy;
mod engine;
mod mint;
mod outcome;
mod send;
mod upgrade;

pub use engine::LedgerEngine;
pub use outcome::{Applied, ReplayStats, SkipReason};
