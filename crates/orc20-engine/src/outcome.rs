//! Per-transfer outcomes and replay statistics

use orc20_core::{EventId, EventStatus, EventType, LedgerEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a transfer left no event behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The transfer's inscription has no stored content
    MissingContent,
    /// An event already exists for the transfer's location
    DuplicateEvent,
    /// The body is not a protocol payload
    NotProtocolPayload,
    /// `list` is recognized but not supported
    UnsupportedOperation,
    /// No deployed tick matches the payload
    UnresolvedTick,
    /// Deploy payload failed validation
    InvalidDeploy,
    /// The transferred inscription carries no balance
    NoBalance,
    /// Transferred upgrade payload failed validation
    InvalidUpgrade,
    /// Moving this kind of inscription has no effect
    NoTransferEffect,
}

impl SkipReason {
    /// Short label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingContent => "missing_content",
            Self::DuplicateEvent => "duplicate_event",
            Self::NotProtocolPayload => "not_protocol_payload",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::UnresolvedTick => "unresolved_tick",
            Self::InvalidDeploy => "invalid_deploy",
            Self::NoBalance => "no_balance",
            Self::InvalidUpgrade => "invalid_upgrade",
            Self::NoTransferEffect => "no_transfer_effect",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying one transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// An event was recorded
    Recorded {
        /// Key of the new event
        event_id: EventId,
        /// Kind of transition
        event_type: EventType,
        /// Outcome at the time of recording
        status: EventStatus,
    },
    /// Nothing was recorded
    Skipped(SkipReason),
}

impl Applied {
    pub(crate) fn recorded(event: &LedgerEvent) -> Self {
        Self::Recorded {
            event_id: event.event_id.clone(),
            event_type: event.event_type,
            status: event.status,
        }
    }

    /// Whether an event was recorded
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Counters of a full replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Transfers applied
    pub processed: usize,
    /// Events recorded
    pub recorded: usize,
    /// Skipped transfers by reason
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ReplayStats {
    /// Count one outcome
    pub fn record(&mut self, applied: &Applied) {
        self.processed += 1;
        match applied {
            Applied::Recorded { .. } => self.recorded += 1,
            Applied::Skipped(reason) => *self.skipped.entry(*reason).or_default() += 1,
        }
    }

    /// Total skipped transfers
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}
