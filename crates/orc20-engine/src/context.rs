//! Shared plumbing for the transition handlers

use crate::outcome::Applied;
use bigdecimal::{BigDecimal, Zero};
use orc20_core::{
    parse_long, Balance, BalanceStatus, ErrorCode, EventStatus, EventType, InscriptionContent,
    InscriptionTransfer, LedgerEvent, OpTag, ProtocolRules, TickMetadata,
};
use orc20_store::LedgerStore;
use std::fmt;

/// One transfer together with the content of the moved inscription
///
/// The content is cloned out of the store so handlers can mutate the store
/// while reading it.
pub(crate) struct Movement<'a> {
    pub(crate) transfer: &'a InscriptionTransfer,
    pub(crate) content: InscriptionContent,
}

impl<'a> Movement<'a> {
    pub(crate) fn new(transfer: &'a InscriptionTransfer, content: InscriptionContent) -> Self {
        Self { transfer, content }
    }

    pub(crate) fn event_id(&self) -> &str {
        &self.transfer.to_location
    }

    pub(crate) fn inscription_id(&self) -> &str {
        &self.content.inscription_id
    }

    pub(crate) fn body(&self) -> &str {
        &self.content.content_body
    }

    /// Height of this movement
    pub(crate) fn height(&self) -> u64 {
        self.transfer.block_height
    }

    /// Height at which the inscription was created
    pub(crate) fn genesis_height(&self) -> u64 {
        self.content.genesis_height
    }

    pub(crate) fn from(&self) -> &str {
        &self.transfer.from_address
    }

    pub(crate) fn to(&self) -> &str {
        &self.transfer.to_address
    }

    /// A successful event for this movement; handlers amend the outcome
    pub(crate) fn event(
        &self,
        tick_id: &str,
        tick: &str,
        event_type: EventType,
        op: OpTag,
    ) -> LedgerEvent {
        LedgerEvent {
            event_id: self.transfer.to_location.clone(),
            tick_id: tick_id.to_string(),
            tick: tick.to_string(),
            inscription_id: self.content.inscription_id.clone(),
            inscription_number: self.content.inscription_number,
            from_address: self.transfer.from_address.clone(),
            to_address: self.transfer.to_address.clone(),
            event_type,
            op,
            nonce: None,
            creator: None,
            status: EventStatus::Success,
            error_code: None,
            amount: None,
            payload: self.content.content_body.clone(),
            tx_id: self.transfer.tx_id.clone(),
            tx_index: self.transfer.tx_index,
            block_time: self.transfer.block_time,
            block_height: self.transfer.block_height,
        }
    }

    /// An empty, invalid balance on this inscription held by the receiver
    pub(crate) fn balance(&self, metadata: &TickMetadata, op: OpTag) -> Balance {
        Balance {
            tick_id: metadata.tick_id.clone(),
            tick: metadata.tick.clone(),
            inscription_id: self.content.inscription_id.clone(),
            address: self.transfer.to_address.clone(),
            amount: BigDecimal::zero(),
            creator: None,
            nonce: None,
            status: BalanceStatus::Invalid,
            op,
        }
    }
}

/// A fresh, empty credit balance
pub(crate) fn empty_credit(tick_id: &str, tick: &str, address: &str) -> Balance {
    Balance {
        tick_id: tick_id.to_string(),
        tick: tick.to_string(),
        inscription_id: String::new(),
        address: address.to_string(),
        amount: BigDecimal::zero(),
        creator: None,
        nonce: None,
        status: BalanceStatus::Ok,
        op: OpTag::Credit,
    }
}

/// The live credit balance of `address`, or a fresh empty one
pub(crate) fn credit_or_empty(
    ledger: &LedgerStore,
    tick_id: &str,
    tick: &str,
    address: &str,
) -> Balance {
    ledger
        .credit_balance(tick_id, address)
        .filter(|credit| credit.is_ok())
        .cloned()
        .unwrap_or_else(|| empty_credit(tick_id, tick, address))
}

/// Store `event` and report it
pub(crate) fn record(ledger: &mut LedgerStore, event: LedgerEvent) -> Applied {
    let applied = Applied::recorded(&event);
    ledger.put_event(event);
    applied
}

/// Store `event` as failed with `INVALID_INSCRIPTION`
pub(crate) fn reject(
    ledger: &mut LedgerStore,
    mut event: LedgerEvent,
    reason: impl fmt::Display,
) -> Applied {
    tracing::debug!(
        event_id = %event.event_id,
        inscription_id = %event.inscription_id,
        %reason,
        "invalid inscription"
    );
    event.fail(ErrorCode::InvalidInscription);
    record(ledger, event)
}

/// Find the tick a payload addresses, under the rules in force when the
/// inscription was created
///
/// Before era A the payload `id` is the deploy identity itself. From era A
/// on it is the deploy inscription's number.
pub(crate) fn resolve_tick<'s>(
    rules: &ProtocolRules,
    ledger: &'s LedgerStore,
    tick: &str,
    id: Option<&str>,
    genesis_height: u64,
) -> Option<&'s TickMetadata> {
    if rules.before_era_a(genesis_height) {
        return ledger.metadata_by_deploy_id(tick, id);
    }
    let number = parse_long(id?).ok()?;
    ledger.metadata_by_number(tick, number)
}

/// Amend every event of `tick_id` received by `address` that is in status
/// `from`
pub(crate) fn swing_received_events(
    ledger: &mut LedgerStore,
    tick_id: &str,
    address: &str,
    from: EventStatus,
    to: EventStatus,
) {
    let ids: Vec<String> = ledger
        .events_by_receiver(tick_id, address)
        .into_iter()
        .filter(|event| event.status == from)
        .map(|event| event.event_id.clone())
        .collect();
    for id in ids {
        ledger.amend_event(&id, to, None);
    }
}
