//! Multi-step send protocol in force before era B
//!
//! A sender inscribes any number of pending sends, each with an amount and a
//! nonce, then closes the batch with a "remaining balance" inscription that
//! carries no amount. The close settles the whole batch at once: either all
//! pending sends clear and the rest of the sender's holdings move onto the
//! closing inscription, or all of them fail.
//!
//! Pending sends are tracked by their creator, which stays fixed when the
//! pending inscription itself changes hands.

use crate::context::{record, reject, Movement};
use crate::outcome::{Applied, SkipReason};
use bigdecimal::{BigDecimal, Zero};
use orc20_core::{
    exceeds_precision, Balance, BalanceKey, BalanceStatus, CancelPayload, ErrorCode, EventStatus,
    EventType, LedgerEvent, OpTag, ProtocolRules, SendPayload, TickMetadata,
};
use orc20_store::LedgerStore;

/// Inscribe a pending send, or close the sender's batch when no amount is
/// given
pub(crate) fn inscribe(
    _rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
    metadata: TickMetadata,
) -> Applied {
    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::InscribeSend,
        OpTag::Send,
    );
    let send = match SendPayload::decode(movement.body()) {
        Ok(send) => send,
        Err(error) => return reject(ledger, event, error),
    };
    if exceeds_precision(send.amt.as_ref(), metadata.decimals) {
        return reject(ledger, event, "amount exceeds tick precision");
    }
    event.amount = send.amt.clone();
    let Some(nonce) = send.n else {
        return reject(ledger, event, "send without nonce");
    };

    let sender = movement.to().to_string();
    let op = if send.amt.is_some() {
        OpTag::Send
    } else {
        OpTag::RemainingBalance
    };
    event.op = op;
    event.nonce = Some(nonce);
    event.creator = Some(sender.clone());
    let mut balance = movement.balance(&metadata, op);
    balance.creator = Some(sender.clone());

    let pending = pending_sends(ledger, &metadata.tick_id, &sender);
    if pending.iter().any(|pending| pending.nonce == Some(nonce)) {
        event.fail(ErrorCode::DuplicatedNonce);
        balance.nonce = Some(nonce);
        ledger.put_balance(balance);
        return record(ledger, event);
    }

    match send.amt {
        Some(amount) => {
            balance.amount = amount;
            balance.nonce = Some(nonce);
            balance.status = BalanceStatus::SendPending;
            event.status = EventStatus::SendPending;
            ledger.put_balance(balance);
            record(ledger, event)
        }
        None => close_batch(ledger, event, balance, &sender, pending),
    }
}

/// Settle every pending send of `sender` against their OK holdings
fn close_batch(
    ledger: &mut LedgerStore,
    mut event: LedgerEvent,
    mut balance: Balance,
    sender: &str,
    pending: Vec<Balance>,
) -> Applied {
    event.event_type = EventType::InscribeRemainingBalance;
    if pending.is_empty() {
        event.fail(ErrorCode::MissingInscribeSend);
        ledger.put_balance(balance);
        return record(ledger, event);
    }

    let tick_id = balance.tick_id.clone();
    let held: Vec<BalanceKey> = ledger
        .holder_balances(&tick_id, sender)
        .into_iter()
        .filter(|held| held.is_ok())
        .map(Balance::key)
        .collect();
    let held_total = held
        .iter()
        .filter_map(|key| ledger.balance(key))
        .fold(BigDecimal::zero(), |total, held| total + &held.amount);
    let sending_total = pending
        .iter()
        .fold(BigDecimal::zero(), |total, pending| total + &pending.amount);
    let remaining = held_total - sending_total;

    if remaining < BigDecimal::zero() {
        for pending in &pending {
            ledger.set_balance_status(&pending.key(), BalanceStatus::Invalid);
        }
        settle_pending_events(
            ledger,
            &tick_id,
            sender,
            EventStatus::Failed,
            Some(ErrorCode::InsufficientBalance),
        );
        event.fail(ErrorCode::InsufficientBalance);
    } else {
        for key in &held {
            ledger.set_balance_status(key, BalanceStatus::Expired);
        }
        for pending in &pending {
            ledger.set_balance_status(&pending.key(), BalanceStatus::Ok);
        }
        balance.amount = remaining;
        balance.status = BalanceStatus::Ok;
        settle_pending_events(ledger, &tick_id, sender, EventStatus::Success, None);
        event.succeed();
    }
    tracing::debug!(
        tick_id = %tick_id,
        sender,
        pending = pending.len(),
        status = ?event.status,
        "send batch closed"
    );
    ledger.put_balance(balance);
    record(ledger, event)
}

/// Cancel pending sends of the inscriber by nonce; illegal from era B on
pub(crate) fn cancel(
    rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
    metadata: TickMetadata,
) -> Applied {
    let event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::InscribeCancel,
        OpTag::Cancel,
    );
    let cancel = match CancelPayload::decode(movement.body()) {
        Ok(cancel) => cancel,
        Err(error) => return reject(ledger, event, error),
    };
    if !rules.before_era_b(movement.height()) {
        return reject(ledger, event, "cancel after era B");
    }

    let canceler = movement.to();
    let balances: Vec<BalanceKey> = pending_sends(ledger, &metadata.tick_id, canceler)
        .iter()
        .filter(|pending| pending.nonce.is_some_and(|nonce| cancel.nonces.contains(&nonce)))
        .map(Balance::key)
        .collect();
    for key in &balances {
        ledger.set_balance_status(key, BalanceStatus::Canceled);
    }
    let events: Vec<String> = ledger
        .events_by_creator(&metadata.tick_id, canceler)
        .into_iter()
        .filter(|pending| pending.status == EventStatus::SendPending)
        .filter(|pending| pending.nonce.is_some_and(|nonce| cancel.nonces.contains(&nonce)))
        .map(|pending| pending.event_id.clone())
        .collect();
    for id in &events {
        ledger.amend_event(id, EventStatus::Canceled, None);
    }
    tracing::debug!(
        tick_id = %metadata.tick_id,
        canceler,
        balances = balances.len(),
        events = events.len(),
        "pending sends canceled"
    );
    record(ledger, event)
}

/// Move a send or remaining-balance inscription
///
/// A pending send keeps its creator and nonce so the creator's batch close
/// still finds it. From era B on only plain sends carry value; a remaining
/// balance sent anywhere but the ATM is frozen for good.
pub(crate) fn transfer(
    rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
) -> Applied {
    let Some(mut balance) = ledger.balance_by_inscription(movement.inscription_id()).cloned() else {
        tracing::debug!(inscription_id = %movement.inscription_id(), "send inscription without balance");
        return Applied::Skipped(SkipReason::NoBalance);
    };
    let mut event = movement.event(
        &balance.tick_id,
        &balance.tick,
        EventType::TransferSend,
        balance.op,
    );
    let key = balance.key();
    let status = balance.status;
    match status {
        BalanceStatus::Ok if rules.before_era_b(movement.height()) || balance.op == OpTag::Send => {
            event.amount = Some(balance.amount.clone());
            ledger.move_balance(&key, movement.to());
        }
        BalanceStatus::Ok if balance.op == OpTag::RemainingBalance => {
            event.fail(ErrorCode::RemainingBalanceLocked);
            balance.op = OpTag::ShadowRemainingBalance;
            ledger.put_balance(balance);
        }
        BalanceStatus::Ok => event.fail(ErrorCode::IneffectiveInscription),
        BalanceStatus::SendPending => {
            event.amount = Some(balance.amount.clone());
            event.status = EventStatus::SendPending;
            event.creator = balance.creator.clone();
            event.nonce = balance.nonce;
            ledger.move_balance(&key, movement.to());
        }
        BalanceStatus::Invalid | BalanceStatus::Canceled | BalanceStatus::Expired => {
            event.fail(ErrorCode::IneffectiveInscription);
            ledger.move_balance(&key, movement.to());
        }
    }
    record(ledger, event)
}

/// Pending send balances opened by `creator`, wherever they are held now
fn pending_sends(ledger: &LedgerStore, tick_id: &str, creator: &str) -> Vec<Balance> {
    ledger
        .created_balances(tick_id, creator)
        .into_iter()
        .filter(|balance| balance.status == BalanceStatus::SendPending)
        .cloned()
        .collect()
}

fn settle_pending_events(
    ledger: &mut LedgerStore,
    tick_id: &str,
    creator: &str,
    status: EventStatus,
    error_code: Option<ErrorCode>,
) {
    let ids: Vec<String> = ledger
        .events_by_creator(tick_id, creator)
        .into_iter()
        .filter(|pending| pending.status == EventStatus::SendPending)
        .map(|pending| pending.event_id.clone())
        .collect();
    for id in &ids {
        ledger.amend_event(id, status, error_code);
    }
}
