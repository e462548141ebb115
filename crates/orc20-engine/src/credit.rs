//! Era B credit model: the virtual ATM
//!
//! Each (tick, address) pair owns at most one live pooled credit balance,
//! not backed by any inscription. Sending a balance-bearing inscription to
//! the ATM address deposits its value into the sender's credit. Inscribing a
//! send withdraws from the inscriber's credit onto the new inscription.

use crate::context::{credit_or_empty, record, reject, Movement};
use crate::outcome::{Applied, SkipReason};
use orc20_core::{
    exceeds_precision, BalanceStatus, ErrorCode, EventType, OpTag, ProtocolRules, SendPayload,
    TickMetadata,
};
use orc20_store::LedgerStore;

/// Withdraw the declared amount from the inscriber's credit
pub(crate) fn withdraw(
    _rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
    metadata: TickMetadata,
) -> Applied {
    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::Withdraw,
        OpTag::Send,
    );
    let send = match SendPayload::decode(movement.body()) {
        Ok(send) => send,
        Err(error) => return reject(ledger, event, error),
    };
    if exceeds_precision(send.amt.as_ref(), metadata.decimals) {
        return reject(ledger, event, "amount exceeds tick precision");
    }

    let mut balance = movement.balance(&metadata, OpTag::Send);
    let Some(amount) = send.amt else {
        ledger.put_balance(balance);
        return reject(ledger, event, "withdraw without amount");
    };
    event.amount = Some(amount.clone());

    let mut credit = credit_or_empty(ledger, &metadata.tick_id, &metadata.tick, movement.to());
    if credit.amount >= amount {
        credit.amount = &credit.amount - &amount;
        credit.status = BalanceStatus::Ok;
        ledger.put_balance(credit);
        balance.amount = amount;
        balance.status = BalanceStatus::Ok;
    } else {
        tracing::debug!(
            address = %movement.to(),
            credit = %credit.amount,
            requested = %amount,
            "withdraw exceeds credit"
        );
        event.fail(ErrorCode::InsufficientBalance);
    }
    ledger.put_balance(balance);
    record(ledger, event)
}

/// Convert the transferred inscription's balance into sender credit
///
/// The source balance expires and the holder is not moved. A frozen
/// remaining balance cannot be deposited.
pub(crate) fn deposit(ledger: &mut LedgerStore, movement: &Movement<'_>) -> Applied {
    let Some(balance) = ledger.balance_by_inscription(movement.inscription_id()).cloned() else {
        tracing::debug!(inscription_id = %movement.inscription_id(), "deposit of inscription without balance");
        return Applied::Skipped(SkipReason::NoBalance);
    };
    let mut event = movement.event(
        &balance.tick_id,
        &balance.tick,
        EventType::Deposit,
        balance.op,
    );
    if !balance.is_ok() || balance.op == OpTag::ShadowRemainingBalance {
        event.fail(ErrorCode::IneffectiveInscription);
        return record(ledger, event);
    }

    event.amount = Some(balance.amount.clone());
    ledger.set_balance_status(&balance.key(), BalanceStatus::Expired);
    let mut credit = credit_or_empty(ledger, &balance.tick_id, &balance.tick, movement.from());
    credit.amount = &credit.amount + &balance.amount;
    tracing::debug!(
        tick_id = %balance.tick_id,
        depositor = %movement.from(),
        credit = %credit.amount,
        "credit deposited"
    );
    ledger.put_balance(credit);
    record(ledger, event)
}
