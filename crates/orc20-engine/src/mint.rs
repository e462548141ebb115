//! Minting and mint inscription transfers

use crate::context::{record, reject, Movement};
use crate::outcome::{Applied, SkipReason};
use orc20_core::{
    exceeds_precision, BalanceStatus, ErrorCode, EventType, MintPayload, OpTag, ProtocolRules,
    TickMetadata,
};
use orc20_store::LedgerStore;

/// Mint into the inscriber's address
///
/// A mint over the per-mint limit or past the maximum supply still leaves an
/// invalid balance on the inscription.
pub(crate) fn inscribe(
    _rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
    mut metadata: TickMetadata,
) -> Applied {
    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::InscribeMint,
        OpTag::Mint,
    );
    let mint = match MintPayload::decode(movement.body()) {
        Ok(mint) => mint,
        Err(error) => return reject(ledger, event, error),
    };
    if exceeds_precision(Some(&mint.amt), metadata.decimals) {
        return reject(ledger, event, "amount exceeds tick precision");
    }

    event.amount = Some(mint.amt.clone());
    let mut balance = movement.balance(&metadata, OpTag::Mint);
    let minted = &metadata.minted + &mint.amt;
    if mint.amt > metadata.limit {
        event.fail(ErrorCode::ExceedingLimit);
    } else if minted > metadata.max {
        event.fail(ErrorCode::ExceedingSupply);
    } else {
        metadata.minted = minted;
        metadata.last_mint_time = Some(movement.transfer.block_time);
        ledger.put_metadata(metadata);
        balance.amount = mint.amt;
        balance.status = BalanceStatus::Ok;
    }
    ledger.put_balance(balance);
    record(ledger, event)
}

/// Move a mint balance to the receiver; only an OK balance carries value
pub(crate) fn transfer(ledger: &mut LedgerStore, movement: &Movement<'_>) -> Applied {
    let Some(balance) = ledger.balance_by_inscription(movement.inscription_id()).cloned() else {
        tracing::debug!(inscription_id = %movement.inscription_id(), "mint inscription without balance");
        return Applied::Skipped(SkipReason::NoBalance);
    };
    let mut event = movement.event(
        &balance.tick_id,
        &balance.tick,
        EventType::TransferMint,
        OpTag::Mint,
    );
    if balance.is_ok() {
        event.amount = Some(balance.amount.clone());
    } else {
        event.fail(ErrorCode::IneffectiveInscription);
    }
    ledger.move_balance(&balance.key(), movement.to());
    record(ledger, event)
}
