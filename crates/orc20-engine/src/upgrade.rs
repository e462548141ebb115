//! Two-phase upgrade handshake
//!
//! Phase 1 inscribes the new parameters. The event waits while the deployer
//! holds the inscription and is blocked otherwise; transfers of the deploy
//! inscription swing it between the two. Phase 2 finalizes by sending the
//! upgrade inscription from the deployer to the upgrade validation address,
//! and resolves the phase 1 event to the same outcome.

use crate::context::{record, reject, resolve_tick, Movement};
use crate::outcome::{Applied, SkipReason};
use orc20_core::{
    exceeds_precision, ErrorCode, EventStatus, EventType, OpTag, ProtocolRules, TickMetadata,
    UpgradePayload,
};
use orc20_store::LedgerStore;

/// Handshake phase 1
pub(crate) fn inscribe(
    _rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
    metadata: TickMetadata,
) -> Applied {
    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::InscribeUpgrade,
        OpTag::Upgrade,
    );
    let upgrade = match UpgradePayload::decode(movement.body()) {
        Ok(upgrade) => upgrade,
        Err(error) => return reject(ledger, event, error),
    };
    let dec = upgrade.dec.unwrap_or(metadata.decimals);
    let max = upgrade.max.as_ref().unwrap_or(&metadata.max);
    let lim = upgrade.lim.as_ref().unwrap_or(&metadata.limit);
    if exceeds_precision(Some(max), dec) || exceeds_precision(Some(lim), dec) {
        return reject(ledger, event, "upgraded amounts exceed precision");
    }

    if !metadata.upgradeable {
        event.fail(ErrorCode::NonUpgradeable);
    } else if movement.to() == metadata.deployer {
        event.status = EventStatus::UpgradeWaiting;
    } else {
        event.status = EventStatus::UpgradeBlocked;
    }
    record(ledger, event)
}

/// Handshake phase 2
pub(crate) fn transfer(
    rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
) -> Applied {
    let upgrade = match UpgradePayload::decode(movement.body()) {
        Ok(upgrade) => upgrade,
        Err(error) => {
            tracing::debug!(inscription_id = %movement.inscription_id(), %error, "invalid upgrade");
            return Applied::Skipped(SkipReason::InvalidUpgrade);
        }
    };
    let Some(mut metadata) = resolve_tick(
        rules,
        ledger,
        &upgrade.tick,
        Some(&upgrade.id),
        movement.genesis_height(),
    )
    .cloned() else {
        tracing::debug!(inscription_id = %movement.inscription_id(), "upgrade of an undeployed tick");
        return Applied::Skipped(SkipReason::UnresolvedTick);
    };

    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::TransferUpgrade,
        OpTag::Upgrade,
    );
    let sender = movement.from();
    let finalized_before = !ledger
        .events_for_inscription(movement.inscription_id(), EventType::TransferUpgrade)
        .is_empty();
    if finalized_before || !rules.is_upgrade_validation_address(movement.to()) {
        event.fail(ErrorCode::InvalidUpgradeInscription);
    } else if sender != metadata.deployer {
        event.fail(ErrorCode::NoUpgradePermission);
    } else if !metadata.upgradeable {
        event.fail(ErrorCode::NonUpgradeable);
    } else {
        if let Some(ug) = upgrade.ug {
            metadata.upgradeable = ug;
        }
        if let Some(max) = upgrade.max {
            metadata.max = max;
        }
        if let Some(lim) = upgrade.lim {
            metadata.limit = lim;
        }
        if let Some(dec) = upgrade.dec {
            metadata.decimals = dec;
        }
        metadata.upgrade_time = Some(movement.transfer.block_time);
        metadata.content = movement.body().to_string();
        tracing::debug!(tick_id = %metadata.tick_id, "tick upgraded");
        ledger.put_metadata(metadata.clone());
    }

    let pending: Vec<String> = ledger
        .events_by_receiver(&metadata.tick_id, sender)
        .into_iter()
        .filter(|phase_one| phase_one.inscription_id == movement.inscription_id())
        .filter(|phase_one| {
            matches!(
                phase_one.status,
                EventStatus::UpgradeBlocked | EventStatus::UpgradeWaiting
            )
        })
        .map(|phase_one| phase_one.event_id.clone())
        .collect();
    for id in &pending {
        ledger.amend_event(id, event.status, event.error_code);
    }
    record(ledger, event)
}
