//! Tick deployment and deploy inscription transfers

use crate::context::{record, swing_received_events, Movement};
use crate::outcome::{Applied, SkipReason};
use bigdecimal::{BigDecimal, Zero};
use orc20_core::{
    exceeds_precision, DeployPayload, ErrorCode, EventStatus, EventType, OpTag, ProtocolRules,
    TickMetadata,
};
use orc20_store::LedgerStore;

/// Create a tick
///
/// Before era A the deploy identity is the payload `id` and must be unused
/// for the tick. From era A on it is the inscription's own number, which can
/// never collide. An invalid deploy leaves no event, since there is no tick
/// to attach one to.
pub(crate) fn inscribe(
    rules: &ProtocolRules,
    ledger: &mut LedgerStore,
    movement: &Movement<'_>,
) -> Applied {
    let deploy = match DeployPayload::decode(movement.body()) {
        Ok(deploy) => deploy,
        Err(error) => {
            tracing::debug!(inscription_id = %movement.inscription_id(), %error, "invalid deploy");
            return Applied::Skipped(SkipReason::InvalidDeploy);
        }
    };
    if exceeds_precision(Some(&deploy.max), deploy.dec)
        || exceeds_precision(Some(&deploy.lim), deploy.dec)
    {
        tracing::debug!(
            inscription_id = %movement.inscription_id(),
            dec = deploy.dec,
            "deploy amounts exceed declared precision"
        );
        return Applied::Skipped(SkipReason::InvalidDeploy);
    }

    let content = &movement.content;
    let mut metadata = TickMetadata {
        tick_id: content.inscription_id.clone(),
        tick: deploy.tick.clone(),
        deploy_id: None,
        inscription_id: content.inscription_id.clone(),
        inscription_number: content.inscription_number,
        deployer: movement.to().to_string(),
        deploy_time: movement.transfer.block_time,
        max: deploy.max,
        minted: BigDecimal::zero(),
        limit: deploy.lim,
        decimals: deploy.dec,
        last_mint_time: None,
        upgradeable: deploy.ug,
        content: content.content_body.clone(),
        upgrade_time: None,
        wrapped: deploy.wp,
    };
    let mut event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::InscribeDeploy,
        OpTag::Deploy,
    );

    if !rules.before_era_a(movement.height()) {
        metadata.deploy_id = Some(content.inscription_number.to_string());
        ledger.put_metadata(metadata);
    } else if ledger
        .metadata_by_deploy_id(&deploy.tick, deploy.id.as_deref())
        .is_some()
    {
        event.fail(ErrorCode::Redeployment);
    } else {
        metadata.deploy_id = deploy.id;
        ledger.put_metadata(metadata);
    }
    record(ledger, event)
}

/// Hand the tick to the deploy inscription's new holder
///
/// Upgrade inscriptions waiting on the old deployer become blocked, and
/// blocked ones held by the new deployer become ready.
pub(crate) fn transfer(ledger: &mut LedgerStore, movement: &Movement<'_>, tick: &str) -> Applied {
    let Some(mut metadata) = ledger
        .metadata_by_number(tick, movement.content.inscription_number)
        .cloned()
    else {
        tracing::debug!(
            inscription_id = %movement.inscription_id(),
            tick,
            "transfer of an undeployed tick"
        );
        return Applied::Skipped(SkipReason::UnresolvedTick);
    };

    let event = movement.event(
        &metadata.tick_id,
        &metadata.tick,
        EventType::TransferDeploy,
        OpTag::Deploy,
    );
    let previous = std::mem::replace(&mut metadata.deployer, movement.to().to_string());
    // Handing the deploy to its current holder leaves pending upgrades as they are.
    if previous != metadata.deployer {
        swing_received_events(
            ledger,
            &metadata.tick_id,
            &metadata.deployer,
            EventStatus::UpgradeBlocked,
            EventStatus::UpgradeWaiting,
        );
        swing_received_events(
            ledger,
            &metadata.tick_id,
            &previous,
            EventStatus::UpgradeWaiting,
            EventStatus::UpgradeBlocked,
        );
    }
    ledger.put_metadata(metadata);
    record(ledger, event)
}
