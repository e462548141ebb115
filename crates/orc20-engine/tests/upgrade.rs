//! Two-phase tick upgrades and how deploy transfers gate them

#![allow(clippy::expect_used, missing_docs)]

mod common;

use assert_matches::assert_matches;
use common::*;
use orc20_core::{ErrorCode, EventStatus, EventType, OpTag};
use orc20_engine::{Applied, SkipReason};

fn deployed(extra: &str) -> (Chain, Inscribed) {
    let mut chain = Chain::new();
    let deploy = chain.deploy(ERA_A_ONLY, "deployer", "ordi", extra);
    (chain, deploy)
}

fn upgrade(chain: &mut Chain, to: &str, deploy: &Inscribed, extra: &str) -> Inscribed {
    let body = body("upgrade", "ordi", &deploy.target(), extra);
    chain.inscribe(ERA_A_ONLY, to, &body)
}

#[test]
fn phase_one_waits_only_for_the_deployer() {
    let (mut chain, deploy) = deployed(r#","lim":"10""#);
    let waiting = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    let blocked = upgrade(&mut chain, "bob", &deploy, r#","lim":"50""#);

    let event = chain.event(&waiting.applied);
    assert_eq!(event.event_type, EventType::InscribeUpgrade);
    assert_eq!(event.op, OpTag::Upgrade);
    assert_eq!(event.status, EventStatus::UpgradeWaiting);
    assert_eq!(chain.event(&blocked.applied).status, EventStatus::UpgradeBlocked);

    // Nothing changes until phase two.
    assert_eq!(chain.metadata(&deploy.id).limit, dec("10"));
}

#[test]
fn deploy_transfer_swings_waiting_and_blocked() {
    let (mut chain, deploy) = deployed("");
    let waiting = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    let blocked = upgrade(&mut chain, "bob", &deploy, r#","lim":"50""#);

    chain.transfer(ERA_A_ONLY, &deploy.id, "deployer", "bob");
    assert_eq!(chain.event(&waiting.applied).status, EventStatus::UpgradeBlocked);
    assert_eq!(chain.event(&blocked.applied).status, EventStatus::UpgradeWaiting);

    chain.transfer(ERA_A_ONLY, &deploy.id, "bob", "deployer");
    assert_eq!(chain.event(&waiting.applied).status, EventStatus::UpgradeWaiting);
    assert_eq!(chain.event(&blocked.applied).status, EventStatus::UpgradeBlocked);
}

#[test]
fn deploy_transfer_to_same_holder_changes_nothing() {
    let (mut chain, deploy) = deployed("");
    let waiting = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);

    let moved = chain.transfer(ERA_A_ONLY, &deploy.id, "deployer", "deployer");
    assert_eq!(chain.event(&moved).status, EventStatus::Success);
    assert_eq!(chain.event(&waiting.applied).status, EventStatus::UpgradeWaiting);
}

#[test]
fn phase_two_applies_the_upgrade() {
    let (mut chain, deploy) = deployed(r#","lim":"10""#);
    let phase_one = upgrade(
        &mut chain,
        "deployer",
        &deploy,
        r#","lim":"50","max":"1000","dec":"8""#,
    );

    let phase_two = chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", CUSTODIAL);
    let event = chain.event(&phase_two);
    assert_eq!(event.event_type, EventType::TransferUpgrade);
    assert_eq!(event.status, EventStatus::Success);
    assert_eq!(chain.event(&phase_one.applied).status, EventStatus::Success);

    let metadata = chain.metadata(&deploy.id);
    assert_eq!(metadata.limit, dec("50"));
    assert_eq!(metadata.max, dec("1000"));
    assert_eq!(metadata.decimals, 8);
    assert!(metadata.upgradeable);
    assert!(metadata.upgrade_time.is_some());
    assert!(metadata.content.contains("upgrade"));

    let mint = chain.mint(ERA_A_ONLY, "alice", &deploy, "40");
    assert_eq!(chain.event(&mint.applied).status, EventStatus::Success);
    let precise = chain.mint(ERA_A_ONLY, "alice", &deploy, "0.000000001");
    assert_eq!(
        chain.event(&precise.applied).error_code,
        Some(ErrorCode::InvalidInscription)
    );
}

#[test]
fn upgrade_can_only_be_finalized_once() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", CUSTODIAL);

    let replayed = chain.transfer(ERA_A_ONLY, &phase_one.id, CUSTODIAL, CUSTODIAL);
    assert_eq!(
        chain.event(&replayed).error_code,
        Some(ErrorCode::InvalidUpgradeInscription)
    );
    assert_eq!(chain.event(&phase_one.applied).status, EventStatus::Success);
}

#[test]
fn upgrade_can_turn_off_further_upgrades() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","ug":"false""#);
    chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", CUSTODIAL);
    assert!(!chain.metadata(&deploy.id).upgradeable);

    let later = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    assert_eq!(
        chain.event(&later.applied).error_code,
        Some(ErrorCode::NonUpgradeable)
    );
}

#[test]
fn moving_the_deploy_away_blocks_finalization() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    chain.transfer(ERA_A_ONLY, &deploy.id, "deployer", "bob");
    assert_eq!(chain.event(&phase_one.applied).status, EventStatus::UpgradeBlocked);

    let phase_two = chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", CUSTODIAL);
    assert_eq!(
        chain.event(&phase_two).error_code,
        Some(ErrorCode::NoUpgradePermission)
    );
    assert_eq!(chain.metadata(&deploy.id).limit, dec("1"));
}

#[test]
fn non_deployer_cannot_finalize() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "bob", &deploy, r#","lim":"50""#);

    let phase_two = chain.transfer(ERA_A_ONLY, &phase_one.id, "bob", CUSTODIAL);
    let event = chain.event(&phase_two);
    assert_eq!(event.status, EventStatus::Failed);
    assert_eq!(event.error_code, Some(ErrorCode::NoUpgradePermission));

    let mirrored = chain.event(&phase_one.applied);
    assert_eq!(mirrored.status, EventStatus::Failed);
    assert_eq!(mirrored.error_code, Some(ErrorCode::NoUpgradePermission));
    assert_eq!(chain.metadata(&deploy.id).limit, dec("1"));
}

#[test]
fn phase_two_must_target_the_validation_address() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);

    let misdirected = chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", "carol");
    assert_eq!(
        chain.event(&misdirected).error_code,
        Some(ErrorCode::InvalidUpgradeInscription)
    );
    assert_eq!(
        chain.event(&phase_one.applied).error_code,
        Some(ErrorCode::InvalidUpgradeInscription)
    );
    assert_eq!(chain.metadata(&deploy.id).limit, dec("1"));
}

#[test]
fn non_upgradeable_tick_rejects_phase_one() {
    let (mut chain, deploy) = deployed(r#","ug":"false""#);
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","lim":"50""#);
    let event = chain.event(&phase_one.applied);
    assert_eq!(event.status, EventStatus::Failed);
    assert_eq!(event.error_code, Some(ErrorCode::NonUpgradeable));
}

#[test]
fn upgrade_precision_uses_the_effective_decimals() {
    let (mut chain, deploy) = deployed(r#","dec":"2","lim":"1""#);

    let coarse = upgrade(&mut chain, "deployer", &deploy, r#","lim":"0.001""#);
    assert_eq!(
        chain.event(&coarse.applied).error_code,
        Some(ErrorCode::InvalidInscription)
    );

    let narrowed = upgrade(&mut chain, "deployer", &deploy, r#","dec":"1","lim":"0.25""#);
    assert_eq!(
        chain.event(&narrowed.applied).error_code,
        Some(ErrorCode::InvalidInscription)
    );

    let widened = upgrade(&mut chain, "deployer", &deploy, r#","dec":"4","lim":"0.0025""#);
    assert_eq!(chain.event(&widened.applied).status, EventStatus::UpgradeWaiting);
}

#[test]
fn malformed_phase_two_is_skipped() {
    let (mut chain, deploy) = deployed("");
    let phase_one = upgrade(&mut chain, "deployer", &deploy, r#","dec":"40""#);
    assert_eq!(
        chain.event(&phase_one.applied).error_code,
        Some(ErrorCode::InvalidInscription)
    );

    let phase_two = chain.transfer(ERA_A_ONLY, &phase_one.id, "deployer", CUSTODIAL);
    assert_matches!(phase_two, Applied::Skipped(SkipReason::InvalidUpgrade));
    assert_eq!(chain.metadata(&deploy.id).decimals, 18);
}
