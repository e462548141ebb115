//! Era B credit deposits and withdrawals through the virtual ATM, and the
//! balance snapshot taken when era B begins

#![allow(clippy::expect_used, missing_docs)]

mod common;

use bigdecimal::Zero;
use common::*;
use orc20_core::{BalanceStatus, ErrorCode, EventStatus, EventType, OpTag};
use orc20_engine::{Applied, SkipReason};

/// A tick with `held` minted to alice before era B
fn funded(held: &str) -> (Chain, Inscribed, Inscribed) {
    let mut chain = Chain::new();
    let deploy = chain.deploy(ERA_A_ONLY, "deployer", "ordi", r#","lim":"100""#);
    let mint = chain.mint(ERA_A_ONLY, "alice", &deploy, held);
    (chain, deploy, mint)
}

fn withdraw(amt: &str) -> String {
    format!(r#","amt":"{amt}""#)
}

#[test]
fn deposit_converts_balance_into_credit() {
    let (mut chain, deploy, mint) = funded("10");
    let deposit = chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);

    let event = chain.event(&deposit);
    assert_eq!(event.event_type, EventType::Deposit);
    assert_eq!(event.op, OpTag::Mint);
    assert_eq!(event.status, EventStatus::Success);
    assert_eq!(event.amount, Some(dec("10")));

    let source = chain.balance(&mint.id);
    assert_eq!(source.status, BalanceStatus::Expired);
    assert_eq!(source.address, "alice");
    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("10")));

    // An expired source cannot be deposited twice.
    let again = chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);
    assert_eq!(
        chain.event(&again).error_code,
        Some(ErrorCode::IneffectiveInscription)
    );
    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("10")));
}

#[test]
fn deposits_accumulate_into_one_credit() {
    let (mut chain, deploy, first) = funded("10");
    let second = chain.mint(ERA_A_ONLY, "alice", &deploy, "2.5");
    chain.transfer(ERA_B_ON, &first.id, "alice", CUSTODIAL);
    chain.transfer(ERA_B_ON, &second.id, "alice", CUSTODIAL);

    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("12.5")));
    let credit = chain
        .ledger
        .credit_balance(&deploy.id, "alice")
        .expect("credit exists");
    assert_eq!(credit.op, OpTag::Credit);
    assert!(credit.is_credit());
}

#[test]
fn withdraw_draws_from_credit() {
    let (mut chain, deploy, mint) = funded("10");
    chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);

    let withdrawal = chain.send(ERA_B_ON, "alice", &deploy, &withdraw("4"));
    let event = chain.event(&withdrawal.applied);
    assert_eq!(event.event_type, EventType::Withdraw);
    assert_eq!(event.status, EventStatus::Success);
    assert_eq!(event.amount, Some(dec("4")));

    let balance = chain.balance(&withdrawal.id);
    assert_eq!(balance.status, BalanceStatus::Ok);
    assert_eq!(balance.amount, dec("4"));
    assert_eq!(balance.op, OpTag::Send);
    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("6")));

    // The withdrawn inscription is an ordinary send.
    let moved = chain.transfer(ERA_B_ON, &withdrawal.id, "alice", "bob");
    assert_eq!(chain.event(&moved).amount, Some(dec("4")));
    assert_eq!(chain.balance(&withdrawal.id).address, "bob");

    // And bob can deposit it into his own credit.
    chain.transfer(ERA_B_ON, &withdrawal.id, "bob", CUSTODIAL);
    assert_eq!(chain.credit(&deploy, "bob"), Some(dec("4")));
}

#[test]
fn withdraw_over_credit_leaves_credit_unchanged() {
    let (mut chain, deploy, mint) = funded("10");
    chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);

    let withdrawal = chain.send(ERA_B_ON, "alice", &deploy, &withdraw("20"));
    let event = chain.event(&withdrawal.applied);
    assert_eq!(event.status, EventStatus::Failed);
    assert_eq!(event.error_code, Some(ErrorCode::InsufficientBalance));
    assert_eq!(event.amount, Some(dec("20")));

    let balance = chain.balance(&withdrawal.id);
    assert_eq!(balance.status, BalanceStatus::Invalid);
    assert!(balance.amount.is_zero());
    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("10")));
}

#[test]
fn withdraw_without_credit_creates_none() {
    let (mut chain, deploy, _) = funded("10");
    let withdrawal = chain.send(ERA_B_ON, "bob", &deploy, &withdraw("1"));

    assert_eq!(
        chain.event(&withdrawal.applied).error_code,
        Some(ErrorCode::InsufficientBalance)
    );
    assert!(chain.ledger.credit_balance(&deploy.id, "bob").is_none());
}

#[test]
fn withdraw_without_amount_is_invalid() {
    let (mut chain, deploy, mint) = funded("10");
    chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);

    let withdrawal = chain.send(ERA_B_ON, "alice", &deploy, r#","n":"1""#);
    let event = chain.event(&withdrawal.applied);
    assert_eq!(event.event_type, EventType::Withdraw);
    assert_eq!(event.error_code, Some(ErrorCode::InvalidInscription));
    assert_eq!(chain.balance(&withdrawal.id).status, BalanceStatus::Invalid);
    assert_eq!(chain.credit(&deploy, "alice"), Some(dec("10")));
}

#[test]
fn new_holder_deposits_into_own_credit() {
    let (mut chain, deploy, mint) = funded("10");
    chain.transfer(ERA_B_ON, &mint.id, "alice", "bob");
    chain.transfer(ERA_B_ON, &mint.id, "bob", CUSTODIAL);

    assert_eq!(chain.credit(&deploy, "bob"), Some(dec("10")));
    assert_eq!(chain.credit(&deploy, "alice"), None);
}

#[test]
fn invalid_balance_cannot_be_deposited() {
    let mut chain = Chain::new();
    let deploy = chain.deploy(ERA_A_ONLY, "deployer", "ordi", r#","lim":"5""#);
    let mint = chain.mint(ERA_A_ONLY, "alice", &deploy, "6");

    let deposit = chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);
    let event = chain.event(&deposit);
    assert_eq!(event.event_type, EventType::Deposit);
    assert_eq!(event.error_code, Some(ErrorCode::IneffectiveInscription));
    assert_eq!(chain.balance(&mint.id).status, BalanceStatus::Invalid);
    assert!(chain.ledger.credit_balance(&deploy.id, "alice").is_none());
}

#[test]
fn deposit_of_inscription_without_balance_is_skipped() {
    let (mut chain, deploy, _) = funded("10");
    // Rejected for precision, so no balance was ever attached.
    let mint = chain.mint(ERA_A_ONLY, "alice", &deploy, "0.0000000000000000001");
    let deposit = chain.transfer(ERA_B_ON, &mint.id, "alice", CUSTODIAL);
    assert_eq!(deposit, Applied::Skipped(SkipReason::NoBalance));
}

#[test]
fn atm_address_is_ordinary_before_era_b() {
    let (mut chain, deploy, mint) = funded("10");
    let moved = chain.transfer(ERA_A_ONLY, &mint.id, "alice", CUSTODIAL);

    let event = chain.event(&moved);
    assert_eq!(event.event_type, EventType::TransferMint);
    assert_eq!(event.amount, Some(dec("10")));
    assert_eq!(chain.balance(&mint.id).address, CUSTODIAL);
    assert_eq!(chain.balance(&mint.id).status, BalanceStatus::Ok);
    assert_eq!(chain.credit(&deploy, "alice"), None);
}

#[test]
fn era_b_snapshot_freezes_ok_balances_once() {
    let mut chain = Chain::new();
    let deploy = chain.deploy(ERA_A_ONLY, "deployer", "ordi", r#","lim":"10""#);
    let good = chain.mint(ERA_A_ONLY, "alice", &deploy, "10");
    chain.mint(ERA_A_ONLY, "alice", &deploy, "11");
    assert!(!chain.ledger.snapshot_taken());
    assert!(chain.ledger.balance_snapshot().is_empty());

    chain.transfer(ERA_B_ON, &good.id, "alice", CUSTODIAL);
    assert!(chain.ledger.snapshot_taken());

    let frozen = chain.ledger.balance_snapshot();
    assert_eq!(frozen.len(), 1);
    assert_eq!(frozen[0].inscription_id, good.id);
    assert_eq!(frozen[0].status, BalanceStatus::Ok);
    assert_eq!(frozen[0].amount, dec("10"));

    // Later era B activity leaves the snapshot as it was.
    chain.send(ERA_B_ON, "alice", &deploy, &withdraw("3"));
    assert_eq!(chain.balance(&good.id).status, BalanceStatus::Expired);
    let frozen = chain.ledger.balance_snapshot();
    assert_eq!(frozen.len(), 1);
    assert_eq!(frozen[0].status, BalanceStatus::Ok);
    assert!(!chain.ledger.take_snapshot());
}
