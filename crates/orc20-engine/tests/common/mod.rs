//! Shared chain harness for engine integration tests

#![allow(dead_code, clippy::expect_used)]

use bigdecimal::BigDecimal;
use orc20_core::protocol::DEFAULT_CUSTODIAL_ADDRESS;
use orc20_core::{
    Balance, BalanceKey, InscriptionContent, InscriptionTransfer, LedgerEvent, ProtocolRules,
    TickMetadata,
};
use orc20_engine::{Applied, LedgerEngine};
use orc20_store::LedgerStore;
use std::str::FromStr;

pub const ERA_A: u64 = 100;
pub const ERA_B: u64 = 200;

/// Heights inside each era
pub const PRE_A: u64 = 50;
pub const ERA_A_ONLY: u64 = 150;
pub const ERA_B_ON: u64 = 250;

pub const CUSTODIAL: &str = DEFAULT_CUSTODIAL_ADDRESS;

pub fn rules() -> ProtocolRules {
    ProtocolRules {
        era_a_height: ERA_A,
        era_b_height: ERA_B,
        ..ProtocolRules::default()
    }
}

pub fn dec(text: &str) -> BigDecimal {
    BigDecimal::from_str(text).expect("decimal literal")
}

/// A payload body addressing an existing tick
pub fn body(op: &str, tick: &str, id: &str, extra: &str) -> String {
    format!(r#"{{"p":"orc-20","tick":"{tick}","op":"{op}","id":"{id}"{extra}}}"#)
}

/// A newly created inscription
pub struct Inscribed {
    pub id: String,
    pub number: i64,
    pub applied: Applied,
}

impl Inscribed {
    /// Identity used by payloads targeting this deploy from era A on
    pub fn target(&self) -> String {
        self.number.to_string()
    }
}

/// A ledger plus an engine, with monotonically increasing transaction
/// positions so every movement gets a fresh location
pub struct Chain {
    pub engine: LedgerEngine,
    pub ledger: LedgerStore,
    sequence: u64,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::with_rules(rules())
    }

    pub fn with_rules(rules: ProtocolRules) -> Self {
        Self {
            engine: LedgerEngine::new(rules),
            ledger: LedgerStore::new(),
            sequence: 0,
        }
    }

    /// Store a content and apply its creation movement
    pub fn inscribe(&mut self, height: u64, to: &str, body: &str) -> Inscribed {
        let (id, number) = self.store_content(height, body);
        let creation = self.movement(&id, height, "", to, false);
        let applied = self.engine.apply(&mut self.ledger, &creation);
        Inscribed {
            id,
            number,
            applied,
        }
    }

    /// Store a content without applying anything
    pub fn store_content(&mut self, height: u64, body: &str) -> (String, i64) {
        self.sequence += 1;
        let number = self.sequence as i64;
        let id = format!("{:064x}i0", self.sequence);
        self.ledger.put_content(InscriptionContent {
            inscription_id: id.clone(),
            inscription_number: number,
            content_type: "text/plain;charset=utf-8".to_string(),
            content_body: body.to_string(),
            genesis_height: height,
        });
        (id, number)
    }

    /// Apply a transfer of an existing inscription
    pub fn transfer(&mut self, height: u64, id: &str, from: &str, to: &str) -> Applied {
        let movement = self.movement(id, height, from, to, true);
        self.engine.apply(&mut self.ledger, &movement)
    }

    /// Build a movement with a fresh location
    pub fn movement(
        &mut self,
        id: &str,
        height: u64,
        from: &str,
        to: &str,
        is_transfer: bool,
    ) -> InscriptionTransfer {
        self.sequence += 1;
        let number = self
            .ledger
            .content(id)
            .map(|content| content.inscription_number)
            .unwrap_or(-1);
        InscriptionTransfer {
            inscription_id: id.to_string(),
            inscription_number: number,
            from_address: from.to_string(),
            to_address: to.to_string(),
            to_location: format!("{}:{}:0", id, self.sequence),
            block_height: height,
            block_time: height as i64 * 600,
            tx_id: format!("{:064x}", self.sequence),
            tx_index: self.sequence as u32,
            is_transfer,
        }
    }

    /// Deploy `tick` with extra payload fields; era A identity unless a
    /// pre era A height is given
    pub fn deploy(&mut self, height: u64, deployer: &str, tick: &str, extra: &str) -> Inscribed {
        let body = format!(r#"{{"p":"orc-20","tick":"{tick}","op":"deploy"{extra}}}"#);
        self.inscribe(height, deployer, &body)
    }

    pub fn mint(&mut self, height: u64, to: &str, deploy: &Inscribed, amt: &str) -> Inscribed {
        let body = body("mint", &self.tick(deploy), &deploy.target(), &format!(r#","amt":"{amt}""#));
        self.inscribe(height, to, &body)
    }

    pub fn send(&mut self, height: u64, from: &str, deploy: &Inscribed, extra: &str) -> Inscribed {
        let body = body("send", &self.tick(deploy), &deploy.target(), extra);
        self.inscribe(height, from, &body)
    }

    pub fn tick(&self, deploy: &Inscribed) -> String {
        self.metadata(&deploy.id).tick.clone()
    }

    pub fn event(&self, applied: &Applied) -> &LedgerEvent {
        match applied {
            Applied::Recorded { event_id, .. } => {
                self.ledger.event(event_id).expect("recorded event is stored")
            }
            Applied::Skipped(reason) => panic!("expected an event, transfer was skipped: {reason}"),
        }
    }

    pub fn balance(&self, inscription_id: &str) -> &Balance {
        self.ledger
            .balance_by_inscription(inscription_id)
            .expect("inscription carries a balance")
    }

    pub fn credit(&self, deploy: &Inscribed, address: &str) -> Option<BigDecimal> {
        self.ledger
            .balance(&BalanceKey::credit(deploy.id.clone(), address))
            .filter(|credit| credit.is_ok())
            .map(|credit| credit.amount.clone())
    }

    pub fn metadata(&self, tick_id: &str) -> &TickMetadata {
        self.ledger.metadata(tick_id).expect("tick is deployed")
    }
}
