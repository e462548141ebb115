//! Ledger records
//!
//! Inputs ([`InscriptionContent`], [`InscriptionTransfer`]) are produced by a
//! loader and never mutated by the engine, apart from the genesis height
//! backfill. Derived records ([`TickMetadata`], [`Balance`], [`LedgerEvent`])
//! are owned by the ledger store and addressed by stable string keys.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a tick: the deploying inscription's identifier
pub type TickId = String;

/// Inscription identifier
pub type InscriptionId = String;

/// Holder address
pub type Address = String;

/// Event key: the transfer's unique to-location token
pub type EventId = String;

/// Inscription creation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionContent {
    /// Inscription identifier
    pub inscription_id: InscriptionId,
    /// Creation sequence number
    pub inscription_number: i64,
    /// MIME type of the body
    #[serde(default)]
    pub content_type: String,
    /// Raw payload body
    #[serde(default)]
    pub content_body: String,
    /// Height of the creation event, backfilled at load time
    #[serde(default, rename = "genesisBlockHeight")]
    pub genesis_height: u64,
}

/// One movement of an inscription, either its creation or a later transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionTransfer {
    /// Inscription identifier
    pub inscription_id: InscriptionId,
    /// Creation sequence number
    pub inscription_number: i64,
    /// Sending address, empty on creation
    #[serde(default)]
    pub from_address: Address,
    /// Receiving address
    pub to_address: Address,
    /// Unique location token, used as the event key
    pub to_location: EventId,
    /// Block height
    pub block_height: u64,
    /// Block time
    #[serde(default)]
    pub block_time: i64,
    /// Transaction id
    #[serde(default)]
    pub tx_id: String,
    /// Position of the transaction in its block
    #[serde(default)]
    pub tx_index: u32,
    /// `false` for the creation movement
    #[serde(alias = "transfer")]
    pub is_transfer: bool,
}

/// Deploy record of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMetadata {
    /// Key, equal to `inscription_id`
    pub tick_id: TickId,
    /// Tick symbol, lower-cased
    pub tick: String,
    /// Era-dependent deploy identity
    pub deploy_id: Option<String>,
    /// Deploy inscription identifier
    pub inscription_id: InscriptionId,
    /// Deploy inscription number
    pub inscription_number: i64,
    /// Current holder of the deploy inscription
    pub deployer: Address,
    /// Block time of the deploy
    pub deploy_time: i64,
    /// Maximum supply
    pub max: BigDecimal,
    /// Amount minted so far
    pub minted: BigDecimal,
    /// Per-mint limit
    pub limit: BigDecimal,
    /// Decimal precision, `0..=18`
    pub decimals: u32,
    /// Block time of the last successful mint
    pub last_mint_time: Option<i64>,
    /// Whether upgrades are permitted
    pub upgradeable: bool,
    /// Payload body of the deploy or of the last applied upgrade
    pub content: String,
    /// Block time of the last applied upgrade
    pub upgrade_time: Option<i64>,
    /// Wrapped flag, carried through untouched
    pub wrapped: bool,
}

/// Primary key of a balance record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    /// Tick key
    pub tick_id: TickId,
    /// Owning inscription, empty for credit balances
    pub inscription_id: InscriptionId,
    /// Holder address
    pub address: Address,
}

impl BalanceKey {
    /// Key of the pooled credit balance of `address`
    pub fn credit(tick_id: impl Into<TickId>, address: impl Into<Address>) -> Self {
        Self {
            tick_id: tick_id.into(),
            inscription_id: InscriptionId::new(),
            address: address.into(),
        }
    }
}

impl fmt::Display for BalanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tick_id, self.inscription_id, self.address)
    }
}

/// Balance lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceStatus {
    /// Spendable
    Ok,
    /// Reserved by an unfinished multi-step send
    SendPending,
    /// Failed validation
    Invalid,
    /// Pending send withdrawn by its creator
    Canceled,
    /// Superseded
    Expired,
}

/// Operation tag shared by balances and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpTag {
    /// Deploy
    Deploy,
    /// Mint
    Mint,
    /// Send with an amount
    Send,
    /// Closing send of a batch
    RemainingBalance,
    /// Remaining balance frozen after leaving for a non-custodial address
    ShadowRemainingBalance,
    /// Cancel
    Cancel,
    /// Upgrade
    Upgrade,
    /// Pooled credit
    Credit,
}

/// Kind of transition recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Creation of a mint
    InscribeMint,
    /// Creation of a pending send
    InscribeSend,
    /// Creation of a batch-closing remaining balance
    InscribeRemainingBalance,
    /// Creation of a cancel
    InscribeCancel,
    /// Creation of an upgrade (handshake phase 1)
    InscribeUpgrade,
    /// Creation of a deploy
    InscribeDeploy,
    /// Era B send creation, debiting credit
    Withdraw,
    /// Transfer of a deploy inscription
    TransferDeploy,
    /// Transfer of a mint inscription
    TransferMint,
    /// Transfer of a send inscription
    TransferSend,
    /// Transfer of an upgrade inscription (handshake phase 2)
    TransferUpgrade,
    /// Era B transfer to the virtual ATM
    Deposit,
}

/// Event outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Applied
    Success,
    /// Rejected; see the error code
    Failed,
    /// Pending send awaiting its batch close
    SendPending,
    /// Pending send withdrawn
    Canceled,
    /// Upgrade held by the deployer, ready to finalize
    UpgradeWaiting,
    /// Upgrade held away from the deployer
    UpgradeBlocked,
}

/// Reason code of a failed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Tick and deploy identity already taken
    Redeployment,
    /// Mint would exceed the maximum supply
    ExceedingSupply,
    /// Mint exceeds the per-mint limit
    ExceedingLimit,
    /// Payload breaks its operation schema
    InvalidInscription,
    /// Transferred inscription carries no usable balance
    IneffectiveInscription,
    /// Nonce already used by a pending send
    DuplicatedNonce,
    /// Upgrade finalized by someone other than the deployer
    NoUpgradePermission,
    /// Holdings do not cover the amount
    InsufficientBalance,
    /// Batch close without any pending send
    MissingInscribeSend,
    /// Tick does not accept upgrades
    NonUpgradeable,
    /// Upgrade inscription already finalized or sent to the wrong address
    InvalidUpgradeInscription,
    /// Remaining balance moved to a non-custodial address after era B
    RemainingBalanceLocked,
}

impl ErrorCode {
    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redeployment => "REDEPLOYMENT",
            Self::ExceedingSupply => "EXCEEDING_SUPPLY",
            Self::ExceedingLimit => "EXCEEDING_LIMIT",
            Self::InvalidInscription => "INVALID_INSCRIPTION",
            Self::IneffectiveInscription => "INEFFECTIVE_INSCRIPTION",
            Self::DuplicatedNonce => "DUPLICATED_NONCE",
            Self::NoUpgradePermission => "NO_UPGRADE_PERMISSION",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::MissingInscribeSend => "MISSING_INSCRIBE_SEND",
            Self::NonUpgradeable => "NON_UPGRADEABLE",
            Self::InvalidUpgradeInscription => "INVALID_UPGRADE_INSCRIPTION",
            Self::RemainingBalanceLocked => "REMAINING_BALANCE_LOCKED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount held by one inscription (or one pooled credit) at one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Tick key
    pub tick_id: TickId,
    /// Tick symbol
    pub tick: String,
    /// Owning inscription, empty for credit balances
    pub inscription_id: InscriptionId,
    /// Holder address
    pub address: Address,
    /// Held amount
    pub amount: BigDecimal,
    /// Sender that opened a pending send
    pub creator: Option<Address>,
    /// Send nonce
    pub nonce: Option<i64>,
    /// Lifecycle status
    pub status: BalanceStatus,
    /// Operation that produced the balance
    pub op: OpTag,
}

impl Balance {
    /// Primary key of this record
    pub fn key(&self) -> BalanceKey {
        BalanceKey {
            tick_id: self.tick_id.clone(),
            inscription_id: self.inscription_id.clone(),
            address: self.address.clone(),
        }
    }

    /// Whether this is a pooled credit balance
    pub fn is_credit(&self) -> bool {
        self.op == OpTag::Credit
    }

    /// Whether this balance is spendable
    pub fn is_ok(&self) -> bool {
        self.status == BalanceStatus::Ok
    }
}

/// Audit record of one processed transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Key, the transfer's to-location
    pub event_id: EventId,
    /// Tick key
    pub tick_id: TickId,
    /// Tick symbol
    pub tick: String,
    /// Moved inscription
    pub inscription_id: InscriptionId,
    /// Moved inscription number
    pub inscription_number: i64,
    /// Sending address
    pub from_address: Address,
    /// Receiving address
    pub to_address: Address,
    /// Kind of transition
    pub event_type: EventType,
    /// Operation tag
    pub op: OpTag,
    /// Send nonce
    pub nonce: Option<i64>,
    /// Sender that opened a pending send
    pub creator: Option<Address>,
    /// Outcome
    pub status: EventStatus,
    /// Reason for a failure
    pub error_code: Option<ErrorCode>,
    /// Amount moved, when the transition carries one
    pub amount: Option<BigDecimal>,
    /// Payload body of the inscription
    pub payload: String,
    /// Transaction id
    pub tx_id: String,
    /// Position of the transaction in its block
    pub tx_index: u32,
    /// Block time
    pub block_time: i64,
    /// Block height
    pub block_height: u64,
}

impl LedgerEvent {
    /// Mark as applied
    pub fn succeed(&mut self) {
        self.status = EventStatus::Success;
        self.error_code = None;
    }

    /// Mark as rejected with `code`
    pub fn fail(&mut self, code: ErrorCode) {
        self.status = EventStatus::Failed;
        self.error_code = Some(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_decodes_camel_case_and_alias() {
        let line = r#"{"inscriptionId":"i0","inscriptionNumber":5,"fromAddress":"a","toAddress":"b","toLocation":"loc","blockHeight":10,"blockTime":99,"txId":"t","txIndex":2,"transfer":true}"#;
        let transfer: InscriptionTransfer = serde_json::from_str(line).unwrap();
        assert!(transfer.is_transfer);
        assert_eq!(transfer.to_location, "loc");
        assert_eq!(transfer.tx_index, 2);
    }

    #[test]
    fn content_genesis_height_defaults_to_zero() {
        let line = r#"{"inscriptionId":"i0","inscriptionNumber":5,"contentType":"text/plain","contentBody":"{}"}"#;
        let content: InscriptionContent = serde_json::from_str(line).unwrap();
        assert_eq!(content.genesis_height, 0);
    }

    #[test]
    fn tags_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&OpTag::ShadowRemainingBalance).unwrap(),
            "\"SHADOW_REMAINING_BALANCE\""
        );
        assert_eq!(
            serde_json::to_string(&EventStatus::UpgradeBlocked).unwrap(),
            "\"UPGRADE_BLOCKED\""
        );
        assert_eq!(ErrorCode::DuplicatedNonce.to_string(), "DUPLICATED_NONCE");
        assert_eq!(
            serde_json::to_string(&ErrorCode::RemainingBalanceLocked).unwrap(),
            format!("\"{}\"", ErrorCode::RemainingBalanceLocked)
        );
    }

    #[test]
    fn credit_key_has_no_inscription() {
        let key = BalanceKey::credit("tick0", "addr");
        assert!(key.inscription_id.is_empty());
        assert_eq!(key.to_string(), "tick0//addr");
    }
}
