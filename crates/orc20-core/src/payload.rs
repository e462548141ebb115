//! Inscription payload schemas
//!
//! Bodies are lower-cased before decoding: all protocol data is
//! case-insensitive. Decoding happens in two stages with distinct outcomes:
//!
//! - [`BasePayload::decode`] returns `None` for anything that is not a
//!   protocol payload at all. Such inscriptions leave no trace in the ledger.
//! - The per-operation `decode` functions return `Err(PayloadError)` for a
//!   protocol payload that breaks its operation schema. Callers record these
//!   as failed events whenever a tick is known.

use crate::json;
use crate::number::{parse_decimal, parse_int, parse_long, NumberError};
use crate::protocol::{
    DECIMALS_MAX, DEPLOY_DECIMALS_DEFAULT, DEPLOY_LIMIT_DEFAULT, DEPLOY_UPGRADEABLE_DEFAULT,
    DEPLOY_WRAPPED_DEFAULT, MAX_SUPPLY,
};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use std::fmt;

/// Accepted spellings of the protocol namespace (`p` field)
pub const PROTOCOL_NAMES: [&str; 2] = ["orc20", "orc-20"];

/// Schema violations of a protocol payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Body is not decodable JSON or a field has the wrong JSON type
    #[error("undecodable payload: {0}")]
    Json(String),
    /// A required field is absent
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A numeric field failed strict parsing
    #[error("invalid number in `{field}`: {source}")]
    InvalidNumber {
        /// Offending field
        field: &'static str,
        /// Parse failure
        source: NumberError,
    },
    /// A numeric field parsed but lies outside its allowed range
    #[error("`{field}` out of range: {reason}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Description of the violated bound
        reason: String,
    },
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Declared operation of a payload (`op` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Create a tick
    Deploy,
    /// Mint into the inscriber's address
    Mint,
    /// Send (`send`, or its synonym `transfer`)
    Send,
    /// Cancel pending sends by nonce
    Cancel,
    /// Change tick parameters
    Upgrade,
    /// Marketplace listing, recognized but unsupported
    List,
}

impl Operation {
    /// Map a lower-cased `op` value to an operation
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "deploy" => Some(Self::Deploy),
            "mint" => Some(Self::Mint),
            "send" | "transfer" => Some(Self::Send),
            "cancel" => Some(Self::Cancel),
            "upgrade" => Some(Self::Upgrade),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deploy => "deploy",
            Self::Mint => "mint",
            Self::Send => "send",
            Self::Cancel => "cancel",
            Self::Upgrade => "upgrade",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Fields every protocol payload carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePayload {
    /// Tick symbol
    pub tick: String,
    /// Declared operation
    pub op: Operation,
    /// Deploy identity or target identity, when present
    pub id: Option<String>,
}

impl BasePayload {
    /// Decode the common fields; `None` when `body` is not a protocol payload
    pub fn decode(body: &str) -> Option<Self> {
        let raw: RawBase = json::decode(&body.to_lowercase()).ok()?;
        let namespace = raw.p?;
        if !PROTOCOL_NAMES.contains(&namespace.as_str()) {
            return None;
        }
        let tick = raw.tick.filter(|tick| !tick.is_empty())?;
        let op = Operation::parse(raw.op?.as_str())?;
        Some(Self {
            tick,
            op,
            id: raw.id,
        })
    }
}

/// `deploy` payload with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct DeployPayload {
    /// Tick symbol
    pub tick: String,
    /// Deploy identity, only meaningful before era A
    pub id: Option<String>,
    /// Maximum supply
    pub max: BigDecimal,
    /// Per-mint limit
    pub lim: BigDecimal,
    /// Decimal precision
    pub dec: u32,
    /// Whether the tick may later be upgraded
    pub ug: bool,
    /// Wrapped flag
    pub wp: bool,
}

impl DeployPayload {
    /// Decode and validate a deploy body
    pub fn decode(body: &str) -> Result<Self, PayloadError> {
        let raw: RawDeploy = json::decode(&body.to_lowercase())?;
        let tick = required_tick(raw.tick)?;
        let max = optional_decimal(raw.max, "max")?.unwrap_or_else(|| MAX_SUPPLY.clone());
        if max > *MAX_SUPPLY {
            return Err(PayloadError::OutOfRange {
                field: "max",
                reason: "exceeds 2^256 - 1".to_string(),
            });
        }
        let lim = optional_decimal(raw.lim, "lim")?.unwrap_or_else(|| DEPLOY_LIMIT_DEFAULT.clone());
        let dec = optional_decimals(raw.dec)?.unwrap_or(DEPLOY_DECIMALS_DEFAULT);
        Ok(Self {
            tick,
            id: raw.id,
            max,
            lim,
            dec,
            ug: raw.ug.unwrap_or(DEPLOY_UPGRADEABLE_DEFAULT),
            wp: raw.wp.unwrap_or(DEPLOY_WRAPPED_DEFAULT),
        })
    }
}

/// `mint` payload
#[derive(Debug, Clone, PartialEq)]
pub struct MintPayload {
    /// Tick symbol
    pub tick: String,
    /// Target deploy identity
    pub id: String,
    /// Amount to mint, non-negative
    pub amt: BigDecimal,
}

impl MintPayload {
    /// Decode and validate a mint body
    pub fn decode(body: &str) -> Result<Self, PayloadError> {
        let raw: RawTransfer = json::decode(&body.to_lowercase())?;
        let amt = optional_decimal(raw.amt, "amt")?.ok_or(PayloadError::MissingField("amt"))?;
        Ok(Self {
            tick: required_tick(raw.tick)?,
            id: raw.id.ok_or(PayloadError::MissingField("id"))?,
            amt: non_negative(amt, "amt")?,
        })
    }
}

/// `send` / `transfer` payload
#[derive(Debug, Clone, PartialEq)]
pub struct SendPayload {
    /// Tick symbol
    pub tick: String,
    /// Target deploy identity
    pub id: String,
    /// Amount; absent on a closing remaining-balance inscription
    pub amt: Option<BigDecimal>,
    /// Nonce, required by the multi-step send before era B
    pub n: Option<i64>,
}

impl SendPayload {
    /// Decode and validate a send body
    pub fn decode(body: &str) -> Result<Self, PayloadError> {
        let raw: RawTransfer = json::decode(&body.to_lowercase())?;
        let amt = optional_decimal(raw.amt, "amt")?
            .map(|amt| non_negative(amt, "amt"))
            .transpose()?;
        let n = raw
            .n
            .map(|n| parse_long(&n).map_err(|source| PayloadError::InvalidNumber { field: "n", source }))
            .transpose()?;
        Ok(Self {
            tick: required_tick(raw.tick)?,
            id: raw.id.ok_or(PayloadError::MissingField("id"))?,
            amt,
            n,
        })
    }
}

/// `cancel` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelPayload {
    /// Tick symbol
    pub tick: String,
    /// Target deploy identity
    pub id: String,
    /// Nonces to cancel, de-duplicated in first-seen order, never empty
    pub nonces: Vec<i64>,
}

impl CancelPayload {
    /// Decode and validate a cancel body
    pub fn decode(body: &str) -> Result<Self, PayloadError> {
        let raw: RawCancel = json::decode(&body.to_lowercase())?;
        let listed = raw.n.ok_or(PayloadError::MissingField("n"))?;
        let mut nonces = Vec::with_capacity(listed.len());
        for text in &listed {
            let nonce = parse_long(text)
                .map_err(|source| PayloadError::InvalidNumber { field: "n", source })?;
            if !nonces.contains(&nonce) {
                nonces.push(nonce);
            }
        }
        if nonces.is_empty() {
            return Err(PayloadError::OutOfRange {
                field: "n",
                reason: "empty nonce list".to_string(),
            });
        }
        Ok(Self {
            tick: required_tick(raw.tick)?,
            id: raw.id.ok_or(PayloadError::MissingField("id"))?,
            nonces,
        })
    }
}

/// `upgrade` payload; absent fields leave the tick unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradePayload {
    /// Tick symbol
    pub tick: String,
    /// Target deploy identity
    pub id: String,
    /// New maximum supply
    pub max: Option<BigDecimal>,
    /// New per-mint limit
    pub lim: Option<BigDecimal>,
    /// New decimal precision
    pub dec: Option<u32>,
    /// New upgradeable flag
    pub ug: Option<bool>,
}

impl UpgradePayload {
    /// Decode and validate an upgrade body
    pub fn decode(body: &str) -> Result<Self, PayloadError> {
        let raw: RawUpgrade = json::decode(&body.to_lowercase())?;
        Ok(Self {
            tick: required_tick(raw.tick)?,
            id: raw.id.ok_or(PayloadError::MissingField("id"))?,
            max: optional_decimal(raw.max, "max")?,
            lim: optional_decimal(raw.lim, "lim")?,
            dec: optional_decimals(raw.dec)?,
            ug: raw.ug,
        })
    }
}

fn required_tick(tick: Option<String>) -> Result<String, PayloadError> {
    tick.filter(|tick| !tick.is_empty())
        .ok_or(PayloadError::MissingField("tick"))
}

fn optional_decimal(
    text: Option<String>,
    field: &'static str,
) -> Result<Option<BigDecimal>, PayloadError> {
    text.map(|text| parse_decimal(&text).map_err(|source| PayloadError::InvalidNumber { field, source }))
        .transpose()
}

fn optional_decimals(text: Option<String>) -> Result<Option<u32>, PayloadError> {
    let Some(text) = text else {
        return Ok(None);
    };
    let dec = parse_int(&text).map_err(|source| PayloadError::InvalidNumber {
        field: "dec",
        source,
    })?;
    u32::try_from(dec)
        .ok()
        .filter(|dec| *dec <= DECIMALS_MAX)
        .map(Some)
        .ok_or_else(|| PayloadError::OutOfRange {
            field: "dec",
            reason: format!("{dec} not within 0..={DECIMALS_MAX}"),
        })
}

fn non_negative(value: BigDecimal, field: &'static str) -> Result<BigDecimal, PayloadError> {
    if value < BigDecimal::zero() {
        return Err(PayloadError::OutOfRange {
            field,
            reason: "negative".to_string(),
        });
    }
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBase {
    #[serde(deserialize_with = "lenient::text")]
    p: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    tick: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    op: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeploy {
    #[serde(deserialize_with = "lenient::text")]
    tick: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    max: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    lim: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    dec: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    ug: Option<bool>,
    #[serde(deserialize_with = "lenient::flag")]
    wp: Option<bool>,
}

/// Shared by mint and send
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTransfer {
    #[serde(deserialize_with = "lenient::text")]
    tick: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    amt: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    n: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCancel {
    #[serde(deserialize_with = "lenient::text")]
    tick: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    n: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUpgrade {
    #[serde(deserialize_with = "lenient::text")]
    tick: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    max: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    lim: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    dec: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    ug: Option<bool>,
}

/// Scalar coercions: numbers and booleans are accepted where text is expected
mod lenient {
    use serde::de::{Deserialize, Deserializer, Error};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Result<Option<String>, String> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            Value::Number(number) => Ok(Some(number.to_string())),
            Value::Bool(flag) => Ok(Some(flag.to_string())),
            other => Err(format!("expected a scalar, found {other}")),
        }
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        scalar_text(Value::deserialize(d)?).map_err(D::Error::custom)
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Bool(flag) => Ok(Some(flag)),
            Value::String(text) if text == "true" => Ok(Some(true)),
            Value::String(text) if text == "false" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
        }
    }

    /// A JSON array of scalars, or a string holding one
    pub(super) fn text_list<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        let items = match Value::deserialize(d)? {
            Value::Null => return Ok(None),
            Value::Array(items) => items,
            Value::String(text) => match crate::json::parse_value(&text).map_err(D::Error::custom)? {
                Value::Array(items) => items,
                other => return Err(D::Error::custom(format!("expected a list, found {other}"))),
            },
            other => return Err(D::Error::custom(format!("expected a list, found {other}"))),
        };
        let mut texts = Vec::with_capacity(items.len());
        for item in items {
            match scalar_text(item).map_err(D::Error::custom)? {
                Some(text) => texts.push(text),
                None => return Err(D::Error::custom("null nonce")),
            }
        }
        Ok(Some(texts))
    }
}
