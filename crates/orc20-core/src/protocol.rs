//! Protocol era rules
//!
//! The protocol changed its rules twice. Every transition is evaluated under
//! the rules in force at the block height of the event:
//!
//! - **Era A** (structural upgrade): deploy identity becomes the deploying
//!   inscription's own number instead of the payload `id` field.
//! - **Era B** (accounting overhaul): the multi-step send is replaced by a
//!   pooled credit balance held at a virtual ATM address.
//!
//! The two thresholds and the two fixed addresses are configurable. The live
//! protocol uses the same literal address for upgrade validation and for the
//! virtual ATM; they are kept as separate settings so the overlap can be
//! confirmed rather than assumed.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// First block height at which era A rules apply
pub const DEFAULT_ERA_A_HEIGHT: u64 = 788_836;

/// First block height at which era B rules apply
pub const DEFAULT_ERA_B_HEIGHT: u64 = 800_010;

/// Custodial address used by the live protocol for both upgrade validation
/// and the virtual ATM
pub const DEFAULT_CUSTODIAL_ADDRESS: &str =
    "bc1pgha2vs4m4d70aw82qzrhmg98yea4fuxtnf7lpguez3z9cjtukpssrhakhl";

/// Deploy default for the `ug` field
pub const DEPLOY_UPGRADEABLE_DEFAULT: bool = true;

/// Deploy default for the `wp` field
pub const DEPLOY_WRAPPED_DEFAULT: bool = false;

/// Deploy default for the `dec` field
pub const DEPLOY_DECIMALS_DEFAULT: u32 = 18;

/// Largest accepted decimal precision
pub const DECIMALS_MAX: u32 = 18;

/// Deploy default for the `lim` field
pub static DEPLOY_LIMIT_DEFAULT: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(1));

/// Largest accepted supply, `2^256 - 1`, which is also the deploy default for `max`
pub static MAX_SUPPLY: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::new(BigInt::from_bytes_be(Sign::Plus, &[0xff; 32]), 0));

/// Era thresholds and fixed addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolRules {
    /// First height governed by era A deploy identity rules
    pub era_a_height: u64,
    /// First height governed by era B credit accounting rules
    pub era_b_height: u64,
    /// Receiving address that finalizes an upgrade
    pub upgrade_validation_address: String,
    /// Receiving address that turns a transfer into a credit deposit
    pub virtual_atm_address: String,
}

impl Default for ProtocolRules {
    fn default() -> Self {
        Self {
            era_a_height: DEFAULT_ERA_A_HEIGHT,
            era_b_height: DEFAULT_ERA_B_HEIGHT,
            upgrade_validation_address: DEFAULT_CUSTODIAL_ADDRESS.to_string(),
            virtual_atm_address: DEFAULT_CUSTODIAL_ADDRESS.to_string(),
        }
    }
}

impl ProtocolRules {
    /// Whether `height` is still governed by pre era A rules
    pub fn before_era_a(&self, height: u64) -> bool {
        height < self.era_a_height
    }

    /// Whether `height` is still governed by pre era B rules
    pub fn before_era_b(&self, height: u64) -> bool {
        height < self.era_b_height
    }

    /// Whether `address` finalizes upgrades
    pub fn is_upgrade_validation_address(&self, address: &str) -> bool {
        self.upgrade_validation_address == address
    }

    /// Whether `address` is the virtual ATM
    pub fn is_virtual_atm_address(&self, address: &str) -> bool {
        self.virtual_atm_address == address
    }

    /// Whether both meta-operations share one address
    pub fn custodial_addresses_coincide(&self) -> bool {
        self.upgrade_validation_address == self.virtual_atm_address
    }
}
