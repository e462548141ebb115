//! Indexer configuration
//!
//! Layering order: defaults, then an optional file (`.toml` or `.json`), then
//! `ORC20_*` environment variables. [`IndexerConfig::validate`] runs last.

use crate::protocol::ProtocolRules;
use crate::{Orc20Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ORC20_";

/// Complete configuration of an indexer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Era thresholds and fixed addresses
    pub protocol: ProtocolRules,
    /// Default tracing filter, e.g. `info` or `orc20_engine=debug`
    pub log_level: Option<String>,
}

impl IndexerConfig {
    /// Load configuration from a file, choosing the format by extension
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Orc20Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Orc20Error::config(format!("Invalid JSON config: {}", e))),
            other => Err(Orc20Error::config(format!(
                "Unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Merge `ORC20_*` variables from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge `ORC20_*` variables from `vars`; other variables are ignored
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            if let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) {
                self.set_from_string(&name.to_lowercase(), value.as_ref())?;
            }
        }
        Ok(())
    }

    /// Set a single setting by its lower-case name
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "era_a_height" => self.protocol.era_a_height = parse_height(key, value)?,
            "era_b_height" => self.protocol.era_b_height = parse_height(key, value)?,
            "upgrade_validation_address" => {
                self.protocol.upgrade_validation_address = value.trim().to_string()
            }
            "virtual_atm_address" => self.protocol.virtual_atm_address = value.trim().to_string(),
            "log_level" => self.log_level = Some(value.trim().to_string()),
            _ => {
                tracing::debug!(key, "ignoring unknown configuration key");
            }
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let rules = &self.protocol;
        if rules.upgrade_validation_address.is_empty() {
            return Err(Orc20Error::config(
                "upgrade_validation_address must not be empty",
            ));
        }
        if rules.virtual_atm_address.is_empty() {
            return Err(Orc20Error::config("virtual_atm_address must not be empty"));
        }
        if rules.era_a_height > rules.era_b_height {
            return Err(Orc20Error::config(format!(
                "era_a_height {} must not exceed era_b_height {}",
                rules.era_a_height, rules.era_b_height
            )));
        }
        if !rules.custodial_addresses_coincide() {
            tracing::info!(
                upgrade_validation = %rules.upgrade_validation_address,
                virtual_atm = %rules.virtual_atm_address,
                "custodial addresses differ from the live protocol, where they coincide"
            );
        }
        Ok(())
    }
}

fn parse_height(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| Orc20Error::config(format!("{key}: invalid height {value:?}: {e}")))
}
