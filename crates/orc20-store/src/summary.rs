//! Balance summary: OK holdings per address and tick, split into inscription
//! backed "cash" and pooled credit.

use crate::LedgerStore;
use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;
use std::collections::BTreeMap;

/// Holdings of one address in one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    /// Holder address
    pub address: String,
    /// Tick symbol
    pub tick: String,
    /// Inscription number of the tick's deploy
    pub deploy_inscription_number: i64,
    /// Sum of OK balances backed by inscriptions
    pub cash: BigDecimal,
    /// Sum of OK credit balances
    pub credit: BigDecimal,
}

impl LedgerStore {
    /// Summarize OK balances by (address, tick, deploy inscription number)
    pub fn summarize_balances(&self) -> Vec<BalanceSummary> {
        let mut totals: BTreeMap<(String, String, i64), (BigDecimal, BigDecimal)> =
            BTreeMap::new();
        for balance in self.balances().filter(|balance| balance.is_ok()) {
            let Some(metadata) = self.metadata(&balance.tick_id) else {
                tracing::warn!(tick_id = %balance.tick_id, "balance without tick metadata");
                continue;
            };
            let (cash, credit) = totals
                .entry((
                    balance.address.clone(),
                    balance.tick.clone(),
                    metadata.inscription_number,
                ))
                .or_insert_with(|| (BigDecimal::zero(), BigDecimal::zero()));
            if balance.is_credit() {
                *credit += &balance.amount;
            } else {
                *cash += &balance.amount;
            }
        }
        totals
            .into_iter()
            .map(
                |((address, tick, deploy_inscription_number), (cash, credit))| BalanceSummary {
                    address,
                    tick,
                    deploy_inscription_number,
                    cash,
                    credit,
                },
            )
            .collect()
    }
}
