//! Ledger dumps after a replay
//!
//! The text format prints one banner per section followed by one record per
//! line; the JSON format prints a single document with the same sections.

use orc20_core::{Balance, LedgerEvent, Result, TickMetadata};
use orc20_store::{BalanceSummary, LedgerStore};
use serde::Serialize;

/// Output format of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Banner-separated sections, one record per line
    #[default]
    Text,
    /// One JSON document
    Json,
}

/// Read-only view of the ledger after a replay
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// OK holdings per (address, tick), split into cash and credit
    pub balance_summary: Vec<BalanceSummary>,
    /// OK balances by (address, tick key)
    pub balances: Vec<&'a Balance>,
    /// Tick metadata by deploy time
    pub metadata: Vec<&'a TickMetadata>,
    /// Events by (tick key, height, tx index)
    pub events: Vec<&'a LedgerEvent>,
    /// Balances frozen when era B began
    pub snapshot: Vec<&'a Balance>,
}

impl<'a> Report<'a> {
    /// Collect every section from `ledger`
    pub fn collect(ledger: &'a LedgerStore) -> Self {
        Self {
            balance_summary: ledger.summarize_balances(),
            balances: ledger.ok_balances(),
            metadata: ledger.metadata_records(),
            events: ledger.events(),
            snapshot: ledger.balance_snapshot(),
        }
    }

    /// Render in `format`
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn render_text(&self) -> Result<String> {
        let mut out = String::new();

        out.push_str(&banner("balance summary"));
        out.push_str(&format!(
            "{:<64}\t{:<18}\t{:<18}\t{:<18}\t{:<18}\n",
            "Address", "Tick", "Inscription Number", "Cash Balance", "Credit Balance"
        ));
        for row in &self.balance_summary {
            out.push_str(&format!(
                "{:<64}\t{:<18}\t{:<18}\t{:<18}\t{:<18}\n",
                row.address,
                row.tick,
                row.deploy_inscription_number,
                row.cash.to_string(),
                row.credit.to_string()
            ));
        }

        write_records(&mut out, "balance dump", &self.balances)?;
        write_records(&mut out, "metadata dump", &self.metadata)?;
        write_records(&mut out, "event dump", &self.events)?;
        write_records(&mut out, "era B snapshot dump", &self.snapshot)?;
        Ok(out)
    }
}

fn banner(title: &str) -> String {
    format!("################ {title} ################\n")
}

fn write_records<T: Serialize>(out: &mut String, title: &str, records: &[T]) -> Result<()> {
    out.push_str(&banner(title));
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(())
}
