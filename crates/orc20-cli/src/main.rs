//! `orc20-indexer`: replay ORC-20 inscription transfers and dump the ledger

use anyhow::Context;
use clap::Parser;
use orc20_cli::{load_inputs, Report, ReportFormat};
use orc20_core::IndexerConfig;
use orc20_engine::LedgerEngine;
use orc20_store::LedgerStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orc20-indexer")]
#[command(about = "Replay ORC-20 inscription transfers into balances, ticks and events", long_about = None)]
struct Cli {
    /// Inscription contents, one JSON object per line
    #[arg(long)]
    content: PathBuf,

    /// Inscription transfers, one JSON object per line
    #[arg(long)]
    transfer: PathBuf,

    /// Config file (.toml or .json); defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.log_level.as_deref());
    config.validate().context("invalid configuration")?;
    tracing::info!(
        era_a_height = config.protocol.era_a_height,
        era_b_height = config.protocol.era_b_height,
        "configuration loaded"
    );

    let mut ledger = LedgerStore::new();
    load_inputs(&mut ledger, &cli.content, &cli.transfer).with_context(|| {
        format!(
            "failed to load {} and {}",
            cli.content.display(),
            cli.transfer.display()
        )
    })?;

    let engine = LedgerEngine::new(config.protocol);
    let stats = engine.replay(&mut ledger);
    for (reason, count) in &stats.skipped {
        tracing::info!(%reason, count, "transfers skipped");
    }

    let report = Report::collect(&ledger)
        .render(cli.format)
        .context("failed to render report")?;
    print!("{report}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<IndexerConfig> {
    let mut config = match path {
        Some(path) => IndexerConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => IndexerConfig::default(),
    };
    config
        .merge_with_env()
        .context("invalid ORC20_* environment override")?;
    Ok(config)
}

fn init_tracing(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
