// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! awakenscan CLI: export one wallet's history as an Awaken CSV.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use awakenscan::{
    AdapterRegistry, Credentials, ExporterConfig, ExporterConfigBuilder, FetchOptions,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "awakenscan")]
#[command(version, about = "Export wallet transaction history as Awaken tax CSV")]
#[command(after_help = r#"EXAMPLES:
    # Full Kaspa history to a file
    awakenscan export --chain kaspa --address kaspa:qq... -o kaspa.csv

    # Ethereum activity during 2024
    awakenscan export --chain ethereum --address 0x... --from 2024-01-01 --to 2024-12-31

    # Hyperliquid perpetuals
    awakenscan export --chain hyperliquid --address 0x... --perps

ENVIRONMENT VARIABLES:
    ETHERSCAN_API_KEY    Required for ethereum and base
    SUBSCAN_API_KEY      Required for polkadot
    RUST_LOG             Overrides the log filter
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, classify and export one address
    Export(ExportArgs),
    /// List supported chains
    Chains,
}

#[derive(Args)]
struct ExportArgs {
    /// Chain id (see `awakenscan chains`)
    #[arg(long)]
    chain: String,

    /// Wallet address
    #[arg(long)]
    address: String,

    /// First day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD, UTC, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Export perpetuals activity instead of the standard layout
    #[arg(long)]
    perps: bool,

    /// Stop after this many raw records
    #[arg(long)]
    limit: Option<usize>,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    fn fetch_options(&self) -> anyhow::Result<FetchOptions> {
        let mut options = FetchOptions::default();
        if let Some(from) = self.from {
            options = options.from_date(day_start(from)?);
        }
        if let Some(to) = self.to {
            options = options.to_date(day_end(to)?);
        }
        if let Some(limit) = self.limit {
            options = options.limit(limit);
        }
        Ok(options)
    }
}

fn day_start(day: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .ok_or_else(|| anyhow!("invalid start date {day}"))
}

fn day_end(day: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    day.and_hms_opt(23, 59, 59)
        .map(|t| t.and_utc())
        .ok_or_else(|| anyhow!("invalid end date {day}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config: ExporterConfig = ExporterConfigBuilder::with_defaults()
        .credentials(Credentials::from_env())
        .build();
    let registry = AdapterRegistry::from_config(&config).context("failed to set up adapters")?;

    match cli.command {
        Commands::Chains => {
            for chain in registry.list() {
                println!(
                    "{:<12} {:<12} {:<6} {}{}",
                    chain.chain_id,
                    chain.chain_name,
                    chain.ticker,
                    if chain.enabled { "enabled" } else { "disabled" },
                    if chain.perps_capable { ", perps" } else { "" },
                );
            }
            Ok(())
        }
        Commands::Export(args) => run_export(&registry, args).await,
    }
}

async fn run_export(registry: &AdapterRegistry, args: ExportArgs) -> anyhow::Result<()> {
    let adapter = registry
        .get(&args.chain)
        .ok_or_else(|| anyhow!("unsupported chain: {}", args.chain))?;
    let info = adapter.info();
    if !info.enabled {
        bail!("{} is disabled in this configuration", info.chain_name);
    }
    let options = args.fetch_options()?;

    let csv = if args.perps {
        let records = adapter
            .fetch_perp_transactions(&args.address, &options)
            .await?;
        info!(records = records.len(), chain = info.chain_id, "Fetched perpetuals");
        adapter.to_awaken_perps_csv(&records)
    } else {
        let outcome = adapter.fetch_transactions(&args.address, &options).await?;
        if outcome.is_partial() {
            warn!(
                completion = ?outcome.completion,
                next_cursor = ?outcome.next_cursor,
                "Export stopped before the full history"
            );
        }
        info!(
            transactions = outcome.transactions.len(),
            chain = info.chain_id,
            "Fetched transactions"
        );
        adapter.to_awaken_csv(&outcome.transactions)
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => write_csv(&mut std::io::stdout().lock(), &csv)?,
    }
    Ok(())
}

/// Write the CSV exactly as rendered, so stdout matches the `-o` file byte for byte.
fn write_csv(out: &mut impl Write, csv: &str) -> anyhow::Result<()> {
    out.write_all(csv.as_bytes())
        .and_then(|()| out.flush())
        .context("failed to write CSV to stdout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_csv_adds_no_trailing_newline() {
        let csv = "Date,Received Quantity\n03/01/2024 12:00:00,1\n";
        let mut out = Vec::new();
        write_csv(&mut out, csv).unwrap();
        assert_eq!(out, csv.as_bytes());
    }
}
