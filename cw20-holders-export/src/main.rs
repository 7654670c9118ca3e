//! CW20 holder snapshot CLI.
//!
//! Enumerates every account of a CW20 token contract through a chain's
//! REST endpoint, looks up each account's bank balance of one denom, and
//! writes the pairs to a JSON file.
//!
//! # Usage
//!
//! ```bash
//! # Snapshot with the defaults (or whatever holders.toml says)
//! cw20-holders export
//!
//! # Another contract and denom, four balance lookups in flight
//! cw20-holders export --contract unicorn1... --denom uwunicorn --concurrency 4
//!
//! # Only check that the node answers
//! cw20-holders status --rest https://rest.unicorn.meme
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cw20_holders::{LcdClient, QueryEncoding, check_connection};
use cw20_holders_export::config::{Config, DEFAULT_CONFIG_PATH, Settings};
use cw20_holders_export::snapshot;

/// CW20 token holder snapshots.
#[derive(Debug, Parser)]
#[command(name = "cw20-holders", version, about)]
struct Cli {
    /// TOML config file. Missing file means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Enumerate holders and write them to a JSON file.
    Export {
        /// REST (LCD) endpoint of the chain.
        #[arg(long)]
        rest: Option<String>,

        /// CW20 contract address.
        #[arg(long)]
        contract: Option<String>,

        /// Bank denom whose balance is recorded.
        #[arg(long)]
        denom: Option<String>,

        /// Output file.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Accounts requested per page.
        #[arg(long)]
        page_limit: Option<u32>,

        /// Balance lookups in flight at once.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Smart-query encoding in the request path: `base64` or `raw`.
        #[arg(long)]
        query_encoding: Option<QueryEncoding>,
    },

    /// Check that the REST endpoint answers and show the latest block.
    Status {
        /// REST (LCD) endpoint of the chain.
        #[arg(long)]
        rest: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let file = Config::load(&cli.config)?;

    match cli.command {
        Command::Export {
            rest,
            contract,
            denom,
            output,
            page_limit,
            concurrency,
            timeout_secs,
            query_encoding,
        } => {
            let flags = Config {
                rest,
                contract,
                denom,
                output,
                page_limit,
                concurrency,
                timeout_secs,
                query_encoding,
            };
            cmd_export(flags.over(file).resolve()?).await
        }
        Command::Status { rest } => {
            let flags = Config {
                rest,
                ..Config::default()
            };
            cmd_status(flags.over(file).resolve()?).await
        }
    }
}

fn client(settings: &Settings) -> Result<LcdClient> {
    Ok(LcdClient::new(
        settings.rest.clone(),
        settings.timeout,
        settings.query_encoding,
    )?)
}

/// Execute the `export` subcommand.
///
/// Run failures are logged, not turned into a failing exit status.
async fn cmd_export(settings: Settings) -> Result<()> {
    tracing::info!(rest = %settings.rest, output = %settings.output.display(), "starting snapshot");
    let lcd = client(&settings)?;
    if let Err(e) = snapshot::run(lcd, &settings).await {
        tracing::error!(error = %format_args!("{e:#}"), "snapshot aborted");
    }
    Ok(())
}

/// Execute the `status` subcommand.
async fn cmd_status(settings: Settings) -> Result<()> {
    let lcd = client(&settings)?;
    if let Err(e) = check_connection(&lcd).await {
        tracing::error!(rest = %settings.rest, error = %e, "chain unreachable");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_accepts_query_encoding() {
        let cli =
            Cli::try_parse_from(["cw20-holders", "export", "--query-encoding", "raw"]).unwrap();
        let Command::Export { query_encoding, .. } = cli.command else {
            panic!("export subcommand expected");
        };
        assert_eq!(query_encoding, Some(QueryEncoding::Raw), "flag parsed");
    }

    #[test]
    fn export_rejects_unknown_query_encoding() {
        let res = Cli::try_parse_from(["cw20-holders", "export", "--query-encoding", "hex"]);
        assert!(res.is_err(), "unknown encoding rejected");
    }
}
