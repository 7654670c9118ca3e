//! Snapshot orchestration.
//!
//! A run:
//! 1. Confirms the node is reachable (a failure aborts before any query).
//! 2. Pages through the contract's accounts, looking up each page's balances.
//! 3. Writes the holders to the snapshot file and prints them.
//!
//! A failed page query truncates the snapshot instead of aborting it, and a
//! failed balance lookup records zero for that address.

use anyhow::{Context, Result};
use cw20_holders::{
    BalanceFetcher, ChainStatus, HolderEnumerator, Lcd, Snapshot, check_connection,
    collect_holders,
};

use crate::config::Settings;
use crate::export;

/// What a finished run produced.
#[derive(Debug)]
pub struct Report {
    /// Latest block seen by the connectivity check.
    pub status: ChainStatus,
    /// The holders and how enumeration ended.
    pub snapshot: Snapshot,
}

/// Take a holder snapshot and export it.
///
/// # Errors
///
/// Returns an error if the node is unreachable or the snapshot file cannot
/// be written.
pub async fn run<L>(lcd: L, settings: &Settings) -> Result<Report>
where
    L: Lcd + Clone + 'static,
{
    let status = check_connection(&lcd)
        .await
        .context("failed to connect to the chain, check the REST endpoint")?;

    tracing::info!(
        contract = %settings.contract,
        denom = %settings.denom,
        page_limit = settings.page_limit,
        concurrency = settings.concurrency.get(),
        "fetching token holders"
    );

    let enumerator =
        HolderEnumerator::new(lcd.clone(), settings.contract.as_str(), settings.page_limit);
    let balances = BalanceFetcher::new(lcd, settings.denom.as_str(), settings.concurrency);
    let snapshot = collect_holders(enumerator, &balances).await;

    export::write_json(&settings.output, &snapshot.holders)?;
    export::print_holders(&snapshot.holders);

    tracing::info!(
        holders = snapshot.holders.len(),
        pages = snapshot.pages,
        failed_lookups = snapshot.failed_lookups,
        complete = snapshot.completion.is_complete(),
        "snapshot finished"
    );

    Ok(Report { status, snapshot })
}
