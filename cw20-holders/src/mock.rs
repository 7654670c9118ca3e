//! Scripted in-memory [`Lcd`] for tests.
//!
//! Pages are keyed by the `start_after` cursor of the `all_accounts` query,
//! so the same mock answers identically however many times it is walked.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::lcd::Lcd;
use crate::types::{ChainStatus, Coin};

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Status(u16),
}

impl<T: Clone> Reply<T> {
    fn get(&self, url: &str) -> Result<T> {
        match self {
            Self::Ok(v) => Ok(v.clone()),
            Self::Status(status) => Err(Error::Status {
                url: url.to_owned(),
                status: *status,
            }),
        }
    }
}

/// An [`Lcd`] answering from fixed tables and counting calls.
///
/// Clones share their call counters.
#[derive(Debug, Clone, Default)]
pub struct MockLcd {
    block: Option<ChainStatus>,
    pages: HashMap<Option<String>, Reply<Vec<String>>>,
    balances: HashMap<String, Reply<Vec<Coin>>>,
    smart_queries: Arc<AtomicUsize>,
    balance_lookups: Arc<AtomicUsize>,
}

impl MockLcd {
    /// An empty mock: no block (HTTP 503), no pages (HTTP 500), empty balances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this latest block.
    #[must_use]
    pub fn with_block(mut self, chain_id: &str, height: u64, time: DateTime<Utc>) -> Self {
        self.block = Some(ChainStatus {
            chain_id: chain_id.to_owned(),
            height,
            time,
        });
        self
    }

    /// Answer the page starting after `start_after` with `accounts`.
    #[must_use]
    pub fn with_page<S: AsRef<str>>(mut self, start_after: Option<&str>, accounts: &[S]) -> Self {
        let accounts = accounts.iter().map(|a| a.as_ref().to_owned()).collect();
        self.pages
            .insert(start_after.map(str::to_owned), Reply::Ok(accounts));
        self
    }

    /// Fail the page starting after `start_after` with an HTTP status.
    #[must_use]
    pub fn with_failing_page(mut self, start_after: Option<&str>, status: u16) -> Self {
        self.pages
            .insert(start_after.map(str::to_owned), Reply::Status(status));
        self
    }

    /// Serve `coins` as the balance list of `address`.
    #[must_use]
    pub fn with_balances(mut self, address: &str, coins: Vec<Coin>) -> Self {
        self.balances.insert(address.to_owned(), Reply::Ok(coins));
        self
    }

    /// Fail balance lookups of `address` with an HTTP status.
    #[must_use]
    pub fn with_failing_balances(mut self, address: &str, status: u16) -> Self {
        self.balances
            .insert(address.to_owned(), Reply::Status(status));
        self
    }

    /// Number of smart queries issued so far.
    #[must_use]
    pub fn smart_queries(&self) -> usize {
        self.smart_queries.load(Ordering::SeqCst)
    }

    /// Number of balance lookups issued so far.
    #[must_use]
    pub fn balance_lookups(&self) -> usize {
        self.balance_lookups.load(Ordering::SeqCst)
    }
}

impl Lcd for MockLcd {
    async fn latest_block(&self) -> Result<ChainStatus> {
        self.block.clone().ok_or_else(|| Error::Status {
            url: "mock://blocks/latest".to_owned(),
            status: 503,
        })
    }

    async fn smart_query<Q>(&self, contract: &str, query: &Q) -> Result<serde_json::Value>
    where
        Q: Serialize + Sync,
    {
        self.smart_queries.fetch_add(1, Ordering::SeqCst);
        let query = serde_json::to_value(query).map_err(Error::Query)?;
        let cursor = query["all_accounts"]["start_after"]
            .as_str()
            .map(str::to_owned);
        let url = format!("mock://{contract}/smart/{query}");
        let accounts = self
            .pages
            .get(&cursor)
            .cloned()
            .unwrap_or(Reply::Status(500))
            .get(&url)?;
        Ok(json!({ "accounts": accounts }))
    }

    async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        self.balance_lookups.fetch_add(1, Ordering::SeqCst);
        self.balances
            .get(address)
            .map_or_else(|| Ok(Vec::new()), |r| r.get(&format!("mock://balances/{address}")))
    }
}
