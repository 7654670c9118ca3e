//! Per-address bank balance lookup for one tracked denom.
//!
//! A lookup that fails for any reason (transport, HTTP status, bad JSON,
//! unparsable amount) is logged and counted as a zero balance; it never
//! stops the run. With `concurrency > 1` a bounded set of tokio workers
//! pulls addresses by index, and results are written back by index so the
//! output stays parallel to the input.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::lcd::Lcd;
use crate::types::Coin;

/// Balances of one page of addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBalances {
    /// One amount per input address, same order.
    pub amounts: Vec<u128>,
    /// How many of those amounts are zeros substituted for failed lookups.
    pub failed: usize,
}

/// Looks up the balance of a single denom for many addresses.
#[derive(Debug, Clone)]
pub struct BalanceFetcher<L> {
    lcd: L,
    denom: Arc<str>,
    concurrency: NonZeroUsize,
}

impl<L: Lcd + Clone + 'static> BalanceFetcher<L> {
    /// Create a fetcher for `denom`. A concurrency of one is strictly sequential.
    pub fn new(lcd: L, denom: impl Into<Arc<str>>, concurrency: NonZeroUsize) -> Self {
        Self {
            lcd,
            denom: denom.into(),
            concurrency,
        }
    }

    /// The tracked denom.
    #[must_use]
    pub fn denom(&self) -> &str {
        &self.denom
    }

    /// Balance of the tracked denom held by `address`; zero if the denom is absent.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, or [`crate::Error::Amount`] if the amount is
    /// not an integer.
    pub async fn balance_of(&self, address: &str) -> Result<u128> {
        let coins = self.lcd.balances(address).await?;
        coins
            .iter()
            .find(|c| *c.denom == *self.denom)
            .map_or(Ok(0), Coin::parse_amount)
    }

    async fn balance_or_zero(&self, address: &str) -> Option<u128> {
        match self.balance_of(address).await {
            Ok(amount) => Some(amount),
            Err(e) => {
                tracing::warn!(address, error = %e, "balance lookup failed, using 0");
                None
            }
        }
    }

    /// Balances for one page of addresses, substituting zero for failures.
    pub async fn fetch_page(&self, addresses: &[String]) -> PageBalances {
        if self.concurrency.get() == 1 || addresses.len() <= 1 {
            return self.fetch_sequential(addresses).await;
        }
        self.fetch_concurrent(addresses).await
    }

    async fn fetch_sequential(&self, addresses: &[String]) -> PageBalances {
        let mut page = PageBalances {
            amounts: Vec::with_capacity(addresses.len()),
            failed: 0,
        };
        for address in addresses {
            let amount = self.balance_or_zero(address).await.unwrap_or_else(|| {
                page.failed += 1;
                0
            });
            page.amounts.push(amount);
        }
        page
    }

    async fn fetch_concurrent(&self, addresses: &[String]) -> PageBalances {
        let addresses: Arc<[String]> = addresses.into();
        let next = Arc::new(AtomicUsize::new(0));
        let workers = self.concurrency.get().min(addresses.len());

        let handles = (0..workers)
            .map(|_| {
                let fetcher = self.clone();
                let addresses = Arc::clone(&addresses);
                let next = Arc::clone(&next);
                tokio::spawn(async move {
                    let mut found = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let Some(address) = addresses.get(i) else {
                            break;
                        };
                        found.push((i, fetcher.balance_or_zero(address).await));
                    }
                    found
                })
            })
            .collect::<Vec<_>>();

        // Slots a crashed worker never filled stay `None` and count as failed.
        let mut slots: Vec<Option<u128>> = vec![None; addresses.len()];
        for handle in handles {
            match handle.await {
                Ok(found) => {
                    for (i, amount) in found {
                        if let Some(slot) = slots.get_mut(i) {
                            *slot = amount;
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "balance worker crashed"),
            }
        }

        let failed = slots.iter().filter(|s| s.is_none()).count();
        PageBalances {
            amounts: slots.into_iter().map(|s| s.unwrap_or(0)).collect(),
            failed,
        }
    }
}
