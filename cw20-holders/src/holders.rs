//! Holder enumeration over the CW20 `all_accounts` query.
//!
//! The contract is paged with a `start_after` cursor. A page shorter than
//! the requested limit is taken as the last one: this relies on the
//! contract always filling a page while more accounts remain. A contract
//! that caps `limit` below the requested value (cw20-base caps at 30)
//! therefore looks exhausted after its first page, so the limit must not
//! exceed the contract's own maximum.

use crate::balances::BalanceFetcher;
use crate::error::{Error, Result};
use crate::lcd::Lcd;
use crate::types::{AccountsResponse, Cw20Query, HolderRecord};

/// Default `all_accounts` page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Outcome of one paging step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// A full page; more accounts follow after `cursor`.
    More {
        /// Accounts in this page.
        accounts: Vec<String>,
        /// The last account of this page, to resume after.
        cursor: String,
    },
    /// A short, final page.
    Last(Vec<String>),
    /// No accounts at all; enumeration is over.
    Empty,
}

impl Page {
    /// Accounts carried by this page.
    #[must_use]
    pub fn accounts(&self) -> &[String] {
        match self {
            Self::More { accounts, .. } | Self::Last(accounts) => accounts,
            Self::Empty => &[],
        }
    }

    /// Classify a page of `accounts` fetched with `limit`.
    #[must_use]
    pub fn classify(accounts: Vec<String>, limit: u32) -> Self {
        let full = u32::try_from(accounts.len()).map_or(true, |n| n >= limit);
        let Some(cursor) = accounts.last().cloned() else {
            return Self::Empty;
        };
        if full {
            Self::More { accounts, cursor }
        } else {
            Self::Last(accounts)
        }
    }
}

/// Walks the account list of one CW20 contract page by page.
#[derive(Debug)]
pub struct HolderEnumerator<L> {
    lcd: L,
    contract: String,
    limit: u32,
    cursor: Option<String>,
    done: bool,
}

impl<L: Lcd> HolderEnumerator<L> {
    /// Start enumerating `contract` from its first account.
    ///
    /// A `limit` of zero is raised to one.
    pub fn new(lcd: L, contract: impl Into<String>, limit: u32) -> Self {
        Self {
            lcd,
            contract: contract.into(),
            limit: limit.max(1),
            cursor: None,
            done: false,
        }
    }

    /// The cursor the next page will start after.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether a `Last` or `Empty` page has been returned.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page and advance the cursor.
    ///
    /// Once done, returns [`Page::Empty`] without querying again. A failed
    /// query leaves the cursor untouched.
    ///
    /// # Errors
    ///
    /// Returns the smart-query error, or [`Error::Decode`] if the answer has
    /// no usable `accounts` list.
    pub async fn next_page(&mut self) -> Result<Page> {
        if self.done {
            return Ok(Page::Empty);
        }

        let query = Cw20Query::AllAccounts {
            limit: self.limit,
            start_after: self.cursor.clone(),
        };
        let value = self.lcd.smart_query(&self.contract, &query).await?;
        if value.get("accounts").is_none() {
            tracing::warn!(contract = %self.contract, "answer has no accounts list, treating as empty");
        }
        let resp: AccountsResponse =
            serde_json::from_value(value).map_err(|source| Error::Decode {
                url: format!("contract {} all_accounts", self.contract),
                source,
            })?;

        let page = Page::classify(resp.accounts, self.limit);
        match &page {
            Page::More { cursor, .. } => self.cursor = Some(cursor.clone()),
            Page::Last(_) | Page::Empty => self.done = true,
        }
        Ok(page)
    }
}

/// How an enumeration ended.
#[derive(Debug)]
pub enum Completion {
    /// The contract ran out of accounts.
    Exhausted,
    /// A page query failed; the holders gathered before it are kept.
    Truncated(Error),
}

impl Completion {
    /// Whether every page was read.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Result of a full holder enumeration.
#[derive(Debug)]
pub struct Snapshot {
    /// Holders in contract order.
    pub holders: Vec<HolderRecord>,
    /// Number of page queries issued, including a failed final one.
    pub pages: usize,
    /// Balance lookups that failed and were recorded as zero.
    pub failed_lookups: usize,
    /// Why enumeration stopped.
    pub completion: Completion,
}

/// Enumerate every holder of `enumerator`'s contract with its balance.
///
/// Never fails: a failed page query ends enumeration with the holders
/// collected so far and [`Completion::Truncated`].
pub async fn collect_holders<L, B>(
    mut enumerator: HolderEnumerator<L>,
    balances: &BalanceFetcher<B>,
) -> Snapshot
where
    L: Lcd,
    B: Lcd + Clone + 'static,
{
    let mut snapshot = Snapshot {
        holders: Vec::new(),
        pages: 0,
        failed_lookups: 0,
        completion: Completion::Exhausted,
    };

    loop {
        snapshot.pages += 1;
        let page = match enumerator.next_page().await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    page = snapshot.pages,
                    holders = snapshot.holders.len(),
                    error = %e,
                    "account query failed, keeping partial result"
                );
                snapshot.completion = Completion::Truncated(e);
                break;
            }
        };

        let accounts = page.accounts();
        tracing::info!(page = snapshot.pages, accounts = accounts.len(), "retrieved accounts");
        if accounts.is_empty() {
            break;
        }

        let fetched = balances.fetch_page(accounts).await;
        snapshot.failed_lookups += fetched.failed;
        snapshot.holders.extend(
            accounts
                .iter()
                .zip(fetched.amounts)
                .map(|(address, balance)| HolderRecord::new(address.clone(), balance)),
        );

        if !matches!(page, Page::More { .. }) {
            break;
        }
    }

    snapshot
}
