//! CW20 token holder enumeration over the Cosmos REST (LCD) API.
//!
//! The crate pages through a CW20 contract's `all_accounts` smart query,
//! looks up each account's bank balance of one denom, and returns the
//! combined list as [`HolderRecord`]s.
//!
//! ```no_run
//! use std::num::NonZeroUsize;
//!
//! use cw20_holders::{
//!     BalanceFetcher, DEFAULT_PAGE_LIMIT, DEFAULT_TIMEOUT, HolderEnumerator, LcdClient,
//!     QueryEncoding, check_connection, collect_holders,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let lcd = LcdClient::new(
//!     "https://rest.unicorn.meme".parse()?,
//!     DEFAULT_TIMEOUT,
//!     QueryEncoding::Base64,
//! )?;
//! check_connection(&lcd).await?;
//!
//! let enumerator = HolderEnumerator::new(
//!     lcd.clone(),
//!     "unicorn1rn9f6ack3u8t3ed04pfaqpmh5zfp2m2ll4mkty",
//!     DEFAULT_PAGE_LIMIT,
//! );
//! let balances = BalanceFetcher::new(lcd, "uwunicorn", NonZeroUsize::MIN);
//! let snapshot = collect_holders(enumerator, &balances).await;
//! println!("{} holders", snapshot.holders.len());
//! # Ok(())
//! # }
//! ```

pub mod balances;
pub mod error;
pub mod holders;
pub mod lcd;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod probe;
pub mod types;

pub use balances::{BalanceFetcher, PageBalances};
pub use error::{Error, Result};
pub use holders::{
    Completion, DEFAULT_PAGE_LIMIT, HolderEnumerator, Page, Snapshot, collect_holders,
};
pub use lcd::{DEFAULT_TIMEOUT, Lcd, LcdClient, QueryEncoding, unwrap_smart_response};
pub use probe::check_connection;
pub use types::{AccountsResponse, ChainStatus, Coin, Cw20Query, HolderRecord};
