//! Wire and domain types.
//!
//! These model the JSON payloads served by a Cosmos SDK REST (LCD) node and
//! the CW20 smart-query messages, plus the [`HolderRecord`] that ends up in
//! an exported snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Deserialize a `u64` from either a JSON number or a JSON string.
///
/// Cosmos REST gateways encode 64-bit integers as strings.
fn deserialize_u64_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(u64),
        Str(String),
    }
    match StringOrNum::deserialize(deserializer)? {
        StringOrNum::Num(n) => Ok(n),
        StringOrNum::Str(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}

/// Header fields of the latest block, as reported by
/// `/cosmos/base/tendermint/v1beta1/blocks/latest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    /// Chain identifier (e.g. `"unicorn-69"`).
    #[serde(default)]
    pub chain_id: String,

    /// Height of the latest committed block.
    #[serde(deserialize_with = "deserialize_u64_or_string")]
    pub height: u64,

    /// Block timestamp.
    pub time: DateTime<Utc>,
}

/// One entry of a bank balance list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `"uwunicorn"` or `"factory/.../token"`.
    pub denom: String,

    /// Amount in base units, encoded as a decimal string.
    pub amount: String,
}

impl Coin {
    /// Create a coin from a denom and an integer amount.
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }

    /// Parse the amount as an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Amount`] if the amount is not a non-negative integer.
    pub fn parse_amount(&self) -> Result<u128> {
        self.amount.parse::<u128>().map_err(|_| Error::Amount {
            denom: self.denom.clone(),
            amount: self.amount.clone(),
        })
    }
}

/// Smart queries understood by a CW20 token contract.
///
/// Only the paging query used to enumerate holders is modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw20Query {
    /// List account addresses holding the token, in ascending order.
    AllAccounts {
        /// Maximum number of accounts to return.
        limit: u32,
        /// Exclusive lower bound; `None` starts from the first account.
        start_after: Option<String>,
    },
}

/// Response to [`Cw20Query::AllAccounts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountsResponse {
    /// Account addresses in contract order. Missing means none.
    #[serde(default)]
    pub accounts: Vec<String>,
}

/// A single token holder in an exported snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    /// Account address as returned by the contract.
    pub address: String,

    /// Bank balance of the tracked denom, in base units.
    pub balance: u128,
}

impl HolderRecord {
    /// Create a record.
    #[must_use]
    pub fn new(address: impl Into<String>, balance: u128) -> Self {
        Self {
            address: address.into(),
            balance,
        }
    }
}
