//! Runtime configuration loaded from `holders.toml` and the command line.
//!
//! Every field is optional in the file. Command-line flags override the
//! file, and the file overrides the built-in defaults. The resolved
//! [`Settings`] are immutable for the rest of the run.
//!
//! ```toml
//! rest = "https://rest.unicorn.meme"
//! contract = "unicorn1rn9f6ack3u8t3ed04pfaqpmh5zfp2m2ll4mkty"
//! denom = "uwunicorn"
//! output = "token_holders.json"
//! page_limit = 100
//! concurrency = 4
//! timeout_secs = 30
//! query_encoding = "base64"
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use cw20_holders::{DEFAULT_PAGE_LIMIT, DEFAULT_TIMEOUT, QueryEncoding};
use serde::Deserialize;
use url::Url;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "holders.toml";

/// Default REST endpoint.
pub const DEFAULT_REST: &str = "https://rest.unicorn.meme";

/// Default CW20 contract.
pub const DEFAULT_CONTRACT: &str = "unicorn1rn9f6ack3u8t3ed04pfaqpmh5zfp2m2ll4mkty";

/// Default tracked denom.
pub const DEFAULT_DENOM: &str = "udenom";

/// Default snapshot file.
pub const DEFAULT_OUTPUT: &str = "token_holders.json";

/// A partial configuration layer (file or command line).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the chain's REST (LCD) endpoint.
    pub rest: Option<String>,
    /// CW20 contract address to enumerate.
    pub contract: Option<String>,
    /// Bank denom whose balance is recorded.
    pub denom: Option<String>,
    /// Where the JSON snapshot is written.
    pub output: Option<PathBuf>,
    /// `all_accounts` page size.
    pub page_limit: Option<u32>,
    /// Balance lookups in flight at once.
    pub concurrency: Option<usize>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// How smart queries are encoded in the URL.
    pub query_encoding: Option<QueryEncoding>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the chain's REST (LCD) endpoint.
    pub rest: Url,
    /// CW20 contract address to enumerate.
    pub contract: String,
    /// Bank denom whose balance is recorded.
    pub denom: String,
    /// Where the JSON snapshot is written.
    pub output: PathBuf,
    /// `all_accounts` page size.
    pub page_limit: u32,
    /// Balance lookups in flight at once.
    pub concurrency: NonZeroUsize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How smart queries are encoded in the URL.
    pub query_encoding: QueryEncoding,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns [`Config::default`] if the file does not exist,
    /// allowing the binary to work without any config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Layer `self` over `base`: fields set in `self` win.
    #[must_use]
    pub fn over(self, base: Self) -> Self {
        Self {
            rest: self.rest.or(base.rest),
            contract: self.contract.or(base.contract),
            denom: self.denom.or(base.denom),
            output: self.output.or(base.output),
            page_limit: self.page_limit.or(base.page_limit),
            concurrency: self.concurrency.or(base.concurrency),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            query_encoding: self.query_encoding.or(base.query_encoding),
        }
    }

    /// Fill the gaps with built-in defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a URL, or if the page limit,
    /// concurrency or timeout is zero, or if the contract or denom is empty.
    pub fn resolve(self) -> Result<Settings> {
        let rest_str = self.rest.unwrap_or_else(|| DEFAULT_REST.to_owned());
        let rest: Url = rest_str
            .parse()
            .with_context(|| format!("invalid REST endpoint {rest_str:?}"))?;

        let contract = self.contract.unwrap_or_else(|| DEFAULT_CONTRACT.to_owned());
        ensure!(!contract.is_empty(), "contract address must not be empty");
        let denom = self.denom.unwrap_or_else(|| DEFAULT_DENOM.to_owned());
        ensure!(!denom.is_empty(), "denom must not be empty");

        let page_limit = self.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        ensure!(page_limit > 0, "page_limit must be at least 1");

        let concurrency = NonZeroUsize::new(self.concurrency.unwrap_or(1))
            .context("concurrency must be at least 1")?;

        let timeout = self
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        ensure!(!timeout.is_zero(), "timeout_secs must be at least 1");

        Ok(Settings {
            rest,
            contract,
            denom,
            output: self
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            page_limit,
            concurrency,
            timeout,
            query_encoding: self.query_encoding.unwrap_or_default(),
        })
    }
}
