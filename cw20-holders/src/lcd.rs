//! Cosmos REST (LCD) access.
//!
//! [`Lcd`] is the seam between the holder logic and the network: the
//! enumerator and the balance fetcher are generic over it, [`LcdClient`]
//! implements it with `reqwest`, and tests swap in a scripted double.

use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{ChainStatus, Coin};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only access to a Cosmos SDK REST endpoint.
pub trait Lcd: Send + Sync {
    /// Fetch the header of the latest block.
    fn latest_block(&self) -> impl Future<Output = Result<ChainStatus>> + Send;

    /// Run a smart query against a CosmWasm contract and return the raw JSON answer.
    fn smart_query<Q>(
        &self,
        contract: &str,
        query: &Q,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send
    where
        Q: Serialize + Sync;

    /// Fetch every bank balance held by `address`.
    fn balances(&self, address: &str) -> impl Future<Output = Result<Vec<Coin>>> + Send;
}

/// How a smart query travels in the request path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryEncoding {
    /// Standard base64 of the JSON query, as `wasmd` expects.
    #[default]
    Base64,
    /// The JSON text itself, percent-encoded.
    Raw,
}

impl QueryEncoding {
    /// Encode serialized query JSON into a path segment (before percent-encoding).
    #[must_use]
    pub fn encode(self, json: &str) -> String {
        match self {
            Self::Base64 => STANDARD.encode(json),
            Self::Raw => json.to_owned(),
        }
    }
}

impl FromStr for QueryEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown query encoding {other:?}, expected base64 or raw")),
        }
    }
}

/// Strip the `{"data": ...}` envelope `wasmd` wraps smart-query answers in.
///
/// Bodies without the envelope are returned as they are.
#[must_use]
pub fn unwrap_smart_response(mut body: serde_json::Value) -> serde_json::Value {
    match body.as_object_mut().and_then(|o| o.remove("data")) {
        Some(data) => data,
        None => body,
    }
}

#[derive(Deserialize)]
struct LatestBlockResponse {
    block: BlockEnvelope,
}

#[derive(Deserialize)]
struct BlockEnvelope {
    header: ChainStatus,
}

#[derive(Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<Coin>,
}

/// `reqwest`-backed [`Lcd`] implementation.
#[derive(Debug, Clone)]
pub struct LcdClient {
    client: reqwest::Client,
    endpoint: Url,
    encoding: QueryEncoding,
}

impl LcdClient {
    /// Create a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the URL cannot carry path segments
    /// (e.g. `mailto:`), or [`Error::Transport`] if the HTTP client cannot
    /// be built.
    pub fn new(endpoint: Url, timeout: Duration, encoding: QueryEncoding) -> Result<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(Error::Endpoint(endpoint.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Transport {
                url: endpoint.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            endpoint,
            encoding,
        })
    }

    /// The REST endpoint this client talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build `<endpoint>/<segments...>`, percent-encoding every segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the endpoint cannot carry path segments.
    pub fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a smart query against `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the query cannot be serialized.
    pub fn smart_query_url<Q: Serialize>(&self, contract: &str, query: &Q) -> Result<Url> {
        let json = serde_json::to_string(query).map_err(Error::Query)?;
        let encoded = self.encoding.encode(&json);
        self.url([
            "cosmwasm", "wasm", "v1", "contract", contract, "smart", encoded.as_str(),
        ])
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Lcd for LcdClient {
    async fn latest_block(&self) -> Result<ChainStatus> {
        let url = self.url(["cosmos", "base", "tendermint", "v1beta1", "blocks", "latest"])?;
        let resp: LatestBlockResponse = self.get(url).await?;
        Ok(resp.block.header)
    }

    async fn smart_query<Q>(&self, contract: &str, query: &Q) -> Result<serde_json::Value>
    where
        Q: Serialize + Sync,
    {
        let url = self.smart_query_url(contract, query)?;
        self.get(url).await.map(unwrap_smart_response)
    }

    async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        let url = self.url(["cosmos", "bank", "v1beta1", "balances", address])?;
        let resp: BalancesResponse = self.get(url).await?;
        Ok(resp.balances)
    }
}


/// Requests sent through `LcdClient` to a throwaway local HTTP server.
#[cfg(test)]
mod http_tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::num::NonZeroUsize;

    use super::*;
    use crate::balances::BalanceFetcher;
    use crate::holders::{HolderEnumerator, Page, collect_holders};
    use crate::types::HolderRecord;

    const BLOCK_PATH: &str = "/cosmos/base/tendermint/v1beta1/blocks/latest";
    const SMART_PATH: &str = "/cosmwasm/wasm/v1/contract/c/smart/";
    const BANK_PATH: &str = "/cosmos/bank/v1beta1/balances/";

    /// Answer each request with the first route whose path prefix matches,
    /// or 404.
    fn serve(routes: Vec<(String, u16, &'static str)>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .iter()
                    .find(|(prefix, ..)| path.starts_with(prefix.as_str()))
                    .map_or((404, "{}"), |(_, status, body)| (*status, *body));
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).ok();
            }
        });
        format!("http://{addr}").parse().unwrap()
    }

    fn client_for(endpoint: Url) -> LcdClient {
        LcdClient::new(endpoint, Duration::from_secs(5), QueryEncoding::Base64).unwrap()
    }

    #[tokio::test]
    async fn latest_block_unwraps_header() {
        let lcd = client_for(serve(vec![(
            BLOCK_PATH.to_owned(),
            200,
            r#"{"block_id":{"hash":"AA=="},"block":{"header":{"chain_id":"unicorn-69","height":"123","time":"2024-11-05T10:00:00Z"},"data":{"txs":[]}}}"#,
        )]));
        let status = lcd.latest_block().await.unwrap();
        assert_eq!(status.height, 123, "height");
        assert_eq!(status.chain_id, "unicorn-69", "chain id");
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let lcd = client_for(serve(Vec::new()));
        let err = lcd.latest_block().await.unwrap_err();
        assert_eq!(err.status(), Some(404), "404 mapped: {err}");
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let lcd = client_for(serve(vec![(BLOCK_PATH.to_owned(), 200, "<html>busy</html>")]));
        let err = lcd.latest_block().await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "decode error: {err}");
    }

    #[tokio::test]
    async fn balances_without_key_are_empty() {
        let lcd = client_for(serve(vec![(
            format!("{BANK_PATH}addr1"),
            200,
            r#"{"pagination":null}"#,
        )]));
        assert!(lcd.balances("addr1").await.unwrap().is_empty(), "no balances");
    }

    #[tokio::test]
    async fn enveloped_smart_answer_yields_holders() {
        let lcd = client_for(serve(vec![
            (SMART_PATH.to_owned(), 200, r#"{"data":{"accounts":["addr1","addr2"]}}"#),
            (
                format!("{BANK_PATH}addr1"),
                200,
                r#"{"balances":[{"denom":"uother","amount":"3"},{"denom":"udenom","amount":"500"}]}"#,
            ),
            (format!("{BANK_PATH}addr2"), 200, r#"{"balances":[]}"#),
        ]));

        let balances = BalanceFetcher::new(lcd.clone(), "udenom", NonZeroUsize::MIN);
        let snapshot = collect_holders(HolderEnumerator::new(lcd, "c", 100), &balances).await;

        assert_eq!(
            snapshot.holders,
            vec![HolderRecord::new("addr1", 500), HolderRecord::new("addr2", 0)],
            "accounts read from the data envelope"
        );
        assert!(snapshot.completion.is_complete(), "short page ends cleanly");
    }

    #[tokio::test]
    async fn bare_smart_answer_yields_accounts() {
        let lcd = client_for(serve(vec![(
            SMART_PATH.to_owned(),
            200,
            r#"{"accounts":["x"]}"#,
        )]));
        let mut enumerator = HolderEnumerator::new(lcd, "c", 100);
        assert_eq!(
            enumerator.next_page().await.unwrap(),
            Page::Last(vec!["x".to_owned()]),
            "top-level accounts"
        );
    }

    #[tokio::test]
    async fn refused_connection_counts_as_zero_balance() {
        let endpoint: Url = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap()).parse().unwrap()
        };
        let lcd = client_for(endpoint);

        let err = lcd.balances("a").await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }), "transport error: {err}");

        let fetcher = BalanceFetcher::new(lcd, "udenom", NonZeroUsize::MIN);
        let page = fetcher.fetch_page(&["a".to_owned(), "b".to_owned()]).await;
        assert_eq!(page.amounts, vec![0, 0], "zero substituted");
        assert_eq!(page.failed, 2, "both lookups failed and the page finished");
    }
}
