use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{de, Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::PriceCache;

pub const DEFAULT_ORACLE_URL: &str = "https://api-v2.dex.ag";
/// Total attempts per lookup, including the first.
pub const ORACLE_ATTEMPTS: u32 = 3;
const WRAPPED_NATIVE_SYMBOL: &str = "WETH";
const NATIVE_SYMBOL: &str = "ETH";

/// A market price feed queried one request at a time.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Amount of `to` received for one `from`, in whole tokens.
    async fn query_price(&self, from: &str, to: &str) -> Result<f64>;
}

/// HTTP client for the dex.ag style price endpoint
/// (`GET /price?from=..&to=..&fromAmount=1&dex=ag`).
pub struct PriceOracle {
    api_url: String,
    client: reqwest::Client,
}

impl PriceOracle {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self::with_client(api_url, client))
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: crate::utils::remove_trailing_slash(api_url),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_price_url(&self) -> String {
        format!("{}/price", self.api_url)
    }
}

#[derive(Deserialize)]
struct PriceResponse {
    #[serde(default, deserialize_with = "deserialize_price")]
    price: Option<f64>,
    error: Option<String>,
}

/// The service quotes `price` either as a JSON number or a decimal string.
fn deserialize_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Q {
        Str(String),
        Num(f64),
    }
    match Option::<Q>::deserialize(deserializer)? {
        Some(Q::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        Some(Q::Num(n)) => Ok(Some(n)),
        None => Ok(None),
    }
}

#[async_trait]
impl PriceSource for PriceOracle {
    async fn query_price(&self, from: &str, to: &str) -> Result<f64> {
        let response = self
            .client
            .get(self.build_price_url())
            .query(&[("from", from), ("to", to), ("fromAmount", "1"), ("dex", "ag")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<PriceResponse>(&body)
                .ok()
                .and_then(|r| r.error);
            return Err(anyhow!(
                "price oracle returned status {}: {}",
                status,
                reason.unwrap_or(body)
            ));
        }

        let parsed: PriceResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow!("malformed price oracle response: {}", e))?;
        match parsed.price {
            Some(price) if is_usable_price(price) => Ok(price),
            _ => Err(anyhow!("price oracle response carries no usable price: {}", body)),
        }
    }
}

/// Prices are exchange rates: finite and strictly positive.
pub fn is_usable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// The oracle only knows the native token, not its wrapped form.
pub fn normalize_symbol(symbol: &str) -> &str {
    if symbol == WRAPPED_NATIVE_SYMBOL {
        NATIVE_SYMBOL
    } else {
        symbol
    }
}

/// Price of `bought` per one `sold`, or `None` when the oracle stays
/// unreachable, or keeps quoting a zero, negative or non-finite price, for
/// all [`ORACLE_ATTEMPTS`] attempts.
///
/// The cache is consulted first, for the exact pair and then for the inverse
/// pair. Fresh prices are stored under the queried pair.
pub async fn fetch_price<S>(
    source: &S,
    bought: &str,
    sold: &str,
    cache: Option<&PriceCache>,
) -> Option<f64>
where
    S: PriceSource + ?Sized,
{
    let bought = normalize_symbol(bought);
    let sold = normalize_symbol(sold);
    if bought == sold {
        return Some(1.0);
    }

    if let Some(price) = cache.and_then(|c| c.get(bought, sold)) {
        debug!(bought, sold, price, "price served from cache");
        return Some(price);
    }

    match crate::utils::retry(ORACLE_ATTEMPTS, Duration::ZERO, || async move {
        let price = source.query_price(sold, bought).await?;
        if is_usable_price(price) {
            Ok(price)
        } else {
            Err(anyhow!("oracle quoted unusable price {} for {}/{}", price, sold, bought))
        }
    })
    .await
    {
        Ok(price) => {
            if let Some(cache) = cache {
                cache.insert(bought, sold, price);
            }
            Some(price)
        }
        Err(e) => {
            warn!(
                bought,
                sold,
                error = %e,
                "unable to retrieve price information from the oracle"
            );
            None
        }
    }
}
