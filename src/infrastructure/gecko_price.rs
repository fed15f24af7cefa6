use crate::domain::ports::PriceSource;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

/// Pool endpoint quoting the settlement token in USD.
pub const DEFAULT_PRICE_URL: &str =
    "https://api.geckoterminal.com/api/v2/networks/solana/pools/5fxe95uBfY5kbACgr59zBTcCzAge5WGaAEDHebLBLhr4";

/// Reads the base-token USD price of a GeckoTerminal pool.
#[derive(Clone)]
pub struct GeckoPriceSource {
    client: Client,
    url: String,
}

impl GeckoPriceSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

fn parse_price(body: &Value) -> Result<Decimal> {
    let raw = body
        .pointer("/data/attributes/base_token_price_usd")
        .ok_or_else(|| StoreError::ValidationError("price missing from response".to_string()))?;
    let price = match raw {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
        _ => None,
    };
    price
        .filter(|p| *p >= Decimal::ZERO)
        .ok_or_else(|| StoreError::ValidationError(format!("invalid price: {raw}")))
}

#[async_trait]
impl PriceSource for GeckoPriceSource {
    async fn fetch_usd_price(&self) -> Result<Decimal> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BackendError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let body: Value = response.json().await?;
        let price = parse_price(&body)?;
        debug!(%price, "price fetched");
        Ok(price)
    }
}
