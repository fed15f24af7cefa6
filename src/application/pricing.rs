use crate::domain::ports::PriceSourceBox;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How long a fetched price is served from memory.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Price used when the oracle cannot be reached.
pub const DEFAULT_FALLBACK_PRICE: Decimal = dec!(0.001);

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    usd: Decimal,
    fetched_at: Instant,
}

/// Settlement-token spot price with an in-memory cache and a fixed fallback.
pub struct PriceService {
    source: PriceSourceBox,
    ttl: Duration,
    fallback: Decimal,
    cache: Mutex<Option<CachedPrice>>,
}

impl PriceService {
    pub fn new(source: PriceSourceBox, ttl: Duration, fallback: Decimal) -> Self {
        Self {
            source,
            ttl,
            fallback,
            cache: Mutex::new(None),
        }
    }

    /// USD price of one token. Never fails: fetch errors yield the fallback,
    /// which is not cached.
    pub async fn spot_price(&self) -> Decimal {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = *cache
            && cached.fetched_at.elapsed() < self.ttl
        {
            return cached.usd;
        }
        match self.source.fetch_usd_price().await {
            Ok(usd) => {
                debug!(%usd, "token price refreshed");
                *cache = Some(CachedPrice {
                    usd,
                    fetched_at: Instant::now(),
                });
                usd
            }
            Err(e) => {
                warn!(error = %e, fallback = %self.fallback, "price fetch failed, using fallback");
                self.fallback
            }
        }
    }

    pub async fn usd_to_token(&self, usd: Decimal) -> Decimal {
        let price = self.spot_price().await;
        if price.is_zero() {
            return Decimal::ZERO;
        }
        usd.checked_div(price).unwrap_or_default()
    }

    pub async fn token_to_usd(&self, tokens: Decimal) -> Decimal {
        tokens * self.spot_price().await
    }
}

/// Display currency for amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency<'a> {
    Usd,
    Token(&'a str),
}

/// Two decimals with thousands grouping: `$1,234.50` or `1,234.50 SYMBOL`.
pub fn format_amount(amount: Decimal, currency: Currency<'_>) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if negative { "-" } else { "" };

    match currency {
        Currency::Usd => format!("{sign}${grouped}.{frac}"),
        Currency::Token(symbol) => format!("{sign}{grouped}.{frac} {symbol}"),
    }
}

/// Formats an `f64` coming from outside the decimal domain; NaN and
/// infinities render as zero tokens.
pub fn format_float(amount: f64, currency: Currency<'_>) -> String {
    match Decimal::from_f64_retain(amount) {
        Some(value) if amount.is_finite() => format_amount(value, currency),
        _ => match currency {
            Currency::Usd => "$0.00".to_string(),
            Currency::Token(symbol) => format!("0.00 {symbol}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PriceSource;
    use crate::error::{Result, StoreError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        price: Option<Decimal>,
    }

    #[async_trait]
    impl PriceSource for CountingSource {
        async fn fetch_usd_price(&self) -> Result<Decimal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.price
                .ok_or_else(|| StoreError::ValidationError("oracle down".to_string()))
        }
    }

    fn service(price: Option<Decimal>) -> (PriceService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: calls.clone(),
            price,
        };
        (
            PriceService::new(Box::new(source), DEFAULT_CACHE_TTL, DEFAULT_FALLBACK_PRICE),
            calls,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_is_cached_until_ttl() {
        let (prices, calls) = service(Some(dec!(0.002)));

        assert_eq!(prices.spot_price().await, dec!(0.002));
        assert_eq!(prices.spot_price().await, dec!(0.002));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(DEFAULT_CACHE_TTL + Duration::from_secs(1)).await;
        prices.spot_price().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_not_cached() {
        let (prices, calls) = service(None);
        assert_eq!(prices.spot_price().await, DEFAULT_FALLBACK_PRICE);
        assert_eq!(prices.spot_price().await, DEFAULT_FALLBACK_PRICE);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_conversions() {
        let (prices, _) = service(Some(dec!(0.5)));
        assert_eq!(prices.usd_to_token(dec!(10)).await, dec!(20));
        assert_eq!(prices.token_to_usd(dec!(20)).await, dec!(10));

        let (free, _) = service(Some(Decimal::ZERO));
        assert_eq!(free.usd_to_token(dec!(10)).await, Decimal::ZERO);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(1412038.114), Currency::Usd), "$1,412,038.11");
        assert_eq!(
            format_amount(dec!(0.5), Currency::Token("MEMEXSOL")),
            "0.50 MEMEXSOL"
        );
        assert_eq!(format_amount(dec!(999), Currency::Usd), "$999.00");
        assert_eq!(format_amount(dec!(-1234.5), Currency::Usd), "-$1,234.50");
    }

    #[test]
    fn test_format_float_non_finite() {
        assert_eq!(format_float(f64::NAN, Currency::Token("MEMEXSOL")), "0.00 MEMEXSOL");
        assert_eq!(format_float(f64::INFINITY, Currency::Usd), "$0.00");
        assert_eq!(format_float(12.0, Currency::Usd), "$12.00");
    }
}
