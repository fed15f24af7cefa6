use crate::application::balance::DEFAULT_POLL_INTERVAL;
use crate::application::pricing::{DEFAULT_CACHE_TTL, DEFAULT_FALLBACK_PRICE};
use crate::domain::address::Address;
use crate::domain::cart::Coupon;
use crate::domain::locale::Language;
use crate::error::{Result, StoreError};
use crate::infrastructure::gecko_price::DEFAULT_PRICE_URL;
use crate::infrastructure::solana_rpc::DEFAULT_CONFIRM_TIMEOUT;
use rust_decimal::Decimal;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_TOKEN_MINT: &str = "AsjP9VyKUSuLSeycoTb9AqGs3PH6BWAvqDoKmxrWpump";
const DEFAULT_TOKEN_SYMBOL: &str = "MEMEXSOL";
const DEFAULT_PAYMENT_WALLET: &str = "3H4YYu3SmkpBc4uy614aYjW7rt4nRBEQ8P3rKeFMMzyw";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub token_mint: Address,
    pub token_symbol: String,
    pub payment_wallet: Address,
    pub confirm_timeout: Duration,
    pub balance_poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub oracle_url: String,
    pub cache_ttl: Duration,
    pub fallback_usd: Decimal,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when no backend is configured.
    pub backend: Option<BackendConfig>,
    pub chain: ChainConfig,
    pub pricing: PricingConfig,
    pub coupon: Option<Coupon>,
    pub language: Language,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(BackendConfig { url, anon_key }),
            (Some(_), None) => {
                return Err(StoreError::ConfigError(
                    "SUPABASE_ANON_KEY must be set when SUPABASE_URL is".to_string(),
                ));
            }
            (None, _) => None,
        };

        let chain = ChainConfig {
            rpc_url: var("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            token_mint: parse("TOKEN_MINT", var("TOKEN_MINT"), DEFAULT_TOKEN_MINT)?,
            token_symbol: var("TOKEN_SYMBOL").unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
            payment_wallet: parse(
                "PAYMENT_WALLET_ADDRESS",
                var("PAYMENT_WALLET_ADDRESS"),
                DEFAULT_PAYMENT_WALLET,
            )?,
            confirm_timeout: seconds("CONFIRM_TIMEOUT_SECS", var("CONFIRM_TIMEOUT_SECS"), DEFAULT_CONFIRM_TIMEOUT)?,
            balance_poll_interval: seconds("BALANCE_POLL_SECS", var("BALANCE_POLL_SECS"), DEFAULT_POLL_INTERVAL)?,
        };

        let pricing = PricingConfig {
            oracle_url: var("PRICE_ORACLE_URL").unwrap_or_else(|| DEFAULT_PRICE_URL.to_string()),
            cache_ttl: seconds("PRICE_CACHE_SECS", var("PRICE_CACHE_SECS"), DEFAULT_CACHE_TTL)?,
            fallback_usd: match var("FALLBACK_PRICE_USD") {
                Some(raw) => parse_value("FALLBACK_PRICE_USD", &raw)?,
                None => DEFAULT_FALLBACK_PRICE,
            },
        };

        let coupon = match var("COUPON_CODE") {
            Some(code) => {
                let percent: Decimal = match var("COUPON_DISCOUNT") {
                    Some(raw) => parse_value("COUPON_DISCOUNT", &raw)?,
                    None => Decimal::ZERO,
                };
                if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                    return Err(StoreError::ConfigError(format!(
                        "COUPON_DISCOUNT must be between 0 and 100, got {percent}"
                    )));
                }
                Some(Coupon { code, percent })
            }
            None => None,
        };

        let language = match var("LANGUAGE") {
            Some(raw) => parse_value("LANGUAGE", &raw)?,
            None => Language::default(),
        };

        Ok(Self {
            backend,
            chain,
            pricing,
            coupon,
            language,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| StoreError::ConfigError(format!("{key}: {e}")))
}

fn parse<T>(key: &str, value: Option<String>, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(key, value.as_deref().unwrap_or(default))
}

fn seconds(key: &str, value: Option<String>, default: Duration) -> Result<Duration> {
    match value {
        Some(raw) => parse_value::<u64>(key, &raw).map(Duration::from_secs),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.backend.is_none());
        assert_eq!(config.chain.token_symbol, "MEMEXSOL");
        assert_eq!(config.chain.token_mint.to_string(), DEFAULT_TOKEN_MINT);
        assert_eq!(config.chain.confirm_timeout, Duration::from_secs(60));
        assert_eq!(config.pricing.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.pricing.fallback_usd, dec!(0.001));
        assert!(config.coupon.is_none());
        assert_eq!(config.language, Language::En);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("PRICE_CACHE_SECS", "10"),
            ("COUPON_CODE", "save10"),
            ("COUPON_DISCOUNT", "10"),
            ("LANGUAGE", "tr"),
        ])
        .unwrap();
        assert_eq!(config.backend.unwrap().anon_key, "anon");
        assert_eq!(config.pricing.cache_ttl, Duration::from_secs(10));
        assert_eq!(config.coupon.unwrap().percent, dec!(10));
        assert_eq!(config.language, Language::Tr);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            vec![("TOKEN_MINT", "not-base58!")],
            vec![("BALANCE_POLL_SECS", "soon")],
            vec![("COUPON_CODE", "x"), ("COUPON_DISCOUNT", "150")],
            vec![("SUPABASE_URL", "https://x.supabase.co")],
        ] {
            assert!(matches!(load(&vars), Err(StoreError::ConfigError(_))));
        }
    }
}
