use crate::domain::address::{Address, Signature};
use crate::domain::amount::from_base_units;
use crate::domain::payment::{Confirmation, TokenBalance};
use crate::domain::ports::ChainRpc;
use crate::error::ChainError;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Default time to wait for a submitted transaction.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
const COMMITMENT: &str = "confirmed";

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UiTokenAmount {
    amount: String,
    decimals: u8,
    ui_amount_string: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    confirmation_status: Option<String>,
    err: Option<Value>,
}

/// JSON-RPC client for a Solana node.
#[derive(Clone)]
pub struct SolanaRpc {
    client: Client,
    url: String,
    confirm_timeout: Duration,
}

impl SolanaRpc {
    pub fn new(url: impl Into<String>, confirm_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            confirm_timeout,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let response: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Rpc(format!("{method}: {e}")))?;

        if let Some(error) = response.error {
            debug!(method, code = error.code, message = %error.message, "rpc error");
            return Err(ChainError::Rpc(error.message));
        }
        response
            .result
            .ok_or_else(|| ChainError::Rpc(format!("{method}: empty result")))
    }
}

fn parse_balance(raw: UiTokenAmount) -> Result<TokenBalance, ChainError> {
    let amount = raw
        .amount
        .parse::<u64>()
        .map_err(|e| ChainError::Rpc(format!("bad token amount {}: {e}", raw.amount)))?;
    let ui_amount = raw
        .ui_amount_string
        .as_deref()
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or_else(|| from_base_units(amount, raw.decimals));
    Ok(TokenBalance {
        amount,
        decimals: raw.decimals,
        ui_amount,
    })
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn latest_blockhash(&self) -> Result<String, ChainError> {
        let result: WithContext<BlockhashValue> = self
            .call("getLatestBlockhash", json!([{ "commitment": COMMITMENT }]))
            .await?;
        Ok(result.value.blockhash)
    }

    async fn token_account_balance(&self, account: &Address) -> Result<TokenBalance, ChainError> {
        let result: WithContext<UiTokenAmount> = self
            .call(
                "getTokenAccountBalance",
                json!([account.to_string(), { "commitment": COMMITMENT }]),
            )
            .await
            .map_err(|e| match e {
                ChainError::Rpc(message) if message.contains("could not find account") => {
                    ChainError::AccountNotFound(account.to_string())
                }
                other => other,
            })?;
        parse_balance(result.value)
    }

    async fn mint_decimals(&self, mint: &Address) -> Result<Option<u8>, ChainError> {
        let result: WithContext<Option<Value>> = self
            .call(
                "getAccountInfo",
                json!([mint.to_string(), { "encoding": "jsonParsed", "commitment": COMMITMENT }]),
            )
            .await?;
        let decimals = result
            .value
            .as_ref()
            .and_then(|v| v.pointer("/data/parsed/info/decimals"))
            .and_then(Value::as_u64)
            .and_then(|d| u8::try_from(d).ok());
        Ok(decimals)
    }

    /// Polls signature status until the transaction reaches `confirmed`,
    /// fails on chain, or the timeout passes.
    async fn confirm_transaction(&self, signature: &Signature) -> Result<Confirmation, ChainError> {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            let result: WithContext<Vec<Option<SignatureStatus>>> = self
                .call(
                    "getSignatureStatuses",
                    json!([[signature.as_str()], { "searchTransactionHistory": true }]),
                )
                .await?;
            if let Some(Some(status)) = result.value.into_iter().next() {
                if let Some(err) = status.err.filter(|e| !e.is_null()) {
                    return Ok(Confirmation {
                        err: Some(err.to_string()),
                    });
                }
                if matches!(
                    status.confirmation_status.as_deref(),
                    Some("confirmed" | "finalized")
                ) {
                    return Ok(Confirmation::default());
                }
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(ChainError::Timeout(signature.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
