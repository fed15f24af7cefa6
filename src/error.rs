use crate::domain::address::Signature;
use thiserror::Error;

/// Errors raised by the storefront services and their adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Backend error ({status}): {message}")]
    BackendError { status: u16, message: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Chain error: {0}")]
    ChainError(#[from] ChainError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a wallet provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("User rejected the request")]
    UserRejected,
    #[error("{0}")]
    Provider(String),
}

impl WalletError {
    /// EIP-1193 style code for "user rejected request".
    pub const USER_REJECTED_CODE: i64 = 4001;

    /// Classifies a raw provider failure the way injected wallets report it.
    pub fn from_provider(code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == Some(Self::USER_REJECTED_CODE)
            || message.contains("User rejected")
            || message.contains("User cancelled")
        {
            Self::UserRejected
        } else {
            Self::Provider(message)
        }
    }
}

/// Errors surfaced by the chain RPC port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("could not find account {0}")]
    AccountNotFound(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors from the checkout orchestration, which pays first and persists second.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Payment failed: {0}")]
    Payment(#[from] crate::domain::payment::PaymentFailure),
    #[error("Payment {transaction_id} succeeded but the order was not recorded: {source}")]
    OrderNotRecorded {
        transaction_id: Signature,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
