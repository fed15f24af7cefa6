use super::address::{Address, Signature};
use super::payment::{Confirmation, TokenBalance, TransferTransaction};
use crate::error::{ChainError, Result, WalletError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Browser wallet capability, satisfied by an adapter around the injected provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn is_connected(&self) -> bool;
    async fn public_key(&self) -> Option<Address>;
    /// May prompt the user.
    async fn connect(&self) -> std::result::Result<Address, WalletError>;
    async fn sign_and_send_transaction(
        &self,
        tx: &TransferTransaction,
    ) -> std::result::Result<Signature, WalletError>;
    async fn disconnect(&self) -> std::result::Result<(), WalletError>;
}

/// Chain RPC node.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn latest_blockhash(&self) -> std::result::Result<String, ChainError>;
    /// Fails with `ChainError::AccountNotFound` when the account does not exist.
    async fn token_account_balance(
        &self,
        account: &Address,
    ) -> std::result::Result<TokenBalance, ChainError>;
    /// `None` when the mint account cannot be parsed.
    async fn mint_decimals(&self, mint: &Address) -> std::result::Result<Option<u8>, ChainError>;
    async fn confirm_transaction(
        &self,
        signature: &Signature,
    ) -> std::result::Result<Confirmation, ChainError>;
}

/// Spot price of the settlement token in USD.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_usd_price(&self) -> Result<Decimal>;
}

/// Collections held by the backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Products,
    Categories,
    Orders,
    AdminSettings,
    HeroBannerContent,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Categories => "categories",
            Table::Orders => "orders",
            Table::AdminSettings => "admin_settings",
            Table::HeroBannerContent => "hero_banner_content",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match (row.get(&self.column), &self.value) {
            (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Some(a), b) => a == b,
            (None, _) => false,
        }
    }
}

/// Select parameters: conjunctive filters, one sort column, optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some((column.into(), true));
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some((column.into(), false));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table-style backend-as-a-service client.
///
/// Every call returns data or an error; mutating calls return the affected rows.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>>;
    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<Vec<Value>>;
    /// Inserts or merges on the primary key `id`.
    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>>;
    async fn delete(&self, table: Table, filter: &Filter) -> Result<()>;
}

pub type WalletProviderRef = Arc<dyn WalletProvider>;
pub type ChainRpcRef = Arc<dyn ChainRpc>;
pub type PriceSourceBox = Box<dyn PriceSource>;
pub type TableStoreRef = Arc<dyn TableStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_numeric_equality() {
        let row = json!({ "id": 3, "name": "x" });
        assert!(Filter::equals("id", 3).matches(&row));
        assert!(Filter::equals("id", 3.0).matches(&row));
        assert!(!Filter::equals("id", 4).matches(&row));
        assert!(Filter::equals("name", "x").matches(&row));
        assert!(!Filter::equals("missing", "x").matches(&row));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new()
            .filter(Filter::equals("user_wallet", "abc"))
            .order_desc("created_at")
            .limit(1);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.order_by, Some(("created_at".to_string(), false)));
        assert_eq!(query.limit, Some(1));
    }
}
