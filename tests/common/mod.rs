#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokenshop::application::payment::PaymentFlow;
use tokenshop::domain::address::{Address, Signature};
use tokenshop::domain::catalog::{DEFAULT_PRODUCT_IMAGE, Product};
use tokenshop::domain::order::ShippingAddress;
use tokenshop::domain::payment::{Confirmation, TokenBalance, TransferTransaction};
use tokenshop::domain::ports::{ChainRpc, Filter, Query, Table, TableStore, WalletProvider};
use tokenshop::error::{ChainError, Result as StoreResult, StoreError, WalletError};
use tokenshop::infrastructure::in_memory::InMemoryBackend;
use tokio::sync::Notify;

pub const SIGNATURE: &str = "4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZAMdL4VZHirAn";

pub fn owner() -> Address {
    Address::new([11; 32])
}

pub fn recipient() -> Address {
    Address::new([22; 32])
}

pub fn mint() -> Address {
    Address::new([33; 32])
}

pub fn token_account(wallet: &Address) -> Address {
    Address::associated_token_address(wallet, &mint()).unwrap()
}

/// Scriptable wallet that records what it was asked to sign.
pub struct FakeWallet {
    pub connected: bool,
    pub connect_result: Result<Address, WalletError>,
    pub sign_result: Result<Signature, WalletError>,
    /// When set, signing waits for a permit.
    pub gate: Option<Arc<Notify>>,
    pub connect_calls: AtomicUsize,
    pub signed: Mutex<Vec<TransferTransaction>>,
}

impl FakeWallet {
    pub fn approving() -> Self {
        Self {
            connected: true,
            connect_result: Ok(owner()),
            sign_result: Ok(Signature::new(SIGNATURE)),
            gate: None,
            connect_calls: AtomicUsize::new(0),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            sign_result: Err(WalletError::from_provider(Some(4001), "User rejected the request.")),
            ..Self::approving()
        }
    }

    pub fn sign_calls(&self) -> usize {
        self.signed.lock().unwrap().len()
    }

    pub fn last_signed(&self) -> TransferTransaction {
        self.signed.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn public_key(&self) -> Option<Address> {
        self.connected.then(owner)
    }

    async fn connect(&self) -> Result<Address, WalletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_result.clone()
    }

    async fn sign_and_send_transaction(
        &self,
        tx: &TransferTransaction,
    ) -> Result<Signature, WalletError> {
        self.signed.lock().unwrap().push(tx.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.sign_result.clone()
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }
}

/// In-memory chain with token accounts keyed by address.
pub struct FakeChain {
    pub accounts: Mutex<HashMap<Address, TokenBalance>>,
    pub decimals: Result<Option<u8>, ChainError>,
    pub confirmation: Result<Confirmation, ChainError>,
    pub calls: AtomicUsize,
    pub decimals_calls: AtomicUsize,
}

impl FakeChain {
    /// Sender holds `balance` tokens and the recipient has a token account.
    pub fn funded(balance: Decimal, decimals: u8) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(token_account(&owner()), Self::balance(balance, decimals));
        accounts.insert(token_account(&recipient()), Self::balance(Decimal::ZERO, decimals));
        Self {
            accounts: Mutex::new(accounts),
            decimals: Ok(Some(decimals)),
            confirmation: Ok(Confirmation::default()),
            calls: AtomicUsize::new(0),
            decimals_calls: AtomicUsize::new(0),
        }
    }

    pub fn balance(ui_amount: Decimal, decimals: u8) -> TokenBalance {
        let raw = ui_amount * Decimal::from(10u64.pow(u32::from(decimals)));
        TokenBalance {
            amount: raw.trunc().try_into().unwrap_or(u64::MAX),
            decimals,
            ui_amount,
        }
    }

    pub fn without_account(self, wallet: &Address) -> Self {
        self.accounts.lock().unwrap().remove(&token_account(wallet));
        self
    }

    pub fn with_account(self, wallet: &Address, ui_amount: Decimal, decimals: u8) -> Self {
        self.set_balance(wallet, ui_amount, decimals);
        self
    }

    pub fn set_balance(&self, wallet: &Address, ui_amount: Decimal, decimals: u8) {
        self.accounts
            .lock()
            .unwrap()
            .insert(token_account(wallet), Self::balance(ui_amount, decimals));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainRpc for FakeChain {
    async fn latest_blockhash(&self) -> Result<String, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N".to_string())
    }

    async fn token_account_balance(&self, account: &Address) -> Result<TokenBalance, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .lock()
            .unwrap()
            .get(account)
            .copied()
            .ok_or_else(|| ChainError::AccountNotFound(account.to_string()))
    }

    async fn mint_decimals(&self, _mint: &Address) -> Result<Option<u8>, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        self.decimals.clone()
    }

    async fn confirm_transaction(&self, _signature: &Signature) -> Result<Confirmation, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.confirmation.clone()
    }
}

pub fn flow(wallet: Option<Arc<FakeWallet>>, chain: Arc<FakeChain>) -> PaymentFlow {
    PaymentFlow::new(
        wallet.map(|w| w as Arc<dyn WalletProvider>),
        chain,
        mint(),
    )
}

pub fn product(id: i64, price: Decimal, stock: u32) -> Product {
    Product {
        id: Some(id),
        name: format!("Product {id}"),
        description: "Test product".to_string(),
        price,
        image: DEFAULT_PRODUCT_IMAGE.to_string(),
        category: "skincare".to_string(),
        stock,
        product_code: None,
        barcode: None,
        cost_usd: None,
        rating: None,
        is_new: None,
        discount_percentage: None,
        created_at: None,
    }
}

pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Grace Hopper".to_string(),
        address_line1: "1 Compiler Way".to_string(),
        address_line2: None,
        city: "Arlington".to_string(),
        state: Some("VA".to_string()),
        zip_code: "22201".to_string(),
        country: "US".to_string(),
        email: "grace@example.com".to_string(),
        phone: "+1 555 0100".to_string(),
    }
}

/// Delegates to an in-memory backend but fails the first `failures` upserts.
pub struct FlakyStore {
    pub inner: InMemoryBackend,
    pub failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryBackend::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl TableStore for FlakyStore {
    async fn select(&self, table: Table, query: &Query) -> StoreResult<Vec<Value>> {
        self.inner.select(table, query).await
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        self.inner.insert(table, rows).await
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> StoreResult<Vec<Value>> {
        self.inner.update(table, filter, patch).await
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::BackendError {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.inner.upsert(table, rows).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<()> {
        self.inner.delete(table, filter).await
    }
}
