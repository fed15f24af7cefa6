use crate::domain::address::{Address, Signature};
use crate::domain::payment::TransferTransaction;
use crate::domain::ports::WalletProvider;
use crate::error::WalletError;
use async_trait::async_trait;

/// A wallet that is always connected to a fixed address and cannot sign.
///
/// Lets balance monitoring run from a terminal where no browser wallet exists.
#[derive(Debug, Clone, Copy)]
pub struct WatchOnlyWallet {
    address: Address,
}

impl WatchOnlyWallet {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl WalletProvider for WatchOnlyWallet {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn public_key(&self) -> Option<Address> {
        Some(self.address)
    }

    async fn connect(&self) -> Result<Address, WalletError> {
        Ok(self.address)
    }

    async fn sign_and_send_transaction(
        &self,
        _tx: &TransferTransaction,
    ) -> Result<Signature, WalletError> {
        Err(WalletError::Provider(
            "watch-only wallet cannot sign transactions".to_string(),
        ))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }
}
