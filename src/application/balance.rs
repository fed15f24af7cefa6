use crate::domain::address::Address;
use crate::domain::payment::{BalanceSnapshot, WalletSession};
use crate::domain::ports::{ChainRpcRef, WalletProviderRef};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Default interval between display balance checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Best-effort balance display for the connected wallet.
///
/// Independent of the payment flow. Every failure shows as a zero balance.
#[derive(Clone)]
pub struct BalanceMonitor {
    wallet: Option<WalletProviderRef>,
    chain: ChainRpcRef,
    mint: Address,
}

impl BalanceMonitor {
    pub fn new(wallet: Option<WalletProviderRef>, chain: ChainRpcRef, mint: Address) -> Self {
        Self {
            wallet,
            chain,
            mint,
        }
    }

    /// Reports whether a wallet is present and connected, without prompting.
    pub async fn check_connection(&self) -> WalletSession {
        let Some(wallet) = &self.wallet else {
            return WalletSession::default();
        };
        if !wallet.is_connected().await {
            return WalletSession::default();
        }
        WalletSession {
            connected: true,
            address: wallet.public_key().await,
        }
    }

    /// Token balance of `owner` in display units; zero on any failure.
    pub async fn check_balance(&self, owner: &Address) -> Decimal {
        let account = match Address::associated_token_address(owner, &self.mint) {
            Ok(account) => account,
            Err(e) => {
                warn!(%owner, error = %e, "could not derive token account");
                return Decimal::ZERO;
            }
        };
        match self.chain.token_account_balance(&account).await {
            Ok(balance) => balance.ui_amount,
            Err(e) => {
                warn!(%owner, error = %e, "balance check failed");
                Decimal::ZERO
            }
        }
    }

    /// One poll: the connected wallet's balance, or zero.
    pub async fn snapshot(&self) -> BalanceSnapshot {
        let session = self.check_connection().await;
        let amount = match (session.connected, session.address) {
            (true, Some(owner)) => self.check_balance(&owner).await,
            _ => {
                debug!("no connected wallet, showing zero balance");
                Decimal::ZERO
            }
        };
        BalanceSnapshot {
            amount,
            fetched_at: Instant::now(),
        }
    }

    /// Polls every `interval`. Receivers are notified after the first poll
    /// and whenever the amount changes; `fetched_at` is refreshed on every
    /// poll. The task ends once every receiver is dropped.
    pub fn spawn(self, interval: Duration) -> (watch::Receiver<BalanceSnapshot>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(BalanceSnapshot::zero());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut first = true;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }
                let snapshot = self.snapshot().await;
                tx.send_if_modified(|current| {
                    let changed = first || current.amount != snapshot.amount;
                    *current = snapshot;
                    changed
                });
                first = false;
            }
        });
        (rx, handle)
    }
}
