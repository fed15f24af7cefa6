use crate::domain::address::{Address, Signature};
use crate::domain::amount::TokenAmount;
use crate::domain::payment::{
    Confirmation, PaymentFailure, PaymentReceipt, PaymentRequest, PaymentResult, PaymentStage,
    TransferInstruction, TransferTransaction,
};
use crate::domain::ports::{ChainRpcRef, WalletProvider, WalletProviderRef};
use crate::error::WalletError;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Precision assumed when the mint account cannot be parsed.
pub const DEFAULT_DECIMALS: u8 = 9;

/// The checkout payment state machine.
///
/// Each call to [`PaymentFlow::process`] walks wallet check, balance check,
/// recipient resolution, transaction build, sign-and-send and confirmation,
/// and ends in exactly one [`PaymentResult`]. Nothing is retried; the caller
/// re-invokes the flow from `Idle`. Cart and order state are never touched
/// here: on success the caller records the order.
pub struct PaymentFlow {
    wallet: Option<WalletProviderRef>,
    chain: ChainRpcRef,
    mint: Address,
    decimals: OnceLock<u8>,
    in_flight: AtomicBool,
    stage: watch::Sender<PaymentStage>,
}

/// Clears the in-flight flag when an attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PaymentFlow {
    /// Creates a flow settling in `mint`.
    ///
    /// # Arguments
    ///
    /// * `wallet` - The injected wallet provider, `None` when the environment has none.
    /// * `chain` - The chain RPC client.
    /// * `mint` - The settlement token mint.
    pub fn new(wallet: Option<WalletProviderRef>, chain: ChainRpcRef, mint: Address) -> Self {
        let (stage, _) = watch::channel(PaymentStage::Idle);
        Self {
            wallet,
            chain,
            mint,
            decimals: OnceLock::new(),
            in_flight: AtomicBool::new(false),
            stage,
        }
    }

    pub fn mint(&self) -> &Address {
        &self.mint
    }

    /// Current stage of the active (or last) attempt.
    pub fn stage(&self) -> PaymentStage {
        *self.stage.borrow()
    }

    /// Observes stage changes, e.g. to disable the checkout trigger while busy.
    pub fn subscribe(&self) -> watch::Receiver<PaymentStage> {
        self.stage.subscribe()
    }

    /// Runs one payment attempt to a terminal result.
    ///
    /// Not re-entrant: a call made while another attempt is in flight returns
    /// `PaymentFailure::InProgress` without contacting the wallet or the chain.
    pub async fn process(&self, request: &PaymentRequest) -> PaymentResult {
        self.pay(request).await.map(|receipt| receipt.signature)
    }

    /// Like [`PaymentFlow::process`], but also reports which wallet paid.
    pub async fn pay(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentFailure> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(order_id = %request.order_id, "payment already in progress");
            return Err(PaymentFailure::InProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        info!(
            order_id = %request.order_id,
            amount = %request.amount,
            recipient = %request.recipient,
            "starting payment"
        );
        let result = self.run(request).await;
        match &result {
            Ok(receipt) => {
                info!(
                    order_id = %request.order_id,
                    signature = %receipt.signature,
                    payer = %receipt.payer,
                    "payment succeeded"
                );
                self.enter(PaymentStage::Succeeded);
            }
            Err(failure) => {
                warn!(order_id = %request.order_id, %failure, "payment failed");
                self.enter(PaymentStage::Failed);
            }
        }
        result
    }

    async fn run(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentFailure> {
        self.enter(PaymentStage::CheckingWalletConnection);
        let wallet = self
            .wallet
            .as_deref()
            .ok_or(PaymentFailure::WalletNotInstalled)?;
        let owner = connect(wallet).await?;

        self.enter(PaymentStage::CheckingBalance);
        let source = Address::associated_token_address(&owner, &self.mint)
            .map_err(|_| PaymentFailure::NoTokenAccount)?;
        let balance = self
            .chain
            .token_account_balance(&source)
            .await
            .map_err(|e| {
                debug!(%source, error = %e, "sender balance lookup failed");
                PaymentFailure::NoTokenAccount
            })?;
        let required = request.amount.value();
        if balance.ui_amount < required {
            return Err(PaymentFailure::InsufficientBalance {
                available: balance.ui_amount,
                required,
            });
        }

        self.enter(PaymentStage::ResolvingRecipient);
        let destination = Address::associated_token_address(&request.recipient, &self.mint)
            .map_err(|_| PaymentFailure::InvalidRecipient)?;
        self.chain
            .token_account_balance(&destination)
            .await
            .map_err(|e| {
                debug!(%destination, error = %e, "recipient token account lookup failed");
                PaymentFailure::InvalidRecipient
            })?;

        self.enter(PaymentStage::BuildingTransaction);
        let tx = self
            .build_transaction(owner, source, destination, request.amount)
            .await?;

        self.enter(PaymentStage::SigningAndSending);
        let signature = wallet
            .sign_and_send_transaction(&tx)
            .await
            .map_err(|e| match e {
                WalletError::UserRejected => PaymentFailure::UserRejected,
                WalletError::Provider(message) => PaymentFailure::SubmissionError(message),
            })?;
        if signature.is_empty() {
            return Err(PaymentFailure::SubmissionError(
                "transaction was not signed or sent".to_string(),
            ));
        }

        self.enter(PaymentStage::ConfirmingTransaction);
        let signature = confirm(self.chain.confirm_transaction(&signature).await, signature)?;
        Ok(PaymentReceipt {
            signature,
            payer: owner,
        })
    }

    async fn build_transaction(
        &self,
        owner: Address,
        source: Address,
        destination: Address,
        amount: TokenAmount,
    ) -> Result<TransferTransaction, PaymentFailure> {
        let recent_blockhash = self
            .chain
            .latest_blockhash()
            .await
            .map_err(|e| PaymentFailure::SubmissionError(e.to_string()))?;
        let decimals = self.decimals().await?;
        let base_units = amount
            .to_base_units(decimals)
            .filter(|units| *units > 0)
            .ok_or_else(|| {
                PaymentFailure::SubmissionError(format!(
                    "amount {amount} is not representable at {decimals} decimals"
                ))
            })?;
        debug!(%amount, decimals, base_units, "transfer amount computed");

        Ok(TransferTransaction {
            fee_payer: owner,
            recent_blockhash,
            instruction: TransferInstruction::new(source, destination, owner, base_units),
        })
    }

    /// Mint precision, queried once and kept for the life of the flow.
    async fn decimals(&self) -> Result<u8, PaymentFailure> {
        if let Some(decimals) = self.decimals.get() {
            return Ok(*decimals);
        }
        match self.chain.mint_decimals(&self.mint).await {
            Ok(Some(decimals)) => Ok(*self.decimals.get_or_init(|| decimals)),
            Ok(None) => {
                debug!(mint = %self.mint, "mint not parsed, using default decimals");
                Ok(DEFAULT_DECIMALS)
            }
            Err(e) => Err(PaymentFailure::SubmissionError(e.to_string())),
        }
    }

    fn enter(&self, stage: PaymentStage) {
        debug!(?stage, "payment stage");
        self.stage.send_replace(stage);
    }
}

/// Returns the wallet's address, connecting first when needed.
async fn connect(wallet: &dyn WalletProvider) -> Result<Address, PaymentFailure> {
    if wallet.is_connected().await
        && let Some(address) = wallet.public_key().await
    {
        return Ok(address);
    }
    wallet.connect().await.map_err(|e| {
        debug!(error = %e, "wallet connect failed");
        PaymentFailure::ConnectionRejected
    })
}

/// Maps the confirmation outcome. A confirmation that cannot be obtained
/// counts as success for an already-submitted transaction.
fn confirm(
    outcome: Result<Confirmation, crate::error::ChainError>,
    signature: Signature,
) -> PaymentResult {
    match outcome {
        Ok(Confirmation { err: Some(err) }) => {
            warn!(%signature, %err, "transaction rejected on chain");
            Err(PaymentFailure::OnChainRejected)
        }
        Ok(Confirmation { err: None }) => Ok(signature),
        Err(e) => {
            warn!(%signature, error = %e, "confirmation unavailable, treating submission as success");
            Ok(signature)
        }
    }
}
