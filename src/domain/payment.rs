use super::address::{Address, Signature, TOKEN_PROGRAM_ID};
use super::amount::TokenAmount;
use super::locale::Language;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

/// SPL Token `Transfer` instruction tag.
const TRANSFER_TAG: u8 = 3;

/// One checkout attempt: pay `amount` tokens to `recipient` for `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: TokenAmount,
    pub recipient: Address,
    pub order_id: String,
}

impl PaymentRequest {
    pub fn new(amount: TokenAmount, recipient: Address, order_id: impl Into<String>) -> Self {
        Self {
            amount,
            recipient,
            order_id: order_id.into(),
        }
    }
}

/// Connection state of the wallet provider as seen by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletSession {
    pub connected: bool,
    pub address: Option<Address>,
}

/// A token balance as last observed on chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    pub amount: Decimal,
    pub fetched_at: Instant,
}

impl BalanceSnapshot {
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
            fetched_at: Instant::now(),
        }
    }
}

/// Balance of a token account as reported by the RPC node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    /// Raw amount in base units.
    pub amount: u64,
    pub decimals: u8,
    /// Amount in display units.
    pub ui_amount: Decimal,
}

/// Outcome of waiting for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Confirmation {
    /// Error reported by the chain when the transaction failed to execute.
    pub err: Option<String>,
}

/// Where a payment attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentStage {
    #[default]
    Idle,
    CheckingWalletConnection,
    CheckingBalance,
    ResolvingRecipient,
    BuildingTransaction,
    SigningAndSending,
    ConfirmingTransaction,
    Succeeded,
    Failed,
}

impl PaymentStage {
    /// Stages during which the checkout trigger must stay disabled.
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            PaymentStage::Idle | PaymentStage::Succeeded | PaymentStage::Failed
        )
    }
}

/// Why a payment attempt ended without a transfer being accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentFailure {
    #[error("wallet provider is not installed")]
    WalletNotInstalled,
    #[error("wallet connection was rejected")]
    ConnectionRejected,
    #[error("sender has no token account for the settlement token")]
    NoTokenAccount,
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },
    #[error("recipient has no token account for the settlement token")]
    InvalidRecipient,
    #[error("user rejected the transaction")]
    UserRejected,
    #[error("transaction submission failed: {0}")]
    SubmissionError(String),
    #[error("transaction was rejected on chain")]
    OnChainRejected,
    #[error("a payment is already in progress")]
    InProgress,
}

impl PaymentFailure {
    /// User-facing text for the failure.
    pub fn localized(&self, lang: Language, symbol: &str) -> String {
        match self {
            PaymentFailure::WalletNotInstalled => lang
                .pick(
                    "Phantom Wallet not found. Please install Phantom Wallet and reload the page.",
                    "Phantom Wallet bulunamadı. Lütfen Phantom Wallet'ı yükleyin ve sayfayı yenileyin.",
                    "لم يتم العثور على محفظة Phantom. يرجى تثبيت المحفظة وإعادة تحميل الصفحة.",
                )
                .to_string(),
            PaymentFailure::ConnectionRejected => lang
                .pick(
                    "Wallet connection failed. Please connect your wallet.",
                    "Phantom Wallet bağlantısı başarısız. Lütfen cüzdanınızı bağlayın.",
                    "فشل الاتصال بالمحفظة. يرجى ربط محفظتك.",
                )
                .to_string(),
            PaymentFailure::NoTokenAccount => match lang {
                Language::En => format!(
                    "Could not check your {symbol} balance. Your token account may not exist."
                ),
                Language::Tr => format!(
                    "{symbol} bakiyesi kontrol edilemedi. Token hesabınız mevcut olmayabilir."
                ),
                Language::Ar => {
                    format!("تعذر التحقق من رصيد {symbol}. قد لا يكون حساب الرمز موجودًا.")
                }
            },
            PaymentFailure::InsufficientBalance {
                available,
                required,
            } => {
                let available = available.round_dp(2);
                let required = required.round_dp(2);
                match lang {
                    Language::En => format!(
                        "Insufficient {symbol} balance. Available: {available:.2}, Required: {required:.2}"
                    ),
                    Language::Tr => format!(
                        "Yetersiz {symbol} bakiyesi. Mevcut: {available:.2}, Gerekli: {required:.2}"
                    ),
                    Language::Ar => format!(
                        "رصيد {symbol} غير كافٍ. المتاح: {available:.2}، المطلوب: {required:.2}"
                    ),
                }
            }
            PaymentFailure::InvalidRecipient => match lang {
                Language::En => format!(
                    "The recipient's {symbol} token account was not found. Please use a valid recipient address."
                ),
                Language::Tr => format!(
                    "Alıcının {symbol} token hesabı bulunamadı. Lütfen geçerli bir alıcı adresi kullanın."
                ),
                Language::Ar => format!("لم يتم العثور على حساب {symbol} الخاص بالمستلم."),
            },
            PaymentFailure::UserRejected => lang
                .pick(
                    "The transaction was cancelled by the user.",
                    "İşlem kullanıcı tarafından iptal edildi.",
                    "تم إلغاء المعاملة من قبل المستخدم.",
                )
                .to_string(),
            PaymentFailure::SubmissionError(message) => match lang {
                Language::En => format!("Transaction error: {message}"),
                Language::Tr => format!("İşlem hatası: {message}"),
                Language::Ar => format!("خطأ في المعاملة: {message}"),
            },
            PaymentFailure::OnChainRejected => lang
                .pick(
                    "The transaction was rejected by the blockchain.",
                    "İşlem blockchain tarafından reddedildi.",
                    "تم رفض المعاملة من قبل البلوكشين.",
                )
                .to_string(),
            PaymentFailure::InProgress => lang
                .pick(
                    "A payment is already being processed.",
                    "Bir ödeme zaten işleniyor.",
                    "هناك عملية دفع قيد المعالجة بالفعل.",
                )
                .to_string(),
        }
    }
}

/// Terminal result of a payment attempt.
pub type PaymentResult = std::result::Result<Signature, PaymentFailure>;

/// A settled payment: the submission signature and the wallet that signed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub signature: Signature,
    pub payer: Address,
}

/// A single SPL Token transfer between two token accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInstruction {
    pub program_id: Address,
    pub source: Address,
    pub destination: Address,
    pub owner: Address,
    /// Amount in base units.
    pub amount: u64,
}

impl TransferInstruction {
    pub fn new(source: Address, destination: Address, owner: Address, amount: u64) -> Self {
        Self {
            program_id: TOKEN_PROGRAM_ID,
            source,
            destination,
            owner,
            amount,
        }
    }

    /// Instruction data as the token program decodes it.
    pub fn data(&self) -> [u8; 9] {
        let mut data = [0u8; 9];
        data[0] = TRANSFER_TAG;
        data[1..].copy_from_slice(&self.amount.to_le_bytes());
        data
    }
}

/// An unsigned transaction handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTransaction {
    pub fee_payer: Address,
    pub recent_blockhash: String,
    pub instruction: TransferInstruction,
}
