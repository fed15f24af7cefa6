use super::orders::OrderService;
use super::payment::PaymentFlow;
use crate::config::Config;
use crate::domain::address::{Address, Signature};
use crate::domain::amount::TokenAmount;
use crate::domain::cart::{Cart, Coupon, Quote};
use crate::domain::order::{Order, ShippingAddress};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{ChainRpcRef, WalletProviderRef};
use crate::domain::settings::AdminSettings;
use crate::error::{CheckoutError, StoreError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Pays for a cart and records the resulting order.
///
/// Payment comes first. The order is written only after the payment flow
/// returns a signature, and the cart is left to the caller to clear once
/// [`Checkout::place_order`] succeeds.
pub struct Checkout {
    payment: Arc<PaymentFlow>,
    orders: OrderService,
    recipient: Address,
    coupon: Option<Coupon>,
}

impl Checkout {
    /// # Arguments
    ///
    /// * `payment` - The payment flow shared with the rest of the storefront.
    /// * `orders` - Where paid orders are written.
    /// * `recipient` - The shop's payment wallet.
    /// * `coupon` - The coupon customers may enter, if any.
    pub fn new(
        payment: Arc<PaymentFlow>,
        orders: OrderService,
        recipient: Address,
        coupon: Option<Coupon>,
    ) -> Self {
        Self {
            payment,
            orders,
            recipient,
            coupon,
        }
    }

    /// Wires a checkout for the configured mint, payment wallet and coupon.
    pub fn from_config(
        config: &Config,
        wallet: Option<WalletProviderRef>,
        chain: ChainRpcRef,
        orders: OrderService,
    ) -> Self {
        let payment = PaymentFlow::new(wallet, chain, config.chain.token_mint);
        Self::new(
            Arc::new(payment),
            orders,
            config.chain.payment_wallet,
            config.coupon.clone(),
        )
    }

    /// Quote for `cart`, applying `coupon_code` when it matches the shop coupon.
    pub fn quote(
        &self,
        cart: &Cart,
        settings: &AdminSettings,
        coupon_code: Option<&str>,
    ) -> Result<Quote, StoreError> {
        let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(code) => Some(
                self.coupon
                    .as_ref()
                    .filter(|c| c.accepts(code))
                    .ok_or_else(|| StoreError::ValidationError(format!("Invalid coupon: {code}")))?,
            ),
        };
        Ok(cart.quote(settings, coupon))
    }

    /// Pays for `cart` from the connected wallet and records a pending order
    /// under that wallet.
    ///
    /// A payment failure leaves nothing written. A failed write after a
    /// successful payment is reported as [`CheckoutError::OrderNotRecorded`]
    /// carrying the signature, and [`Checkout::record`] can be retried with
    /// the same order.
    pub async fn place_order(
        &self,
        cart: &Cart,
        settings: &AdminSettings,
        coupon_code: Option<&str>,
        shipping_address: ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        shipping_address.validate()?;
        let quote = self.quote(cart, settings, coupon_code)?;
        let amount = TokenAmount::new(quote.total)?;

        let correlation = format!("CHK-{}", Utc::now().timestamp_millis());
        let request = PaymentRequest::new(amount, self.recipient, correlation);
        let receipt = self.payment.pay(&request).await?;

        let order = Order::paid(
            cart,
            &quote,
            shipping_address,
            receipt.payer,
            receipt.signature,
        );
        self.record(&order).await
    }

    /// Writes a paid order. Safe to repeat: the order id is derived from the
    /// payment signature.
    pub async fn record(&self, order: &Order) -> Result<Order, CheckoutError> {
        match self.orders.record_order(order).await {
            Ok(stored) => {
                info!(order_id = %stored.id, "checkout complete");
                Ok(stored)
            }
            Err(source) => {
                let transaction_id = order
                    .transaction_id
                    .clone()
                    .unwrap_or_else(|| Signature::new(""));
                error!(order_id = %order.id, %transaction_id, error = %source, "paid order not recorded");
                Err(CheckoutError::OrderNotRecorded {
                    transaction_id,
                    source,
                })
            }
        }
    }
}
