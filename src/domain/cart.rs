use super::catalog::Product;
use super::settings::AdminSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.product.effective_price() * Decimal::from(self.quantity)
    }
}

/// In-memory shopping cart. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` of `product`, merging with an existing line.
    ///
    /// Quantities are capped at the product's stock.
    pub fn add(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let stock = product.stock;
        match self.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity).min(stock),
            None => self.items.push(CartItem {
                product,
                quantity: quantity.min(stock),
            }),
        }
        self.items.retain(|item| item.quantity > 0);
    }

    pub fn remove(&mut self, product_id: i64) {
        self.items.retain(|item| item.product.id != Some(product_id));
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == Some(product_id))
        {
            let wanted = u32::try_from(quantity).unwrap_or(u32::MAX);
            item.quantity = wanted.min(item.product.stock);
        }
        self.items.retain(|item| item.quantity > 0);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn quote(&self, settings: &AdminSettings, coupon: Option<&Coupon>) -> Quote {
        Quote::compute(self.subtotal(), settings, coupon)
    }
}

/// A percent-off coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub code: String,
    pub percent: Decimal,
}

impl Coupon {
    /// Case-insensitive code comparison.
    pub fn accepts(&self, code: &str) -> bool {
        !self.code.is_empty() && self.code.eq_ignore_ascii_case(code.trim())
    }
}

/// Price breakdown for a cart, in settlement-token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl Quote {
    pub fn compute(subtotal: Decimal, settings: &AdminSettings, coupon: Option<&Coupon>) -> Self {
        let shipping = settings.shipping_for(subtotal);
        let discount = coupon
            .map(|c| subtotal * c.percent / Decimal::ONE_HUNDRED)
            .unwrap_or_default();
        Self {
            subtotal,
            discount,
            shipping,
            total: subtotal - discount + shipping,
        }
    }
}
