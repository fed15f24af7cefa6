use super::address::{Address, Signature};
use super::cart::{Cart, Quote};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters of the transaction signature used in the order id.
const ORDER_ID_SIG_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::ValidationError(format!(
                "Unknown order status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub zip_code: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Checks the fields the checkout form marks as required.
    pub fn validate(&self) -> Result<(), StoreError> {
        let required = [
            ("fullName", &self.full_name),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::ValidationError(format!(
                "Missing shipping fields: {}",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(StoreError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        Ok(())
    }
}

/// A purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
}

/// An order row in the `orders` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_wallet: Address,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Order id derived from the payment signature, so a retried write
    /// targets the same row.
    pub fn id_for(transaction_id: &Signature) -> String {
        let prefix: String = transaction_id
            .as_str()
            .chars()
            .take(ORDER_ID_SIG_CHARS)
            .collect();
        format!("ORD-{prefix}")
    }

    /// Builds a pending order for a paid cart.
    pub fn paid(
        cart: &Cart,
        quote: &Quote,
        shipping_address: ShippingAddress,
        user_wallet: Address,
        transaction_id: Signature,
    ) -> Self {
        let items = cart
            .items()
            .iter()
            .map(|item| OrderItem {
                product_id: item.product.id.unwrap_or_default(),
                name: item.product.name.clone(),
                quantity: item.quantity,
                price: item.product.effective_price(),
                image: item.product.image.clone(),
            })
            .collect();
        Self {
            id: Self::id_for(&transaction_id),
            user_wallet,
            items,
            shipping_address,
            subtotal: quote.subtotal,
            shipping_cost: quote.shipping,
            discount: quote.discount,
            total: quote.total,
            status: OrderStatus::Pending,
            transaction_id: Some(transaction_id),
            tracking_number: None,
            created_at: None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ada Lovelace".to_string(),
        address_line1: "1 Analytical St".to_string(),
        address_line2: None,
        city: "London".to_string(),
        state: None,
        zip_code: "N1".to_string(),
        country: "UK".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+44 000".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::sample_product;
    use crate::domain::settings::AdminSettings;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in ["pending", "processing", "shipped", "delivered", "cancelled"] {
            assert_eq!(status.parse::<OrderStatus>().unwrap().as_str(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_shipping_address_validation() {
        assert!(sample_shipping_address().validate().is_ok());

        let mut address = sample_shipping_address();
        address.city = " ".to_string();
        address.phone.clear();
        let err = address.validate().unwrap_err().to_string();
        assert!(err.contains("city"));
        assert!(err.contains("phone"));

        let mut address = sample_shipping_address();
        address.email = "nope".to_string();
        assert!(address.validate().is_err());
    }

    #[test]
    fn test_paid_order_keyed_by_signature() {
        let mut cart = Cart::new();
        cart.add(sample_product(7, dec!(40), 3), 2);
        let quote = cart.quote(&AdminSettings::default(), None);
        let sig = Signature::new("5VERYlongSignatureValue1234567890");

        let order = Order::paid(
            &cart,
            &quote,
            sample_shipping_address(),
            Address::new([9; 32]),
            sig.clone(),
        );

        assert_eq!(order.id, "ORD-5VERYlongSignatu");
        assert_eq!(order.id, Order::id_for(&sig));
        assert_eq!(order.items[0].product_id, 7);
        assert_eq!(order.subtotal, dec!(80));
        assert_eq!(order.shipping_cost, dec!(25));
        assert_eq!(order.total, dec!(105));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_shipping_address_json_is_camel_case() {
        let json = serde_json::to_value(sample_shipping_address()).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("addressLine2").is_none());
    }
}
