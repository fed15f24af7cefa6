//! Application layer: the payment flow and the services the storefront and
//! back-office screens call.
//!
//! Services own their ports and never hold global state; construct them with
//! the adapters (or fakes) they should talk to.

pub mod balance;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod payment;
pub mod pricing;
pub mod settings;

use crate::error::{Result, StoreError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

pub(crate) fn first_row<T: DeserializeOwned>(rows: Vec<Value>, what: &str) -> Result<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(what.to_string()))?;
    Ok(serde_json::from_value(row)?)
}

pub(crate) fn to_row<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
