use crate::error::StoreError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest precision whose scaling factor fits in a `u64`.
const MAX_DECIMALS: u8 = 19;

/// A strictly positive quantity of the settlement token, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TokenAmount(Decimal);

impl TokenAmount {
    pub fn new(value: Decimal) -> Result<Self, StoreError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(StoreError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Scales to the token's base units, truncating any remainder.
    ///
    /// Returns `None` if the result does not fit in a `u64`.
    pub fn to_base_units(&self, decimals: u8) -> Option<u64> {
        if decimals > MAX_DECIMALS {
            return None;
        }
        let factor = Decimal::from(10u64.pow(u32::from(decimals)));
        self.0.checked_mul(factor)?.floor().to_u64()
    }
}

impl TryFrom<Decimal> for TokenAmount {
    type Error = StoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TokenAmount> for Decimal {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Converts a raw base-unit balance back into display units.
pub fn from_base_units(raw: u64, decimals: u8) -> Decimal {
    let scale = u32::from(decimals.min(28));
    Decimal::from_i128_with_scale(i128::from(raw), scale).normalize()
}
