//! Decimal price to units/nanos conversion.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const NANOS_PER_UNIT: f64 = 1e9;

/// Amount split into whole currency units and billionths of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
}

impl Money {
    /// Convert `amount` expressed in `1/fraction` units.
    ///
    /// `units = floor(amount / fraction)` and
    /// `nanos = round((amount / fraction - units) * 1e9)`.
    pub fn from_fraction(
        amount: f64,
        fraction: i32,
        currency_code: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if fraction <= 0 {
            return Err(CoreError::Validation(format!(
                "price fraction must be positive, got {fraction}"
            )));
        }
        if !amount.is_finite() {
            return Err(CoreError::Validation(format!(
                "price amount must be finite, got {amount}"
            )));
        }

        let value = amount / f64::from(fraction);
        let units = value.floor();
        let mut nanos = ((value - units) * NANOS_PER_UNIT).round() as i64;
        let mut units = units as i64;
        // Rounding can carry a full unit, e.g. 0.9999999999.
        if nanos >= NANOS_PER_UNIT as i64 {
            units += 1;
            nanos -= NANOS_PER_UNIT as i64;
        }

        Ok(Self {
            currency_code: currency_code.into(),
            units,
            nanos: nanos as i32,
        })
    }

    /// Decimal value in whole currency units.
    pub fn to_decimal(&self) -> f64 {
        self.units as f64 + f64::from(self.nanos) / NANOS_PER_UNIT
    }
}
