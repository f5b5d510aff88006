//! Provision records the order system writes before submitting a job.

use rybridge_core::payload::OrderPrice;
use rybridge_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

fn price(amount: Option<f64>, currency: &Option<String>, fraction: Option<i32>) -> Option<OrderPrice> {
    match (amount, currency, fraction) {
        (Some(amount), Some(currency), Some(fraction)) => Some(OrderPrice {
            amount,
            currency: currency.clone(),
            fraction,
        }),
        _ => None,
    }
}

/// A row from `provision_domain_renew`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProvisionDomainRenew {
    pub id: EntityId,
    pub domain_name: String,
    /// Years still to be renewed. Zero means nothing is outstanding.
    pub period: i32,
    pub current_expiry_date: Timestamp,
    pub price_amount: Option<f64>,
    pub price_currency: Option<String>,
    pub price_fraction: Option<i32>,
}

impl ProvisionDomainRenew {
    pub fn price(&self) -> Option<OrderPrice> {
        price(self.price_amount, &self.price_currency, self.price_fraction)
    }
}

/// A row from `provision_domain_redeem`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProvisionDomainRedeem {
    pub id: EntityId,
    pub domain_name: String,
    pub delete_date: Option<Timestamp>,
    pub restore_date: Option<Timestamp>,
    pub price_amount: Option<f64>,
    pub price_currency: Option<String>,
    pub price_fraction: Option<i32>,
}

impl ProvisionDomainRedeem {
    pub fn price(&self) -> Option<OrderPrice> {
        price(self.price_amount, &self.price_currency, self.price_fraction)
    }
}
