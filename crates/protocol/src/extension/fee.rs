//! Fee extension.
//!
//! Transform commands carry the flat price the customer agreed to; check
//! commands ask the registry to quote one operation.

use rybridge_core::payload::OrderPrice;
use rybridge_core::payload::OrderType;
use rybridge_core::Money;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::extension::ExtensionPayload;
use crate::request::Period;

pub const FEE_TRANSFORM_TYPE: &str = "ry.extension.v1.FeeTransform";
pub const FEE_CHECK_TYPE: &str = "ry.extension.v1.FeeCheck";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTransform {
    pub fee: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeOperation {
    Registration,
    Renewal,
    Transfer,
    Restore,
}

impl From<OrderType> for FeeOperation {
    fn from(order_type: OrderType) -> Self {
        match order_type {
            OrderType::Create => Self::Registration,
            OrderType::Renew => Self::Renewal,
            OrderType::Redeem => Self::Restore,
            OrderType::TransferIn => Self::Transfer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCheck {
    pub operation: FeeOperation,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub period: Option<Period>,
}

/// Flat price for a transform command.
pub fn encode_transform(price: Option<&OrderPrice>) -> Result<Option<ExtensionPayload>, EncodeError> {
    let Some(price) = price else {
        return Ok(None);
    };
    let fee = price.to_money().map_err(|e| EncodeError::Invalid {
        field: "price",
        reason: e.to_string(),
    })?;
    ExtensionPayload::encode(FEE_TRANSFORM_TYPE, &FeeTransform { fee }).map(Some)
}

/// Quote request for a check command.
pub fn encode_check(check: Option<&FeeCheck>) -> Result<Option<ExtensionPayload>, EncodeError> {
    check
        .map(|c| ExtensionPayload::encode(FEE_CHECK_TYPE, c))
        .transpose()
}
