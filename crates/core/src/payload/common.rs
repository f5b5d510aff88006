//! Sub-objects shared by several payloads: price, nameservers and the
//! optional data that feeds protocol extensions.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::Timestamp;

/// Order price as stored by the ordering system.
///
/// `amount` is expressed in `1 / fraction` currency units, e.g.
/// `amount = 1045, fraction = 100` is 10.45.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPrice {
    pub amount: f64,
    pub currency: String,
    pub fraction: i32,
}

impl OrderPrice {
    pub fn to_money(&self) -> Result<Money, CoreError> {
        Money::from_fraction(self.amount, self.fraction, self.currency.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nameserver {
    pub name: String,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

/// Internationalised domain name data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdnData {
    pub idn_table: String,
    pub idn_uname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainLaunchData {
    #[serde(default)]
    pub claims: Option<ClaimsData>,
}

/// Trademark claims acknowledgement collected at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsData {
    /// `APPLICATION` or `REGISTRATION`; anything else maps to unknown.
    #[serde(rename = "type", default)]
    pub claim_type: Option<String>,
    #[serde(default, alias = "notice")]
    pub notices: Vec<ClaimsNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsNotice {
    pub notice_id: String,
    #[serde(default)]
    pub validator_id: Option<String>,
    #[serde(default)]
    pub not_after: Option<Timestamp>,
    #[serde(default)]
    pub accepted_date: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsData {
    pub key_tag: i32,
    pub algorithm: i32,
    pub digest_type: i32,
    pub digest: String,
    /// Accepted on input; never sent to the registry.
    #[serde(default)]
    pub key_data: Option<KeyData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyData {
    pub flags: i32,
    pub protocol: i32,
    pub algorithm: i32,
    pub public_key: String,
}

/// DS or key records. At most one family may be populated per block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsRecords {
    #[serde(default)]
    pub ds_data: Option<Vec<DsData>>,
    #[serde(default)]
    pub key_data: Option<Vec<KeyData>>,
}

/// DNSSEC data for a domain create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsData {
    #[serde(default)]
    pub max_sig_life: Option<i32>,
    #[serde(flatten)]
    pub records: SecdnsRecords,
}

/// DNSSEC changes for a domain update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsUpdateData {
    #[serde(default)]
    pub add: Option<SecdnsRecords>,
    #[serde(default)]
    pub rem: Option<SecdnsRecords>,
    #[serde(default)]
    pub max_sig_life: Option<i32>,
}
