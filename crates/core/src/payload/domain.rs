//! Domain job payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accreditation::{Accreditation, AccreditationTld};
use crate::payload::common::{
    DomainLaunchData, IdnData, Nameserver, OrderPrice, SecdnsData, SecdnsUpdateData,
};
use crate::payload::contacts::{ContactsIntent, DomainContact};
use crate::types::EntityId;

fn default_period() -> i32 {
    1
}

/// `provision_domain_create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCreateData {
    pub name: String,
    pub pw: String,
    #[serde(default = "default_period")]
    pub period: i32,
    pub accreditation: Accreditation,
    pub accreditation_tld: AccreditationTld,
    #[serde(default)]
    pub contacts: Vec<DomainContact>,
    #[serde(default)]
    pub nameservers: Vec<Nameserver>,
    #[serde(default)]
    pub price: Option<OrderPrice>,
    #[serde(default)]
    pub launch_data: Option<DomainLaunchData>,
    #[serde(default)]
    pub secdns: Option<SecdnsData>,
    #[serde(default)]
    pub idn: Option<IdnData>,
    #[serde(default)]
    pub provision_domain_id: Option<EntityId>,
}

/// `provision_domain_renew`. Period, expiry and price come from the
/// provision record, which may change after the job was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRenewData {
    pub name: String,
    pub accreditation: Accreditation,
    pub provision_domain_renew_id: EntityId,
}

/// `provision_domain_redeem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRedeemData {
    pub name: String,
    pub accreditation: Accreditation,
    pub provision_domain_redeem_id: EntityId,
    #[serde(default)]
    pub price: Option<OrderPrice>,
}

/// `provision_domain_redeem_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRedeemReportData {
    pub name: String,
    pub accreditation: Accreditation,
    pub accreditation_tld: AccreditationTld,
    pub provision_domain_redeem_id: EntityId,
    #[serde(default)]
    pub price: Option<OrderPrice>,
}

/// `provision_domain_transfer_in_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTransferInData {
    pub name: String,
    pub pw: String,
    #[serde(default = "default_period")]
    pub period: i32,
    pub accreditation: Accreditation,
    #[serde(default)]
    pub price: Option<OrderPrice>,
}

/// `provision_domain_transfer_action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTransferActionData {
    pub name: String,
    pub accreditation: Accreditation,
    /// Recorded transfer status, e.g. `clientApproved`.
    pub transfer_status: String,
    #[serde(default)]
    pub pw: Option<String>,
}

/// Nameserver additions and removals for a domain update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameserverIntent {
    #[serde(default)]
    pub add: Vec<Nameserver>,
    #[serde(default)]
    pub rem: Vec<Nameserver>,
}

impl NameserverIntent {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.rem.is_empty()
    }
}

/// `provision_domain_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainUpdateData {
    pub name: String,
    pub accreditation: Accreditation,
    pub accreditation_tld: AccreditationTld,
    #[serde(default)]
    pub provision_domain_update_id: Option<EntityId>,
    #[serde(default)]
    pub contacts: Option<ContactsIntent>,
    #[serde(default)]
    pub nameservers: Option<NameserverIntent>,
    /// Lock name (`update`, `delete`, `transfer`, `renew`, `hold`) to
    /// desired state.
    #[serde(default)]
    pub locks: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub secdns: Option<SecdnsUpdateData>,
    #[serde(default)]
    pub pw: Option<String>,
}

/// Order type a domain availability check is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Create,
    Renew,
    Redeem,
    TransferIn,
}

/// `validate_domain_available`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCheckData {
    pub name: String,
    pub accreditation: Accreditation,
    pub order_type: OrderType,
    #[serde(default)]
    pub period: Option<i32>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// `validate_domain_claims`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainClaimsCheckData {
    pub name: String,
    pub accreditation: Accreditation,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn accreditation_json() -> serde_json::Value {
        json!({
            "tenant_id": Uuid::from_u128(1),
            "provider_id": Uuid::from_u128(2),
            "provider_instance_id": Uuid::from_u128(3),
            "accreditation_id": Uuid::from_u128(4),
            "accreditation_name": "acc"
        })
    }

    #[test]
    fn update_distinguishes_absent_and_empty_intents() {
        let data: DomainUpdateData = serde_json::from_value(json!({
            "name": "example.com",
            "accreditation": accreditation_json(),
            "accreditation_tld": {"accreditation_tld_id": Uuid::from_u128(5)},
            "nameservers": {"add": [], "rem": []}
        }))
        .unwrap();

        assert!(data.contacts.is_none());
        assert!(data.locks.is_none());
        assert!(data.nameservers.as_ref().is_some_and(NameserverIntent::is_empty));
    }

    #[test]
    fn update_decodes_locks_and_legacy_contacts() {
        let data: DomainUpdateData = serde_json::from_value(json!({
            "name": "example.com",
            "accreditation": accreditation_json(),
            "accreditation_tld": {"accreditation_tld_id": Uuid::from_u128(5)},
            "contacts": [{"type": "admin", "handle": "a1"}],
            "locks": {"update": true, "transfer": false}
        }))
        .unwrap();

        let locks = data.locks.unwrap();
        assert_eq!(locks.get("update"), Some(&true));
        assert_eq!(locks.get("transfer"), Some(&false));
        assert!(data.contacts.unwrap().replaces_existing());
    }

    #[test]
    fn create_defaults_period_to_one_year() {
        let data: DomainCreateData = serde_json::from_value(json!({
            "name": "example.com",
            "pw": "secret",
            "accreditation": accreditation_json(),
            "accreditation_tld": {"accreditation_tld_id": Uuid::from_u128(5)}
        }))
        .unwrap();
        assert_eq!(data.period, 1);
        assert!(data.contacts.is_empty());
    }

    #[test]
    fn check_rejects_unknown_order_type() {
        let result: Result<DomainCheckData, _> = serde_json::from_value(json!({
            "name": "example.com",
            "accreditation": accreditation_json(),
            "order_type": "delete"
        }));
        assert!(result.is_err());
    }
}
