//! Commands sent to the registry interface.
//!
//! Every command is serialized as `{"command": "<name>", "request": {...}}`
//! so a single queue consumer can dispatch on the tag.

use rybridge_core::types::Timestamp;
use rybridge_core::QueueKind;
use serde::{Deserialize, Serialize};

use crate::extension::Extensions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Registrant,
    Admin,
    Billing,
    Tech,
    Unspecified,
}

impl ContactType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registrant => "registrant",
            Self::Admin => "admin",
            Self::Billing => "billing",
            Self::Tech => "tech",
            Self::Unspecified => "unspecified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Year,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub value: i32,
    pub unit: PeriodUnit,
}

impl Period {
    pub fn years(value: i32) -> Self {
        Self {
            value,
            unit: PeriodUnit::Year,
        }
    }
}

/// Typed contact reference on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContact {
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub id: String,
}

impl DomainContact {
    pub fn new(contact_type: ContactType, id: impl Into<String>) -> Self {
        Self {
            contact_type,
            id: id.into(),
        }
    }
}

/// Nameserver given by name and glue addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAttr {
    pub name: String,
    pub addresses: Vec<String>,
}

/// Nameservers either reference host objects by name or carry host
/// attributes, depending on what the registry supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "hosts", rename_all = "snake_case")]
pub enum DomainNameservers {
    HostObjects(Vec<String>),
    HostAttributes(Vec<HostAttr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCreateRequest {
    pub name: String,
    pub period: Period,
    pub pw: String,
    #[serde(default)]
    pub registrant: Option<String>,
    #[serde(default)]
    pub contacts: Vec<DomainContact>,
    #[serde(default)]
    pub nameservers: Option<DomainNameservers>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRenewRequest {
    pub name: String,
    pub period: Period,
    pub current_expiry_date: Timestamp,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

/// Add or remove block of a domain update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAddRem {
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<DomainContact>,
    #[serde(default)]
    pub statuses: Vec<String>,
}

impl DomainAddRem {
    pub fn is_empty(&self) -> bool {
        self.nameservers.is_empty() && self.contacts.is_empty() && self.statuses.is_empty()
    }
}

/// Change block of a domain update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainChg {
    #[serde(default)]
    pub registrant: Option<String>,
    #[serde(default)]
    pub pw: Option<String>,
}

impl DomainChg {
    pub fn is_empty(&self) -> bool {
        self.registrant.is_none() && self.pw.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainUpdateRequest {
    pub name: String,
    #[serde(default)]
    pub add: Option<DomainAddRem>,
    #[serde(default)]
    pub rem: Option<DomainAddRem>,
    #[serde(default)]
    pub chg: Option<DomainChg>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl DomainUpdateRequest {
    /// An update that only carries extensions (restore, report).
    pub fn extensions_only(name: impl Into<String>, extensions: Extensions) -> Self {
        Self {
            name: name.into(),
            add: None,
            rem: None,
            chg: None,
            extensions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOp {
    Request,
    Approve,
    Reject,
    Cancel,
}

impl TransferOp {
    /// Action implied by a recorded transfer status.
    pub fn from_transfer_status(status: &str) -> Option<Self> {
        match status {
            "clientApproved" | "client_approved" => Some(Self::Approve),
            "clientRejected" | "client_rejected" => Some(Self::Reject),
            "clientCancelled" | "client_cancelled" => Some(Self::Cancel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTransferRequest {
    pub name: String,
    pub op: TransferOp,
    #[serde(default)]
    pub pw: Option<String>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCheckRequest {
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfoRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCreateRequest {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddRem {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUpdateRequest {
    pub name: String,
    #[serde(default)]
    pub add: Option<HostAddRem>,
    #[serde(default)]
    pub rem: Option<HostAddRem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDeleteRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCheckRequest {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfoRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostalType {
    Int,
    Loc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: Vec<String>,
    pub city: String,
    #[serde(default)]
    pub sp: Option<String>,
    #[serde(default)]
    pub pc: Option<String>,
    pub cc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalInfo {
    #[serde(rename = "type")]
    pub postal_type: PostalType,
    pub name: String,
    #[serde(default)]
    pub org: Option<String>,
    pub address: PostalAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCreateRequest {
    pub id: String,
    pub postal_info: PostalInfo,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    pub email: String,
    pub pw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactChg {
    #[serde(default)]
    pub postal_info: Option<PostalInfo>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdateRequest {
    pub id: String,
    pub chg: ContactChg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCheckRequest {
    pub ids: Vec<String>,
}

/// Every command the worker can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "request", rename_all = "snake_case")]
pub enum RyRequest {
    DomainCreate(DomainCreateRequest),
    DomainRenew(DomainRenewRequest),
    DomainUpdate(DomainUpdateRequest),
    DomainTransfer(DomainTransferRequest),
    DomainCheck(DomainCheckRequest),
    DomainInfo(DomainInfoRequest),
    HostCreate(HostCreateRequest),
    HostUpdate(HostUpdateRequest),
    HostDelete(HostDeleteRequest),
    HostCheck(HostCheckRequest),
    HostInfo(HostInfoRequest),
    ContactCreate(ContactCreateRequest),
    ContactUpdate(ContactUpdateRequest),
    ContactDelete(ContactDeleteRequest),
    ContactCheck(ContactCheckRequest),
}

impl RyRequest {
    /// Checks and info lookups go to the query queue; everything else
    /// mutates registry state.
    pub fn queue_kind(&self) -> QueueKind {
        match self {
            Self::DomainCheck(_)
            | Self::DomainInfo(_)
            | Self::HostCheck(_)
            | Self::HostInfo(_)
            | Self::ContactCheck(_) => QueueKind::Query,
            Self::DomainCreate(_)
            | Self::DomainRenew(_)
            | Self::DomainUpdate(_)
            | Self::DomainTransfer(_)
            | Self::HostCreate(_)
            | Self::HostUpdate(_)
            | Self::HostDelete(_)
            | Self::ContactCreate(_)
            | Self::ContactUpdate(_)
            | Self::ContactDelete(_) => QueueKind::Transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_is_tagged_by_command() {
        let request = RyRequest::HostDelete(HostDeleteRequest {
            name: "ns1.example.com".into(),
        });
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"command": "host_delete", "request": {"name": "ns1.example.com"}})
        );
    }

    #[test]
    fn lookups_route_to_query_queue() {
        let info = RyRequest::DomainInfo(DomainInfoRequest {
            name: "example.com".into(),
        });
        let check = RyRequest::ContactCheck(ContactCheckRequest {
            ids: vec!["h1".into()],
        });
        let delete = RyRequest::ContactDelete(ContactDeleteRequest { id: "h1".into() });

        assert_eq!(info.queue_kind(), QueueKind::Query);
        assert_eq!(check.queue_kind(), QueueKind::Query);
        assert_eq!(delete.queue_kind(), QueueKind::Transform);
    }

    #[test]
    fn empty_extensions_are_omitted() {
        let request = DomainUpdateRequest::extensions_only("example.com", Extensions::new());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("extensions").is_none());
    }

    #[test]
    fn transfer_status_selects_action() {
        assert_eq!(
            TransferOp::from_transfer_status("clientApproved"),
            Some(TransferOp::Approve)
        );
        assert_eq!(
            TransferOp::from_transfer_status("clientRejected"),
            Some(TransferOp::Reject)
        );
        assert_eq!(
            TransferOp::from_transfer_status("clientCancelled"),
            Some(TransferOp::Cancel)
        );
        assert_eq!(TransferOp::from_transfer_status("pending"), None);
    }

    #[test]
    fn add_rem_emptiness() {
        let mut block = DomainAddRem::default();
        assert!(block.is_empty());
        block.statuses.push("clientHold".into());
        assert!(!block.is_empty());
        assert!(DomainChg::default().is_empty());
    }
}
