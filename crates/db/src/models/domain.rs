//! Locally stored domain state.

use rybridge_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// RGP status a deleted domain carries while a restore is in flight.
pub const RGP_PENDING_RESTORE: &str = "pendingRestore";

/// A row from `domain`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DomainRow {
    pub id: EntityId,
    pub name: String,
    pub rgp_status: Option<String>,
    pub statuses: Vec<String>,
    pub created_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
    pub deleted_date: Option<Timestamp>,
}

/// A row from `domain_contact`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct StoredDomainContact {
    pub domain_contact_type_id: EntityId,
    pub handle: String,
}

/// A domain with its contact and host relations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRecord {
    pub id: EntityId,
    pub name: String,
    pub rgp_status: Option<String>,
    pub statuses: Vec<String>,
    pub created_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
    pub deleted_date: Option<Timestamp>,
    pub contacts: Vec<StoredDomainContact>,
    pub nameservers: Vec<String>,
}

impl DomainRecord {
    pub fn from_parts(
        row: DomainRow,
        contacts: Vec<StoredDomainContact>,
        nameservers: Vec<String>,
    ) -> Self {
        Self {
            id: row.id,
            name: row.name,
            rgp_status: row.rgp_status,
            statuses: row.statuses,
            created_date: row.created_date,
            expiry_date: row.expiry_date,
            deleted_date: row.deleted_date,
            contacts,
            nameservers,
        }
    }

    pub fn is_pending_restore(&self) -> bool {
        self.rgp_status.as_deref() == Some(RGP_PENDING_RESTORE)
    }
}
