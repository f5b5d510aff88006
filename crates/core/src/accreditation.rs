//! Accreditation identity and outbound queue routing.

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Registry relationship a job is executed under.
///
/// Identity is the (tenant, provider, provider instance) triple plus the
/// accreditation id; the name is only used to derive queue names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accreditation {
    pub tenant_id: EntityId,
    #[serde(default)]
    pub tenant_name: String,
    pub provider_id: EntityId,
    #[serde(default)]
    pub provider_name: String,
    pub provider_instance_id: EntityId,
    #[serde(default)]
    pub provider_instance_name: String,
    pub accreditation_id: EntityId,
    pub accreditation_name: String,
}

impl Accreditation {
    /// Whether both accreditations point at the same registry relationship.
    pub fn same_identity(&self, other: &Accreditation) -> bool {
        self.tenant_id == other.tenant_id
            && self.provider_id == other.provider_id
            && self.provider_instance_id == other.provider_instance_id
            && self.accreditation_id == other.accreditation_id
    }

    /// Outbound queue for this accreditation.
    pub fn queue(&self, kind: QueueKind) -> String {
        destination_queue(&self.accreditation_name, kind)
    }
}

/// Accreditation-scoped TLD; keys TLD settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccreditationTld {
    pub accreditation_tld_id: EntityId,
    #[serde(default)]
    pub tld_id: Option<EntityId>,
    #[serde(default)]
    pub tld_name: String,
}

/// Which side of the registry interface a request is bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Mutating commands.
    Transform,
    /// Read-only info and check lookups.
    Query,
}

impl QueueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Query => "query",
        }
    }
}

/// `ry-<accreditation>-transform` or `ry-<accreditation>-query`.
pub fn destination_queue(accreditation_name: &str, kind: QueueKind) -> String {
    format!("ry-{accreditation_name}-{}", kind.as_str())
}
