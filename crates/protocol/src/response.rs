//! Registry responses consumed by the remote state client.

use rybridge_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::request::{ContactType, DomainContact};

/// Protocol-level outcome attached to every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryResponse {
    pub is_success: bool,
    #[serde(default)]
    pub epp_code: i32,
    #[serde(default)]
    pub epp_message: String,
}

/// Response envelope: outcome plus command-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RyResponse<T> {
    pub registry_response: RegistryResponse,
    pub data: Option<T>,
}

/// Registry-side snapshot of a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfoResponse {
    pub name: String,
    #[serde(default)]
    pub registrant: Option<String>,
    #[serde(default)]
    pub contacts: Vec<DomainContact>,
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub created_date: Option<Timestamp>,
    #[serde(default)]
    pub expiry_date: Option<Timestamp>,
}

impl DomainInfoResponse {
    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Host names compare case-insensitively.
    pub fn has_nameserver(&self, name: &str) -> bool {
        self.nameservers
            .iter()
            .any(|ns| ns.eq_ignore_ascii_case(name))
    }

    /// Handles currently attached under `contact_type`.
    pub fn contact_handles(&self, contact_type: ContactType) -> Vec<String> {
        if contact_type == ContactType::Registrant {
            return self.registrant.iter().cloned().collect();
        }
        self.contacts
            .iter()
            .filter(|c| c.contact_type == contact_type)
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Registry-side snapshot of a host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfoResponse {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
}
