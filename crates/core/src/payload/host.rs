//! Host job payloads.

use serde::{Deserialize, Serialize};

use crate::accreditation::{Accreditation, AccreditationTld};

/// `provision_host_create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCreateData {
    pub host_name: String,
    #[serde(default)]
    pub addrs: Vec<String>,
    /// Accreditation that manages the host object.
    pub host_accreditation: Accreditation,
    /// Accreditation the current order is placed against.
    pub accreditation: Accreditation,
    pub accreditation_tld: AccreditationTld,
}

/// `provision_host_update`. `addrs` is the desired full address set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUpdateData {
    pub host_name: String,
    #[serde(default)]
    pub addrs: Vec<String>,
    pub accreditation: Accreditation,
}

/// `provision_host_delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDeleteData {
    pub host_name: String,
    pub accreditation: Accreditation,
}

/// `validate_host_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCheckData {
    pub host_name: String,
    pub accreditation: Accreditation,
}
