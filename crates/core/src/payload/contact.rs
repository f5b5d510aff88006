//! Contact job payloads.

use serde::{Deserialize, Serialize};

use crate::accreditation::Accreditation;
use crate::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Individual,
    Organization,
}

/// One postal address record of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPostalInfo {
    /// `true` selects the internationalised (`int`) form, `false` the
    /// localised (`loc`) form.
    pub is_international: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub address3: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactData {
    #[serde(rename = "type")]
    pub kind: ContactKind,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub fax: Option<String>,
    #[serde(default)]
    pub postal_info: Vec<ContactPostalInfo>,
}

/// `provision_contact_create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCreateData {
    pub accreditation: Accreditation,
    pub provision_contact_id: EntityId,
    /// Handle chosen upstream; generated by the worker when absent.
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub pw: Option<String>,
    pub contact: ContactData,
}

/// `provision_contact_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdateData {
    pub accreditation: Accreditation,
    pub handle: String,
    pub contact: ContactData,
}

/// `provision_contact_delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDeleteData {
    pub accreditation: Accreditation,
    pub handle: String,
}

/// `validate_contact_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCheckData {
    pub accreditation: Accreditation,
    pub handle: String,
}
