//! Domain contact intent with its two accepted JSON shapes.
//!
//! Older producers send a flat list, `[{"type": "admin", "handle": "h1"}]`,
//! meaning "replace every contact of the listed types, registrant
//! included". Newer producers send `{"add": [...], "rem": [...]}`. The
//! shapes are mutually exclusive; decoding tries the flat list first.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One contact reference inside a domain payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContact {
    /// Contact type name (`registrant`, `admin`, `billing`, `tech`).
    #[serde(rename = "type")]
    pub contact_type: String,
    /// Registry handle. May be missing on removals; it is then resolved
    /// from stored or remote state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl DomainContact {
    pub fn new(contact_type: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            contact_type: contact_type.into(),
            handle: Some(handle.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsAddRem {
    #[serde(default)]
    pub add: Vec<DomainContact>,
    #[serde(default)]
    pub rem: Vec<DomainContact>,
}

/// Canonical in-memory form of a contacts intent set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactsIntent {
    /// Flat list: replace all contacts of each listed type.
    LegacyAll(Vec<DomainContact>),
    /// Explicit additions and removals.
    AddRem(ContactsAddRem),
}

impl ContactsIntent {
    /// Contacts requested to be present after the update.
    pub fn additions(&self) -> &[DomainContact] {
        match self {
            Self::LegacyAll(list) => list,
            Self::AddRem(set) => &set.add,
        }
    }

    /// Contacts explicitly requested to be removed. The legacy shape has
    /// none; its removals are implied by the types it lists.
    pub fn removals(&self) -> &[DomainContact] {
        match self {
            Self::LegacyAll(_) => &[],
            Self::AddRem(set) => &set.rem,
        }
    }

    /// Whether existing contacts of each listed type are replaced.
    pub fn replaces_existing(&self) -> bool {
        matches!(self, Self::LegacyAll(_))
    }

    pub fn is_empty(&self) -> bool {
        self.additions().is_empty() && self.removals().is_empty()
    }
}

impl<'de> Deserialize<'de> for ContactsIntent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;

        if let Ok(list) = serde_json::from_value::<Vec<DomainContact>>(raw.clone()) {
            return Ok(Self::LegacyAll(list));
        }

        serde_json::from_value::<ContactsAddRem>(raw)
            .map(Self::AddRem)
            .map_err(|e| {
                D::Error::custom(format!(
                    "contacts must be a list or an {{add, rem}} object: {e}"
                ))
            })
    }
}

impl Serialize for ContactsIntent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::LegacyAll(list) if !list.is_empty() => list.serialize(serializer),
            Self::LegacyAll(_) => ContactsAddRem::default().serialize(serializer),
            Self::AddRem(set) => set.serialize(serializer),
        }
    }
}
