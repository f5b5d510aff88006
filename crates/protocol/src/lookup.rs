//! Static lookup tables.
//!
//! Built once at process start and shared by reference with every
//! builder; nothing here is mutated after construction.

use std::collections::HashMap;

use crate::request::ContactType;

/// Lock name to the EPP client status it toggles.
const LOCK_STATUSES: [(&str, &str); 5] = [
    ("update", "clientUpdateProhibited"),
    ("delete", "clientDeleteProhibited"),
    ("transfer", "clientTransferProhibited"),
    ("renew", "clientRenewProhibited"),
    ("hold", "clientHold"),
];

const CONTACT_TYPES: [(&str, ContactType); 4] = [
    ("registrant", ContactType::Registrant),
    ("admin", ContactType::Admin),
    ("billing", ContactType::Billing),
    ("tech", ContactType::Tech),
];

#[derive(Debug, Clone)]
pub struct LookupTables {
    lock_statuses: HashMap<&'static str, &'static str>,
    contact_types: HashMap<&'static str, ContactType>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self {
            lock_statuses: LOCK_STATUSES.into_iter().collect(),
            contact_types: CONTACT_TYPES.into_iter().collect(),
        }
    }

    /// EPP status for a lock name, `None` for names that are not locks.
    pub fn lock_status(&self, lock: &str) -> Option<&'static str> {
        self.lock_statuses.get(lock).copied()
    }

    /// Wire contact type for a contact type name.
    pub fn contact_type(&self, name: &str) -> Option<ContactType> {
        self.contact_types.get(name).copied()
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_lock_maps_to_a_client_status() {
        let tables = LookupTables::new();
        assert_eq!(tables.lock_status("update"), Some("clientUpdateProhibited"));
        assert_eq!(tables.lock_status("delete"), Some("clientDeleteProhibited"));
        assert_eq!(tables.lock_status("transfer"), Some("clientTransferProhibited"));
        assert_eq!(tables.lock_status("renew"), Some("clientRenewProhibited"));
        assert_eq!(tables.lock_status("hold"), Some("clientHold"));
        assert_eq!(tables.lock_status("freeze"), None);
    }

    #[test]
    fn contact_type_names() {
        let tables = LookupTables::new();
        assert_eq!(tables.contact_type("admin"), Some(ContactType::Admin));
        assert_eq!(tables.contact_type("registrant"), Some(ContactType::Registrant));
        assert_eq!(tables.contact_type("owner"), None);
    }
}
