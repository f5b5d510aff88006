//! Domain update reconciliation.
//!
//! The payload states the desired end state per aspect (contacts, password,
//! nameservers, locks, secDNS). Each step compares it with the current
//! state and stages the differences into add, rem and chg blocks. A legacy
//! contact list is the exception: it re-adds every listed contact and
//! removes every attached contact of the listed types.
//! Registry info is fetched lazily, at most once per message, and shared by
//! every step that needs it.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use rybridge_core::payload::{self, ContactsIntent, DomainUpdateData, NameserverIntent};
use rybridge_core::Accreditation;
use rybridge_db::JobTx;
use rybridge_protocol::extension::{extension_map, secdns, ExtensionName};
use rybridge_protocol::request::{
    ContactType, DomainAddRem, DomainChg, DomainContact, DomainUpdateRequest,
};
use rybridge_protocol::{DomainInfoResponse, Extensions, LookupTables, RyRequest};
use tracing::Span;

use super::{BuildOutcome, JobHandler};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;
use crate::remote::RemoteState;

pub struct DomainUpdate;

// ---------------------------------------------------------------------------
// Lazily loaded state
// ---------------------------------------------------------------------------

/// Registry-side domain info, fetched on first use.
pub struct RemoteDomain<'a> {
    remote: &'a dyn RemoteState,
    accreditation: &'a Accreditation,
    name: &'a str,
    info: Option<DomainInfoResponse>,
}

impl<'a> RemoteDomain<'a> {
    pub fn new(remote: &'a dyn RemoteState, accreditation: &'a Accreditation, name: &'a str) -> Self {
        Self {
            remote,
            accreditation,
            name,
            info: None,
        }
    }

    pub async fn get(&mut self) -> Result<&DomainInfoResponse, HandlerError> {
        let info = match self.info.take() {
            Some(info) => info,
            None => self.remote.domain_info(self.accreditation, self.name).await?,
        };
        Ok(self.info.insert(info))
    }

    pub fn is_fetched(&self) -> bool {
        self.info.is_some()
    }
}

/// Contact handles recorded locally for the domain, keyed by type name.
#[derive(Default)]
struct StoredContacts {
    loaded: Option<HashMap<String, Vec<String>>>,
}

impl StoredContacts {
    async fn handles(
        &mut self,
        tx: &mut dyn JobTx,
        domain: &str,
        contact_type: &str,
    ) -> Result<Vec<String>, HandlerError> {
        let loaded = match self.loaded.take() {
            Some(loaded) => loaded,
            None => {
                let mut by_type: HashMap<String, Vec<String>> = HashMap::new();
                if let Some(record) = tx.get_domain(domain).await? {
                    for contact in record.contacts {
                        let type_name = tx
                            .get_domain_contact_type_name(contact.domain_contact_type_id)
                            .await?;
                        by_type.entry(type_name).or_default().push(contact.handle);
                    }
                }
                by_type
            }
        };
        Ok(self
            .loaded
            .insert(loaded)
            .get(contact_type)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Request under construction, local to one build call.
#[derive(Debug, Default)]
pub struct UpdateDraft {
    pub add: DomainAddRem,
    pub rem: DomainAddRem,
    pub chg: DomainChg,
    pub extensions: Extensions,
    /// Send add and rem even when empty; set once nameservers were
    /// compared against registry info.
    pub materialize_blocks: bool,
}

impl UpdateDraft {
    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.rem.is_empty() && self.chg.is_empty() && self.extensions.is_empty()
    }

    pub fn into_request(self, name: String) -> Option<DomainUpdateRequest> {
        if self.is_noop() {
            return None;
        }
        let keep = self.materialize_blocks;
        let block = |block: DomainAddRem| (keep || !block.is_empty()).then_some(block);
        Some(DomainUpdateRequest {
            name,
            chg: (!self.chg.is_empty()).then_some(self.chg),
            add: block(self.add),
            rem: block(self.rem),
            extensions: self.extensions,
        })
    }
}

fn push_unique(list: &mut Vec<DomainContact>, contact: DomainContact) {
    if !list.contains(&contact) {
        list.push(contact);
    }
}

fn wire_type(tables: &LookupTables, span: &Span, name: &str) -> ContactType {
    tables.contact_type(name).unwrap_or_else(|| {
        tracing::warn!(parent: span, contact_type = %name, "Unrecognised contact type, sending as unspecified");
        ContactType::Unspecified
    })
}

fn require_handle(contact: &payload::DomainContact) -> Result<String, HandlerError> {
    contact.handle.clone().ok_or_else(|| {
        HandlerError::validation(format!("{} contact to add has no handle", contact.contact_type))
    })
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Everything a reconciliation step may read.
pub struct Reconcile<'a, 'r> {
    pub tables: &'a LookupTables,
    pub span: &'a Span,
    pub domain: &'a str,
    pub remote: &'a mut RemoteDomain<'r>,
}

impl Reconcile<'_, '_> {
    async fn contacts(
        &mut self,
        tx: &mut dyn JobTx,
        intent: &ContactsIntent,
        draft: &mut UpdateDraft,
    ) -> Result<(), HandlerError> {
        let mut stored = StoredContacts::default();
        // Types named in a legacy list replace what is attached now.
        let mut replaced: Vec<(&str, ContactType)> = Vec::new();

        for contact in intent.additions() {
            let handle = require_handle(contact)?;
            match wire_type(self.tables, self.span, &contact.contact_type) {
                ContactType::Registrant => draft.chg.registrant = Some(handle),
                contact_type => {
                    push_unique(&mut draft.add.contacts, DomainContact::new(contact_type, handle));
                    if !replaced.iter().any(|(_, t)| *t == contact_type) {
                        replaced.push((contact.contact_type.as_str(), contact_type));
                    }
                }
            }
        }

        if intent.replaces_existing() {
            for (type_name, contact_type) in replaced {
                let mut handles = stored.handles(tx, self.domain, type_name).await?;
                if handles.is_empty() {
                    handles = self.remote.get().await?.contact_handles(contact_type);
                }
                for handle in handles {
                    push_unique(&mut draft.rem.contacts, DomainContact::new(contact_type, handle));
                }
            }
            return Ok(());
        }

        for contact in intent.removals() {
            let contact_type = wire_type(self.tables, self.span, &contact.contact_type);
            if contact_type == ContactType::Registrant {
                tracing::warn!(parent: self.span, "Registrant cannot be removed, ignoring");
                continue;
            }
            let candidates = match &contact.handle {
                Some(handle) => vec![handle.clone()],
                None => stored.handles(tx, self.domain, &contact.contact_type).await?,
            };
            let attached = self.remote.get().await?.contact_handles(contact_type);
            if candidates.is_empty() {
                for handle in attached {
                    push_unique(&mut draft.rem.contacts, DomainContact::new(contact_type, handle));
                }
                continue;
            }
            for handle in candidates {
                if attached.contains(&handle) {
                    push_unique(&mut draft.rem.contacts, DomainContact::new(contact_type, handle));
                } else {
                    tracing::debug!(parent: self.span, handle = %handle, "Contact not attached remotely, dropping removal");
                }
            }
        }
        Ok(())
    }

    async fn nameservers(
        &mut self,
        intent: &NameserverIntent,
        draft: &mut UpdateDraft,
    ) -> Result<(), HandlerError> {
        if intent.is_empty() {
            return Ok(());
        }
        let info = self.remote.get().await?;
        draft.materialize_blocks = true;
        for ns in &intent.add {
            let duplicate = draft.add.nameservers.iter().any(|n| n.eq_ignore_ascii_case(&ns.name));
            if !info.has_nameserver(&ns.name) && !duplicate {
                draft.add.nameservers.push(ns.name.clone());
            }
        }
        for ns in &intent.rem {
            let duplicate = draft.rem.nameservers.iter().any(|n| n.eq_ignore_ascii_case(&ns.name));
            if info.has_nameserver(&ns.name) && !duplicate {
                draft.rem.nameservers.push(ns.name.clone());
            }
        }
        Ok(())
    }

    async fn locks(
        &mut self,
        locks: &BTreeMap<String, bool>,
        draft: &mut UpdateDraft,
    ) -> Result<(), HandlerError> {
        let mut wanted = Vec::with_capacity(locks.len());
        for (lock, &on) in locks {
            let status = self
                .tables
                .lock_status(lock)
                .ok_or_else(|| HandlerError::validation(format!("unknown lock `{lock}`")))?;
            wanted.push((status, on));
        }
        if wanted.is_empty() {
            return Ok(());
        }

        let info = self.remote.get().await?;
        for (status, on) in wanted {
            match (on, info.has_status(status)) {
                (true, false) => draft.add.statuses.push(status.to_string()),
                (false, true) => draft.rem.statuses.push(status.to_string()),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Reconcile `data` against current state into a draft.
pub async fn reconcile(
    tables: &LookupTables,
    span: &Span,
    remote: &mut RemoteDomain<'_>,
    tx: &mut dyn JobTx,
    data: &DomainUpdateData,
) -> Result<UpdateDraft, HandlerError> {
    let mut draft = UpdateDraft::default();
    let mut steps = Reconcile {
        tables,
        span,
        domain: &data.name,
        remote,
    };

    if let Some(contacts) = &data.contacts {
        steps.contacts(tx, contacts, &mut draft).await?;
    }
    if let Some(pw) = &data.pw {
        draft.chg.pw = Some(pw.clone());
    }
    if let Some(nameservers) = &data.nameservers {
        steps.nameservers(nameservers, &mut draft).await?;
    }
    if let Some(locks) = &data.locks {
        steps.locks(locks, &mut draft).await?;
    }
    draft.extensions = extension_map([(
        ExtensionName::Secdns,
        secdns::encode_update(data.secdns.as_ref())?,
    )]);
    Ok(draft)
}

#[async_trait]
impl JobHandler for DomainUpdate {
    type Payload = DomainUpdateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: DomainUpdateData,
    ) -> Result<BuildOutcome, HandlerError> {
        let mut remote = RemoteDomain::new(ctx.remote.as_ref(), &data.accreditation, &data.name);
        let draft = reconcile(&ctx.tables, span, &mut remote, tx, &data).await?;
        tracing::debug!(parent: span, remote_fetched = remote.is_fetched(), "Reconciled domain update");

        match draft.into_request(data.name.clone()) {
            Some(request) => Ok(BuildOutcome::dispatch(
                &data.accreditation,
                RyRequest::DomainUpdate(request),
            )),
            None => Ok(BuildOutcome::complete(
                "Domain already matches the requested state, no changes",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_is_noop() {
        let draft = UpdateDraft::default();
        assert!(draft.is_noop());
        assert!(draft.into_request("example.com".into()).is_none());
    }

    #[test]
    fn empty_blocks_are_omitted() {
        let mut draft = UpdateDraft::default();
        draft.add.statuses.push("clientUpdateProhibited".into());

        let request = draft.into_request("example.com".into()).unwrap();
        assert_eq!(request.add.unwrap().statuses, ["clientUpdateProhibited"]);
        assert!(request.rem.is_none());
        assert!(request.chg.is_none());
    }

    #[test]
    fn materialized_blocks_are_sent_empty() {
        let mut draft = UpdateDraft {
            materialize_blocks: true,
            ..UpdateDraft::default()
        };
        draft.add.nameservers.push("ns2.example.net".into());

        let request = draft.into_request("example.com".into()).unwrap();
        assert_eq!(request.add.unwrap().nameservers, ["ns2.example.net"]);
        assert_eq!(request.rem, Some(DomainAddRem::default()));
    }

    #[test]
    fn materialized_noop_sends_nothing() {
        let draft = UpdateDraft {
            materialize_blocks: true,
            ..UpdateDraft::default()
        };
        assert!(draft.into_request("example.com".into()).is_none());
    }

    #[test]
    fn password_alone_is_a_change() {
        let mut draft = UpdateDraft::default();
        draft.chg.pw = Some("new-secret".into());

        let request = draft.into_request("example.com".into()).unwrap();
        assert_eq!(request.chg.unwrap().pw.as_deref(), Some("new-secret"));
        assert!(request.add.is_none());
    }
}
