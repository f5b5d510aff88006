use async_trait::async_trait;
use rybridge_core::payload::{self, DomainCreateData, Nameserver};
use rybridge_db::JobTx;
use rybridge_protocol::extension::{extension_map, fee, idn, launch, secdns, ExtensionName};
use rybridge_protocol::request::{
    ContactType, DomainContact, DomainCreateRequest, DomainNameservers, HostAttr, Period,
};
use rybridge_protocol::{LookupTables, RyRequest};
use tracing::Span;

use super::{tld_flag, BuildOutcome, JobHandler, HOST_OBJECT_SUPPORTED};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub struct DomainCreate;

/// Registrant handle and the remaining typed contacts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitContacts {
    pub registrant: Option<String>,
    pub contacts: Vec<DomainContact>,
}

/// Separate the registrant from the other contacts. Unknown contact types
/// are kept as `unspecified`.
pub fn split_contacts(
    tables: &LookupTables,
    span: &Span,
    contacts: &[payload::DomainContact],
) -> Result<SplitContacts, HandlerError> {
    let mut split = SplitContacts::default();
    for contact in contacts {
        let handle = contact.handle.clone().ok_or_else(|| {
            HandlerError::validation(format!("{} contact has no handle", contact.contact_type))
        })?;
        match tables.contact_type(&contact.contact_type) {
            Some(ContactType::Registrant) => split.registrant = Some(handle),
            Some(contact_type) => split.contacts.push(DomainContact::new(contact_type, handle)),
            None => {
                tracing::warn!(
                    parent: span,
                    contact_type = %contact.contact_type,
                    "Unrecognised contact type, sending as unspecified",
                );
                split
                    .contacts
                    .push(DomainContact::new(ContactType::Unspecified, handle));
            }
        }
    }
    Ok(split)
}

fn nameservers(nameservers: &[Nameserver], host_objects: bool) -> Option<DomainNameservers> {
    if nameservers.is_empty() {
        return None;
    }
    Some(if host_objects {
        DomainNameservers::HostObjects(nameservers.iter().map(|ns| ns.name.clone()).collect())
    } else {
        DomainNameservers::HostAttributes(
            nameservers
                .iter()
                .map(|ns| HostAttr {
                    name: ns.name.clone(),
                    addresses: ns.ip_addresses.clone(),
                })
                .collect(),
        )
    })
}

#[async_trait]
impl JobHandler for DomainCreate {
    type Payload = DomainCreateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: DomainCreateData,
    ) -> Result<BuildOutcome, HandlerError> {
        let host_objects = tld_flag(
            tx,
            data.accreditation_tld.accreditation_tld_id,
            HOST_OBJECT_SUPPORTED,
            true,
        )
        .await?;
        let SplitContacts {
            registrant,
            contacts,
        } = split_contacts(&ctx.tables, span, &data.contacts)?;

        let extensions = extension_map([
            (ExtensionName::Fee, fee::encode_transform(data.price.as_ref())?),
            (
                ExtensionName::Launch,
                launch::encode_create(data.launch_data.as_ref())?,
            ),
            (ExtensionName::Secdns, secdns::encode_create(data.secdns.as_ref())?),
            (ExtensionName::Idn, idn::encode(data.idn.as_ref())?),
        ]);

        let request = DomainCreateRequest {
            nameservers: nameservers(&data.nameservers, host_objects),
            name: data.name,
            period: Period::years(data.period),
            pw: data.pw,
            registrant,
            contacts,
            extensions,
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainCreate(request),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrant_is_split_out_and_unknown_types_kept() {
        let tables = LookupTables::new();
        let split = split_contacts(
            &tables,
            &Span::none(),
            &[
                payload::DomainContact::new("registrant", "reg-1"),
                payload::DomainContact::new("admin", "adm-1"),
                payload::DomainContact::new("reseller", "res-1"),
            ],
        )
        .unwrap();

        assert_eq!(split.registrant.as_deref(), Some("reg-1"));
        assert_eq!(
            split.contacts,
            [
                DomainContact::new(ContactType::Admin, "adm-1"),
                DomainContact::new(ContactType::Unspecified, "res-1"),
            ]
        );
    }

    #[test]
    fn contact_without_handle_is_rejected() {
        let tables = LookupTables::new();
        let contact = payload::DomainContact {
            contact_type: "tech".into(),
            handle: None,
        };
        assert!(split_contacts(&tables, &Span::none(), &[contact]).is_err());
    }

    #[test]
    fn nameserver_form_follows_host_object_support() {
        let list = [Nameserver {
            name: "ns1.example.net".into(),
            ip_addresses: vec!["192.0.2.1".into()],
        }];
        assert_eq!(
            nameservers(&list, true),
            Some(DomainNameservers::HostObjects(vec!["ns1.example.net".into()]))
        );
        assert!(matches!(
            nameservers(&list, false),
            Some(DomainNameservers::HostAttributes(attrs)) if attrs[0].addresses == ["192.0.2.1"]
        ));
        assert!(nameservers(&[], true).is_none());
    }
}
