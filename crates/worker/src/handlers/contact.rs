use async_trait::async_trait;
use rybridge_core::payload::{
    ContactCreateData, ContactData, ContactDeleteData, ContactKind, ContactPostalInfo,
    ContactUpdateData,
};
use rybridge_core::types::EntityId;
use rybridge_db::JobTx;
use rybridge_protocol::request::{
    ContactChg, ContactCreateRequest, ContactDeleteRequest, ContactUpdateRequest, PostalAddress,
    PostalInfo, PostalType,
};
use rybridge_protocol::RyRequest;
use tracing::Span;
use uuid::Uuid;

use super::{BuildOutcome, JobHandler};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub struct ContactCreate;
pub struct ContactUpdate;
pub struct ContactDelete;

/// Registry handle for a provisioned contact: `c` plus 15 hex digits of the
/// provision id, within the 16 characters registries accept.
pub fn generate_handle(provision_contact_id: EntityId) -> String {
    let hex = provision_contact_id.simple().to_string();
    format!("c{}", &hex[..15])
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn postal_block(kind: ContactKind, info: &ContactPostalInfo) -> Result<PostalInfo, HandlerError> {
    let person = [info.first_name.as_deref(), info.last_name.as_deref()]
        .into_iter()
        .filter_map(non_empty)
        .collect::<Vec<_>>()
        .join(" ");
    let org = non_empty(info.org_name.as_deref());
    let name = if person.is_empty() {
        org.clone()
            .ok_or_else(|| HandlerError::validation("contact has neither a person nor an organisation name"))?
    } else {
        person
    };

    let street = [
        Some(info.address1.as_str()),
        info.address2.as_deref(),
        info.address3.as_deref(),
    ]
    .into_iter()
    .filter_map(non_empty)
    .collect();

    Ok(PostalInfo {
        postal_type: if info.is_international {
            PostalType::Int
        } else {
            PostalType::Loc
        },
        name,
        org: match kind {
            ContactKind::Organization => org,
            ContactKind::Individual => None,
        },
        address: PostalAddress {
            street,
            city: info.city.clone(),
            sp: non_empty(info.state.as_deref()),
            pc: non_empty(info.postal_code.as_deref()),
            cc: info.country_code.to_ascii_uppercase(),
        },
    })
}

/// Postal info from the first postal entry, `None` when there is none.
pub fn postal_info(contact: &ContactData) -> Result<Option<PostalInfo>, HandlerError> {
    contact
        .postal_info
        .first()
        .map(|info| postal_block(contact.kind, info))
        .transpose()
}

#[async_trait]
impl JobHandler for ContactCreate {
    type Payload = ContactCreateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.contact
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: ContactCreateData,
    ) -> Result<BuildOutcome, HandlerError> {
        let postal_info = postal_info(&data.contact)?
            .ok_or_else(|| HandlerError::validation("contact has no postal info"))?;

        let handle = match data.handle {
            Some(handle) => handle,
            None => {
                let handle = generate_handle(data.provision_contact_id);
                tracing::debug!(parent: span, handle = %handle, "Generated contact handle");
                handle
            }
        };
        tx.set_provision_contact_handle(data.provision_contact_id, &handle)
            .await?;

        let request = ContactCreateRequest {
            id: handle,
            postal_info,
            voice: data.contact.phone,
            fax: data.contact.fax,
            email: data.contact.email,
            pw: data.pw.unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::ContactCreate(request),
        ))
    }
}

#[async_trait]
impl JobHandler for ContactUpdate {
    type Payload = ContactUpdateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.contact
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: ContactUpdateData,
    ) -> Result<BuildOutcome, HandlerError> {
        let chg = ContactChg {
            postal_info: postal_info(&data.contact)?,
            voice: data.contact.phone,
            fax: data.contact.fax,
            email: Some(data.contact.email),
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::ContactUpdate(ContactUpdateRequest {
                id: data.handle,
                chg,
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for ContactDelete {
    type Payload = ContactDeleteData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.contact
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: ContactDeleteData,
    ) -> Result<BuildOutcome, HandlerError> {
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::ContactDelete(ContactDeleteRequest { id: data.handle }),
        ))
    }
}
