use async_trait::async_trait;
use chrono::Utc;
use rybridge_core::payload::{DomainRedeemData, DomainRedeemReportData};
use rybridge_core::types::Timestamp;
use rybridge_db::models::DomainRecord;
use rybridge_db::{JobTx, StoreError};
use rybridge_protocol::extension::rgp::RgpRestore;
use rybridge_protocol::extension::{extension_map, fee, rgp, ExtensionName};
use rybridge_protocol::request::DomainUpdateRequest;
use rybridge_protocol::RyRequest;
use tracing::Span;

use super::{tld_flag, BuildOutcome, JobHandler, RESTORE_REPORT_INCLUDES_FEE};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

/// Restore request for a domain in its redemption grace period.
pub struct DomainRedeem;

/// Restore report following an accepted restore request.
pub struct DomainRedeemReport;

async fn load_domain(tx: &mut dyn JobTx, name: &str) -> Result<DomainRecord, HandlerError> {
    tx.get_domain(name)
        .await?
        .ok_or_else(|| StoreError::not_found("domain", name).into())
}

fn format_date(date: Option<Timestamp>) -> String {
    date.map(|d| d.to_rfc3339()).unwrap_or_default()
}

/// Plain-text snapshot used as both the pre- and post-restore data.
///
/// `contacts` pairs a contact type name with a handle.
pub fn restore_report(domain: &DomainRecord, contacts: &[(String, String)]) -> String {
    let contacts = contacts
        .iter()
        .map(|(contact_type, handle)| format!("{contact_type}={handle}"))
        .collect::<Vec<_>>()
        .join(", ");
    [
        format!("Domain: {}", domain.name),
        format!("Status: {}", domain.statuses.join(", ")),
        format!("Contacts: {contacts}"),
        format!("Nameservers: {}", domain.nameservers.join(", ")),
        format!("Created: {}", format_date(domain.created_date)),
        format!("Expires: {}", format_date(domain.expiry_date)),
    ]
    .join("\n")
}

#[async_trait]
impl JobHandler for DomainRedeem {
    type Payload = DomainRedeemData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: DomainRedeemData,
    ) -> Result<BuildOutcome, HandlerError> {
        let domain = load_domain(tx, &data.name).await?;
        if domain.is_pending_restore() {
            tracing::info!(parent: span, domain = %data.name, "Domain already pending restore");
            return Ok(BuildOutcome::complete("Domain is already pending restore"));
        }

        let price = match data.price {
            Some(price) => Some(price),
            None => tx
                .get_provision_domain_redeem(data.provision_domain_redeem_id)
                .await?
                .price(),
        };
        let extensions = extension_map([
            (ExtensionName::Rgp, rgp::encode(Some(&RgpRestore::Request))?),
            (ExtensionName::Fee, fee::encode_transform(price.as_ref())?),
        ]);
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainUpdate(DomainUpdateRequest::extensions_only(data.name, extensions)),
        ))
    }
}

#[async_trait]
impl JobHandler for DomainRedeemReport {
    type Payload = DomainRedeemReportData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        tx: &mut dyn JobTx,
        data: DomainRedeemReportData,
    ) -> Result<BuildOutcome, HandlerError> {
        let domain = load_domain(tx, &data.name).await?;
        let redeem = tx
            .get_provision_domain_redeem(data.provision_domain_redeem_id)
            .await?;

        let mut contacts = Vec::with_capacity(domain.contacts.len());
        for contact in &domain.contacts {
            let type_name = tx
                .get_domain_contact_type_name(contact.domain_contact_type_id)
                .await?;
            contacts.push((type_name, contact.handle.clone()));
        }

        let restore = RgpRestore::Report {
            data: restore_report(&domain, &contacts),
            deleted_at: redeem.delete_date.or(domain.deleted_date),
            restored_at: Some(redeem.restore_date.unwrap_or_else(Utc::now)),
        };

        let include_fee = tld_flag(
            tx,
            data.accreditation_tld.accreditation_tld_id,
            RESTORE_REPORT_INCLUDES_FEE,
            false,
        )
        .await?;
        let price = include_fee
            .then(|| data.price.clone().or_else(|| redeem.price()))
            .flatten();

        let extensions = extension_map([
            (ExtensionName::Rgp, rgp::encode(Some(&restore))?),
            (ExtensionName::Fee, fee::encode_transform(price.as_ref())?),
        ]);
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainUpdate(DomainUpdateRequest::extensions_only(data.name, extensions)),
        ))
    }
}
