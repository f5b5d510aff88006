use async_trait::async_trait;
use rybridge_core::payload::DomainRenewData;
use rybridge_db::JobTx;
use rybridge_protocol::extension::{extension_map, fee, ExtensionName};
use rybridge_protocol::request::{DomainRenewRequest, Period};
use rybridge_protocol::RyRequest;
use tracing::Span;

use super::{BuildOutcome, JobHandler};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

/// Period, expiry and price come from the provision record rather than
/// the payload so a renew that was already applied is not repeated.
pub struct DomainRenew;

#[async_trait]
impl JobHandler for DomainRenew {
    type Payload = DomainRenewData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: DomainRenewData,
    ) -> Result<BuildOutcome, HandlerError> {
        let renew = tx
            .get_provision_domain_renew(data.provision_domain_renew_id)
            .await?;
        if renew.period == 0 {
            tracing::info!(parent: span, domain = %data.name, "Renew period is zero");
            return Ok(BuildOutcome::complete("Renew period is zero, nothing to renew"));
        }

        let extensions = extension_map([(
            ExtensionName::Fee,
            fee::encode_transform(renew.price().as_ref())?,
        )]);
        let request = DomainRenewRequest {
            name: data.name,
            period: Period::years(renew.period),
            current_expiry_date: renew.current_expiry_date,
            extensions,
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainRenew(request),
        ))
    }
}
