use async_trait::async_trait;
use rybridge_core::payload::{DomainTransferActionData, DomainTransferInData};
use rybridge_db::JobTx;
use rybridge_protocol::extension::{extension_map, fee, ExtensionName};
use rybridge_protocol::request::{DomainTransferRequest, Period, TransferOp};
use rybridge_protocol::{Extensions, RyRequest};
use tracing::Span;

use super::{BuildOutcome, JobHandler};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub struct DomainTransferIn;

/// Approve, reject or cancel a pending transfer.
pub struct DomainTransferAction;

#[async_trait]
impl JobHandler for DomainTransferIn {
    type Payload = DomainTransferInData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: DomainTransferInData,
    ) -> Result<BuildOutcome, HandlerError> {
        let extensions = extension_map([(
            ExtensionName::Fee,
            fee::encode_transform(data.price.as_ref())?,
        )]);
        let request = DomainTransferRequest {
            name: data.name,
            op: TransferOp::Request,
            pw: Some(data.pw),
            period: Some(Period::years(data.period)),
            extensions,
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainTransfer(request),
        ))
    }
}

#[async_trait]
impl JobHandler for DomainTransferAction {
    type Payload = DomainTransferActionData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.domain
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: DomainTransferActionData,
    ) -> Result<BuildOutcome, HandlerError> {
        let op = TransferOp::from_transfer_status(&data.transfer_status).ok_or_else(|| {
            HandlerError::validation(format!(
                "no transfer action for status `{}`",
                data.transfer_status
            ))
        })?;
        let request = DomainTransferRequest {
            name: data.name,
            op,
            pw: data.pw,
            period: None,
            extensions: Extensions::new(),
        };
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainTransfer(request),
        ))
    }
}
