//! Availability checks. All of them go to the query queue and answer on
//! the validation queue.

use async_trait::async_trait;
use rybridge_core::payload::{
    ContactCheckData, DomainCheckData, DomainClaimsCheckData, HostCheckData,
};
use rybridge_db::JobTx;
use rybridge_protocol::extension::fee::{self, FeeCheck};
use rybridge_protocol::extension::{extension_map, launch, ExtensionName};
use rybridge_protocol::request::{
    ContactCheckRequest, DomainCheckRequest, HostCheckRequest, Period,
};
use rybridge_protocol::RyRequest;
use tracing::Span;

use super::{BuildOutcome, JobHandler};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub struct DomainCheck;
pub struct DomainClaimsCheck;
pub struct HostCheck;
pub struct ContactCheck;

#[async_trait]
impl JobHandler for DomainCheck {
    type Payload = DomainCheckData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.validation
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: DomainCheckData,
    ) -> Result<BuildOutcome, HandlerError> {
        let check = FeeCheck {
            operation: data.order_type.into(),
            currency: data.currency,
            period: data.period.map(Period::years),
        };
        let extensions = extension_map([(ExtensionName::Fee, fee::encode_check(Some(&check))?)]);
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainCheck(DomainCheckRequest {
                names: vec![data.name],
                extensions,
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for DomainClaimsCheck {
    type Payload = DomainClaimsCheckData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.validation
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: DomainClaimsCheckData,
    ) -> Result<BuildOutcome, HandlerError> {
        let extensions = extension_map([(
            ExtensionName::Launch,
            Some(launch::encode_claims_check()?),
        )]);
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::DomainCheck(DomainCheckRequest {
                names: vec![data.name],
                extensions,
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for HostCheck {
    type Payload = HostCheckData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.validation
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: HostCheckData,
    ) -> Result<BuildOutcome, HandlerError> {
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::HostCheck(HostCheckRequest {
                names: vec![data.host_name],
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for ContactCheck {
    type Payload = ContactCheckData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.validation
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: ContactCheckData,
    ) -> Result<BuildOutcome, HandlerError> {
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::ContactCheck(ContactCheckRequest {
                ids: vec![data.handle],
            }),
        ))
    }
}
