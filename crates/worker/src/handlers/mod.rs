//! Request builders, one handler per job type.
//!
//! A handler turns a decoded payload into either a request for the
//! registry interface or a "nothing to send" completion. Handlers never
//! change job status themselves; the guard does that from the outcome.

use async_trait::async_trait;
use rybridge_core::types::EntityId;
use rybridge_core::Accreditation;
use rybridge_db::JobTx;
use rybridge_protocol::RyRequest;
use serde::de::DeserializeOwned;
use tracing::Span;

use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub mod check;
pub mod contact;
pub mod domain_create;
pub mod domain_redeem;
pub mod domain_renew;
pub mod domain_transfer;
pub mod domain_update;
pub mod host;

pub use check::{ContactCheck, DomainCheck, DomainClaimsCheck, HostCheck};
pub use contact::{ContactCreate, ContactDelete, ContactUpdate};
pub use domain_create::DomainCreate;
pub use domain_redeem::{DomainRedeem, DomainRedeemReport};
pub use domain_renew::DomainRenew;
pub use domain_transfer::{DomainTransferAction, DomainTransferIn};
pub use domain_update::DomainUpdate;
pub use host::{HostCreate, HostDelete, HostUpdate};

// ---------------------------------------------------------------------------
// TLD setting keys
// ---------------------------------------------------------------------------

pub const HOST_OBJECT_SUPPORTED: &str = "tld.dns.host_object_supported";
pub const HOST_IP_REQUIRED_NON_AUTH: &str = "tld.order.host_ip_required_non_auth";
pub const IPV6_SUPPORT: &str = "tld.dns.ipv6_support";
pub const RESTORE_REPORT_INCLUDES_FEE: &str = "tld.lifecycle.restore_report_includes_fee_ext";

/// Boolean TLD setting; unset or non-boolean values fall back to `default`.
pub async fn tld_flag(
    tx: &mut dyn JobTx,
    accreditation_tld_id: EntityId,
    key: &str,
    default: bool,
) -> Result<bool, HandlerError> {
    let value = tx.get_tld_setting(accreditation_tld_id, key).await?;
    Ok(value
        .and_then(|v| v.as_bool())
        .unwrap_or(default))
}

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// A request addressed to an accreditation queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub queue: String,
    pub request: RyRequest,
}

impl Outbound {
    /// Route `request` to the transform or query queue of `accreditation`.
    pub fn to(accreditation: &Accreditation, request: RyRequest) -> Self {
        Self {
            queue: accreditation.queue(request.queue_kind()),
            request,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Dispatch(Outbound),
    /// Nothing to send; the job is completed with this message.
    Complete(String),
}

impl BuildOutcome {
    pub fn dispatch(accreditation: &Accreditation, request: RyRequest) -> Self {
        Self::Dispatch(Outbound::to(accreditation, request))
    }

    pub fn complete(msg: impl Into<String>) -> Self {
        Self::Complete(msg.into())
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    type Payload: DeserializeOwned + Send;

    /// Queue the registry interface answers this job type on.
    fn reply_queue(queues: &ReplyQueues) -> &str;

    async fn build(
        &self,
        ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        payload: Self::Payload,
    ) -> Result<BuildOutcome, HandlerError>;
}
