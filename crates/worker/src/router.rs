//! Job-type dispatch.

use rybridge_core::{JobKind, JobNotification};

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::guard::{run_job, JobOutcome};
use crate::handlers::{
    ContactCheck, ContactCreate, ContactDelete, ContactUpdate, DomainCheck, DomainClaimsCheck,
    DomainCreate, DomainRedeem, DomainRedeemReport, DomainRenew, DomainTransferAction,
    DomainTransferIn, DomainUpdate, HostCheck, HostCreate, HostDelete, HostUpdate,
};

/// Route a notification to the handler for its job type.
pub async fn dispatch(
    ctx: &WorkerContext,
    notification: &JobNotification,
) -> Result<JobOutcome, WorkerError> {
    let kind: JobKind = notification
        .job_type
        .parse()
        .map_err(|_| WorkerError::UnknownJobType(notification.job_type.clone()))?;
    let job_id = notification.job_id;

    match kind {
        JobKind::DomainCreate => run_job(ctx, &DomainCreate, job_id).await,
        JobKind::DomainRenew => run_job(ctx, &DomainRenew, job_id).await,
        JobKind::DomainRedeem => run_job(ctx, &DomainRedeem, job_id).await,
        JobKind::DomainRedeemReport => run_job(ctx, &DomainRedeemReport, job_id).await,
        JobKind::DomainUpdate => run_job(ctx, &DomainUpdate, job_id).await,
        JobKind::DomainTransferIn => run_job(ctx, &DomainTransferIn, job_id).await,
        JobKind::DomainTransferAction => run_job(ctx, &DomainTransferAction, job_id).await,
        JobKind::ContactCreate => run_job(ctx, &ContactCreate, job_id).await,
        JobKind::ContactUpdate => run_job(ctx, &ContactUpdate, job_id).await,
        JobKind::ContactDelete => run_job(ctx, &ContactDelete, job_id).await,
        JobKind::HostCreate => run_job(ctx, &HostCreate, job_id).await,
        JobKind::HostUpdate => run_job(ctx, &HostUpdate, job_id).await,
        JobKind::HostDelete => run_job(ctx, &HostDelete, job_id).await,
        JobKind::DomainCheck => run_job(ctx, &DomainCheck, job_id).await,
        JobKind::DomainClaimsCheck => run_job(ctx, &DomainClaimsCheck, job_id).await,
        JobKind::HostCheck => run_job(ctx, &HostCheck, job_id).await,
        JobKind::ContactCheck => run_job(ctx, &ContactCheck, job_id).await,
    }
}
