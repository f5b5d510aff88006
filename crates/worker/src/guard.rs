//! Job lifecycle guard.
//!
//! One call handles one notification inside one store transaction:
//!
//! 1. load the job; anything but `submitted` is skipped untouched
//! 2. decode the payload; failure marks the job `failed`
//! 3. build the request; "nothing to send" marks the job `completed`
//! 4. send to the accreditation queue; failure rolls back and is retried
//! 5. mark the job `processing` and commit
//!
//! The send in step 4 is not part of the transaction. A crash between send
//! and commit redelivers the notification and the request is sent again;
//! the registry interface deduplicates on `correlation_id` (the job id).

use rybridge_bus::Headers;
use rybridge_core::types::EntityId;
use rybridge_core::JobStatus;
use rybridge_db::{JobTx, StoreError};
use rybridge_protocol::EncodeError;

use crate::context::WorkerContext;
use crate::error::{HandlerError, WorkerError};
use crate::handlers::{BuildOutcome, JobHandler};

/// What happened to a job that did not end in an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job was not `submitted`; nothing was changed.
    Skipped { status: JobStatus },
    /// No request was needed; the job is `completed`.
    Completed { message: String },
    /// The request was sent; the job is `processing`.
    Dispatched { queue: String },
}

/// Move a job to `status`, optionally recording a result message.
pub async fn transition(
    tx: &mut dyn JobTx,
    job_id: EntityId,
    status: JobStatus,
    result_msg: Option<&str>,
) -> Result<(), StoreError> {
    let status_id = tx.get_job_status_id(status).await?;
    tx.set_job_status(job_id, status_id, result_msg).await
}

pub async fn run_job<H: JobHandler>(
    ctx: &WorkerContext,
    handler: &H,
    job_id: EntityId,
) -> Result<JobOutcome, WorkerError> {
    let mut tx = ctx.store.begin().await?;
    let job = tx.get_job_by_id(job_id).await?;
    let span = tracing::info_span!("job", job_id = %job.id, job_type = %job.job_type);

    if job.status != JobStatus::Submitted {
        if job.status.is_terminal() {
            tracing::info!(parent: &span, status = %job.status, "Job already finished, skipping");
        } else {
            tracing::warn!(parent: &span, status = %job.status, "Job is not submitted, skipping");
        }
        return Ok(JobOutcome::Skipped { status: job.status });
    }

    let payload: H::Payload = match serde_json::from_value(job.data) {
        Ok(payload) => payload,
        Err(source) => {
            tracing::warn!(parent: &span, error = %source, "Job payload could not be decoded");
            transition(tx.as_mut(), job_id, JobStatus::Failed, Some(&source.to_string())).await?;
            tx.commit().await?;
            return Err(WorkerError::Decode { job_id, source });
        }
    };

    let built = handler.build(ctx, &span, tx.as_mut(), payload).await;
    let outbound = match built {
        Ok(BuildOutcome::Dispatch(outbound)) => outbound,
        Ok(BuildOutcome::Complete(message)) => {
            tracing::info!(parent: &span, message = %message, "No request needed, completing job");
            transition(tx.as_mut(), job_id, JobStatus::Completed, Some(&message)).await?;
            tx.commit().await?;
            return Ok(JobOutcome::Completed { message });
        }
        Err(HandlerError::Store(e)) if !e.is_not_found() => {
            tracing::warn!(parent: &span, error = %e, "Store failure while building, rolling back");
            return Err(WorkerError::Store(e));
        }
        Err(source) => return fail_job(tx, &span, job_id, source).await,
    };

    let body = match serde_json::to_value(&outbound.request) {
        Ok(body) => body,
        Err(e) => {
            let source = HandlerError::Encode(EncodeError::Serialize(e));
            return fail_job(tx, &span, job_id, source).await;
        }
    };

    let headers = Headers::new()
        .with_reply_to(H::reply_queue(&ctx.queues))
        .with_correlation_id(job_id.to_string());
    if let Err(source) = ctx.broker.send(&outbound.queue, headers, body).await {
        tracing::error!(parent: &span, queue = %outbound.queue, error = %source, "Send failed, job left unchanged");
        return Err(WorkerError::Send {
            job_id,
            queue: outbound.queue,
            source,
        });
    }

    transition(tx.as_mut(), job_id, JobStatus::Processing, None).await?;
    tx.commit().await?;
    tracing::info!(parent: &span, queue = %outbound.queue, "Request dispatched");
    Ok(JobOutcome::Dispatched {
        queue: outbound.queue,
    })
}

async fn fail_job(
    mut tx: Box<dyn JobTx>,
    span: &tracing::Span,
    job_id: EntityId,
    source: HandlerError,
) -> Result<JobOutcome, WorkerError> {
    tracing::warn!(parent: span, error = %source, "Job failed");
    transition(tx.as_mut(), job_id, JobStatus::Failed, Some(&source.to_string())).await?;
    tx.commit().await?;
    Err(WorkerError::JobFailed { job_id, source })
}
