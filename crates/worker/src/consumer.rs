//! Notification consumer loop.
//!
//! Pulls job notifications from one queue and handles each on its own task.
//! A semaphore with `prefetch` permits bounds how many run at once; a permit
//! is taken before the next message is received so the broker keeps the
//! rest for other workers.

use std::sync::Arc;
use std::time::Duration;

use rybridge_bus::{BusError, Delivery, Settlement};
use rybridge_core::JobNotification;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::guard::JobOutcome;
use crate::router::dispatch;

/// Pause after a failed receive before trying again.
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct Consumer {
    ctx: Arc<WorkerContext>,
    queue: String,
    prefetch: usize,
    shutdown_timeout: Duration,
}

impl Consumer {
    pub fn new(
        ctx: Arc<WorkerContext>,
        queue: impl Into<String>,
        prefetch: usize,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            ctx,
            queue: queue.into(),
            prefetch: prefetch.max(1),
            shutdown_timeout,
        }
    }

    /// Run until `cancel` fires or the broker closes, then wait up to the
    /// shutdown timeout for in-flight jobs.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BusError> {
        let mut subscription = self.ctx.broker.consume(&self.queue).await?;
        let permits = Arc::new(Semaphore::new(self.prefetch));
        tracing::info!(queue = %self.queue, prefetch = self.prefetch, "Job consumer started");

        let mut closed = None;
        loop {
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = subscription.next() => next,
            };

            match next {
                Ok(delivery) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        handle_delivery(&ctx, delivery).await;
                        drop(permit);
                    });
                }
                Err(BusError::Closed(reason)) => {
                    tracing::warn!(queue = %self.queue, reason = %reason, "Broker closed");
                    closed = Some(BusError::Closed(reason));
                    break;
                }
                Err(e) => {
                    tracing::error!(queue = %self.queue, error = %e, "Receive failed");
                    drop(permit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECEIVE_RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!(queue = %self.queue, "Job consumer stopping, waiting for in-flight jobs");
        let all = u32::try_from(self.prefetch).unwrap_or(u32::MAX);
        match tokio::time::timeout(self.shutdown_timeout, permits.acquire_many(all)).await {
            Ok(_) => tracing::info!("In-flight jobs finished"),
            Err(_) => tracing::warn!(
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Shutdown timed out with jobs still running",
            ),
        }

        match closed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Handle one delivery and settle it. Returns the settlement applied.
pub async fn handle_delivery(ctx: &WorkerContext, delivery: Delivery) -> Settlement {
    let result = match delivery.envelope.decode::<JobNotification>() {
        Ok(notification) => dispatch(ctx, &notification).await,
        Err(e) => Err(WorkerError::Notification(e)),
    };

    let settlement = match &result {
        Ok(outcome) => {
            log_outcome(outcome);
            Settlement::Ack
        }
        Err(e) => {
            let settlement = e.settlement();
            match settlement {
                Settlement::Ack => tracing::warn!(error = %e, "Job failed"),
                Settlement::Requeue => tracing::warn!(error = %e, "Job will be retried"),
                Settlement::Reject => tracing::error!(error = %e, "Notification dead-lettered"),
            }
            settlement
        }
    };

    let message_id = delivery.envelope.headers.message_id;
    if let Err(e) = delivery.settle(settlement).await {
        tracing::error!(%message_id, error = %e, "Failed to settle delivery");
    }
    settlement
}

fn log_outcome(outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Skipped { status } => tracing::debug!(status = %status, "Notification skipped"),
        JobOutcome::Completed { message } => tracing::debug!(message = %message, "Job completed"),
        JobOutcome::Dispatched { queue } => tracing::debug!(queue = %queue, "Job dispatched"),
    }
}
