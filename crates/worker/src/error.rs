use rybridge_bus::{BusError, Settlement};
use rybridge_core::types::EntityId;
use rybridge_db::StoreError;
use rybridge_protocol::EncodeError;

use crate::remote::RemoteError;

/// Why a request builder could not produce a request.
///
/// Every variant except a non-`NotFound` [`StoreError`] fails the job.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Extension encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Remote state unavailable: {0}")]
    Remote(#[from] RemoteError),

    #[error("Host resolution failed for {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HandlerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Error returned for one inbound notification.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Malformed job notification: {0}")]
    Notification(#[source] BusError),

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Job {job_id} payload could not be decoded: {source}")]
    Decode {
        job_id: EntityId,
        #[source]
        source: serde_json::Error,
    },

    #[error("Job {job_id} failed: {source}")]
    JobFailed {
        job_id: EntityId,
        #[source]
        source: HandlerError,
    },

    #[error("Sending job {job_id} to {queue} failed: {source}")]
    Send {
        job_id: EntityId,
        queue: String,
        #[source]
        source: BusError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkerError {
    /// Broker settlement for a delivery that ended in this error.
    ///
    /// Failures already recorded on the job are acknowledged. Transient
    /// failures left the job untouched and are redelivered. Messages no
    /// worker can ever handle, including ones naming a job that does not
    /// exist, go to the dead-letter queue.
    pub fn settlement(&self) -> Settlement {
        match self {
            Self::Decode { .. } | Self::JobFailed { .. } => Settlement::Ack,
            Self::Store(e) if e.is_not_found() => Settlement::Reject,
            Self::Send { .. } | Self::Store(_) => Settlement::Requeue,
            Self::Notification(_) | Self::UnknownJobType(_) => Settlement::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_by_error_kind() {
        let job_id = EntityId::new_v4();

        let failed = WorkerError::JobFailed {
            job_id,
            source: HandlerError::validation("unknown lock `frozen`"),
        };
        assert_eq!(failed.settlement(), Settlement::Ack);

        let send = WorkerError::Send {
            job_id,
            queue: "ry-acme-transform".into(),
            source: BusError::Closed("x".into()),
        };
        assert_eq!(send.settlement(), Settlement::Requeue);

        let store = WorkerError::Store(StoreError::Decode("bad".into()));
        assert_eq!(store.settlement(), Settlement::Requeue);

        let missing = WorkerError::Store(StoreError::not_found("job", job_id));
        assert_eq!(missing.settlement(), Settlement::Reject);

        assert_eq!(
            WorkerError::UnknownJobType("provision_frob".into()).settlement(),
            Settlement::Reject
        );
    }
}
