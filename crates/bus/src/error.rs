use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid message body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("No reply from {queue} within {timeout:?}")]
    Timeout { queue: String, timeout: Duration },

    #[error("Reply channel closed for call {0}")]
    Closed(String),
}
