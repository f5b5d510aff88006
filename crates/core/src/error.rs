#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Unknown job status: {0}")]
    UnknownJobStatus(String),
}
