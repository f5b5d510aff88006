/// Failure while building an extension payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// DS records and key records were both supplied in one block.
    #[error("secDNS {block} block must carry either DS records or key records, not both")]
    ConflictingSecdnsRecords { block: &'static str },

    /// Structured input failed validation (bad price fraction, etc.).
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to serialize extension: {0}")]
    Serialize(#[from] serde_json::Error),
}
