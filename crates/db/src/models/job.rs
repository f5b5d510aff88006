use rybridge_core::types::EntityId;
use rybridge_core::{Job, JobStatus};
use sqlx::FromRow;

use crate::error::StoreError;

/// A job row with its type and status names resolved.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub job_id: EntityId,
    pub job_type_name: String,
    pub job_status_name: String,
    pub data: serde_json::Value,
    pub parent_id: Option<EntityId>,
    pub result_msg: Option<String>,
    pub reference_id: Option<EntityId>,
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status: JobStatus = row.job_status_name.parse()?;
        Ok(Job {
            id: row.job_id,
            job_type: row.job_type_name,
            status,
            data: row.data,
            parent_id: row.parent_id,
            result_msg: row.result_msg,
            reference_id: row.reference_id,
        })
    }
}
