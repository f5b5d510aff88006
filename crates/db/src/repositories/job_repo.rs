//! Repository for `job` and `job_status`.

use rybridge_core::types::EntityId;
use sqlx::PgConnection;

use crate::models::JobRow;

/// Column list for job queries, with type and status resolved to names.
const COLUMNS: &str = "\
    j.id AS job_id, t.name AS job_type_name, s.name AS job_status_name, \
    j.data, j.parent_id, j.result_msg, j.reference_id";

pub struct JobRepo;

impl JobRepo {
    /// Load a job and lock its row until the transaction ends, so a
    /// redelivered notification waits instead of racing.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        job_id: EntityId,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job j \
             JOIN job_type t ON t.id = j.type_id \
             JOIN job_status s ON s.id = j.status_id \
             WHERE j.id = $1 \
             FOR UPDATE OF j"
        );
        sqlx::query_as::<_, JobRow>(&query)
            .bind(job_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn status_id(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<EntityId>, sqlx::Error> {
        sqlx::query_scalar::<_, EntityId>("SELECT id FROM job_status WHERE name = $1")
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    /// Set status and result message. Returns `false` when no row matched.
    pub async fn set_status(
        conn: &mut PgConnection,
        job_id: EntityId,
        status_id: EntityId,
        result_msg: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE job \
             SET status_id = $2, \
                 result_msg = COALESCE($3, result_msg), \
                 end_date = CASE WHEN s.is_final THEN NOW() ELSE end_date END \
             FROM job_status s \
             WHERE job.id = $1 AND s.id = $2",
        )
        .bind(job_id)
        .bind(status_id)
        .bind(result_msg)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
