use rybridge_core::types::EntityId;
use sqlx::PgConnection;

pub struct TldSettingRepo;

impl TldSettingRepo {
    /// Value of `key` for one accreditation TLD, `None` when unset.
    pub async fn find(
        conn: &mut PgConnection,
        accreditation_tld_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM tld_setting \
             WHERE accreditation_tld_id = $1 AND key = $2",
        )
        .bind(accreditation_tld_id)
        .bind(key)
        .fetch_optional(conn)
        .await
    }
}
