//! Repository for the `provision_*` tables.

use rybridge_core::types::EntityId;
use sqlx::PgConnection;

use crate::models::{ProvisionDomainRedeem, ProvisionDomainRenew};

const RENEW_COLUMNS: &str = "\
    id, domain_name, period, current_expiry_date, \
    price_amount, price_currency, price_fraction";

const REDEEM_COLUMNS: &str = "\
    id, domain_name, delete_date, restore_date, \
    price_amount, price_currency, price_fraction";

pub struct ProvisionRepo;

impl ProvisionRepo {
    pub async fn find_domain_renew(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<ProvisionDomainRenew>, sqlx::Error> {
        let query = format!("SELECT {RENEW_COLUMNS} FROM provision_domain_renew WHERE id = $1");
        sqlx::query_as::<_, ProvisionDomainRenew>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_domain_redeem(
        conn: &mut PgConnection,
        id: EntityId,
    ) -> Result<Option<ProvisionDomainRedeem>, sqlx::Error> {
        let query = format!("SELECT {REDEEM_COLUMNS} FROM provision_domain_redeem WHERE id = $1");
        sqlx::query_as::<_, ProvisionDomainRedeem>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Record the registry handle assigned to a contact being created.
    pub async fn set_contact_handle(
        conn: &mut PgConnection,
        provision_contact_id: EntityId,
        handle: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE provision_contact SET handle = $2 WHERE id = $1")
            .bind(provision_contact_id)
            .bind(handle)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
