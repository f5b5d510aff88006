//! Repository for `domain` and its contact/host relations.

use rybridge_core::types::EntityId;
use sqlx::PgConnection;

use crate::models::domain::DomainRow;
use crate::models::{DomainRecord, StoredDomainContact};

const COLUMNS: &str = "\
    id, name, rgp_status, statuses, \
    created_date, expiry_date, deleted_date";

pub struct DomainRepo;

impl DomainRepo {
    pub async fn find_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<DomainRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM domain WHERE lower(name) = lower($1)");
        let Some(row) = sqlx::query_as::<_, DomainRow>(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let contacts = sqlx::query_as::<_, StoredDomainContact>(
            "SELECT domain_contact_type_id, handle FROM domain_contact \
             WHERE domain_id = $1 ORDER BY domain_contact_type_id, handle",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        let nameservers = sqlx::query_scalar::<_, String>(
            "SELECT host_name FROM domain_host WHERE domain_id = $1 ORDER BY host_name",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(DomainRecord::from_parts(row, contacts, nameservers)))
    }

    pub async fn contact_type_name(
        conn: &mut PgConnection,
        domain_contact_type_id: EntityId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM domain_contact_type WHERE id = $1")
            .bind(domain_contact_type_id)
            .fetch_optional(conn)
            .await
    }
}
