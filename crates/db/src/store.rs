//! Transactional store seam used by the job lifecycle guard.
//!
//! A [`JobTx`] is one database transaction. Every read and write a handler
//! makes for a single message goes through the same `JobTx`; dropping it
//! without calling [`JobTx::commit`] rolls everything back.

use async_trait::async_trait;
use rybridge_core::types::EntityId;
use rybridge_core::{Job, JobStatus};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;
use crate::models::{DomainRecord, ProvisionDomainRedeem, ProvisionDomainRenew};
use crate::repositories::{DomainRepo, JobRepo, ProvisionRepo, TldSettingRepo};

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn JobTx>, StoreError>;
}

#[async_trait]
pub trait JobTx: Send {
    async fn get_job_by_id(&mut self, job_id: EntityId) -> Result<Job, StoreError>;

    async fn get_job_status_id(&mut self, status: JobStatus) -> Result<EntityId, StoreError>;

    /// `result_msg = None` keeps the stored message.
    async fn set_job_status(
        &mut self,
        job_id: EntityId,
        status_id: EntityId,
        result_msg: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn set_provision_contact_handle(
        &mut self,
        provision_contact_id: EntityId,
        handle: &str,
    ) -> Result<(), StoreError>;

    async fn get_provision_domain_renew(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRenew, StoreError>;

    async fn get_provision_domain_redeem(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRedeem, StoreError>;

    async fn get_tld_setting(
        &mut self,
        accreditation_tld_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    async fn get_domain(&mut self, name: &str) -> Result<Option<DomainRecord>, StoreError>;

    async fn get_domain_contact_type_name(
        &mut self,
        domain_contact_type_id: EntityId,
    ) -> Result<String, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn JobTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl JobTx for PgTx {
    async fn get_job_by_id(&mut self, job_id: EntityId) -> Result<Job, StoreError> {
        JobRepo::find_by_id(&mut self.tx, job_id)
            .await?
            .ok_or_else(|| StoreError::not_found("job", job_id))?
            .try_into()
    }

    async fn get_job_status_id(&mut self, status: JobStatus) -> Result<EntityId, StoreError> {
        JobRepo::status_id(&mut self.tx, status.as_str())
            .await?
            .ok_or_else(|| StoreError::not_found("job_status", status))
    }

    async fn set_job_status(
        &mut self,
        job_id: EntityId,
        status_id: EntityId,
        result_msg: Option<&str>,
    ) -> Result<(), StoreError> {
        if !JobRepo::set_status(&mut self.tx, job_id, status_id, result_msg).await? {
            return Err(StoreError::not_found("job", job_id));
        }
        Ok(())
    }

    async fn set_provision_contact_handle(
        &mut self,
        provision_contact_id: EntityId,
        handle: &str,
    ) -> Result<(), StoreError> {
        if !ProvisionRepo::set_contact_handle(&mut self.tx, provision_contact_id, handle).await? {
            return Err(StoreError::not_found("provision_contact", provision_contact_id));
        }
        Ok(())
    }

    async fn get_provision_domain_renew(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRenew, StoreError> {
        ProvisionRepo::find_domain_renew(&mut self.tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("provision_domain_renew", id))
    }

    async fn get_provision_domain_redeem(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRedeem, StoreError> {
        ProvisionRepo::find_domain_redeem(&mut self.tx, id)
            .await?
            .ok_or_else(|| StoreError::not_found("provision_domain_redeem", id))
    }

    async fn get_tld_setting(
        &mut self,
        accreditation_tld_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(TldSettingRepo::find(&mut self.tx, accreditation_tld_id, key).await?)
    }

    async fn get_domain(&mut self, name: &str) -> Result<Option<DomainRecord>, StoreError> {
        Ok(DomainRepo::find_by_name(&mut self.tx, name).await?)
    }

    async fn get_domain_contact_type_name(
        &mut self,
        domain_contact_type_id: EntityId,
    ) -> Result<String, StoreError> {
        DomainRepo::contact_type_name(&mut self.tx, domain_contact_type_id)
            .await?
            .ok_or_else(|| StoreError::not_found("domain_contact_type", domain_contact_type_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
