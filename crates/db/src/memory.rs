//! In-process job store.
//!
//! Each transaction works on a private copy of the state and swaps it in on
//! commit, so an uncommitted (dropped) transaction leaves no trace.
//! Concurrent transactions are last-writer-wins; this store is meant for
//! tests and single-worker local runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rybridge_core::types::EntityId;
use rybridge_core::{Job, JobStatus};

use crate::error::StoreError;
use crate::models::{DomainRecord, ProvisionDomainRedeem, ProvisionDomainRenew};
use crate::store::{JobStore, JobTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    status_ids: HashMap<JobStatus, EntityId>,
    jobs: HashMap<EntityId, Job>,
    contact_handles: HashMap<EntityId, Option<String>>,
    renews: HashMap<EntityId, ProvisionDomainRenew>,
    redeems: HashMap<EntityId, ProvisionDomainRedeem>,
    tld_settings: HashMap<(EntityId, String), serde_json::Value>,
    domains: HashMap<String, DomainRecord>,
    contact_type_names: HashMap<EntityId, String>,
}

impl MemoryState {
    fn status_by_id(&self, status_id: EntityId) -> Option<JobStatus> {
        self.status_ids
            .iter()
            .find(|(_, id)| **id == status_id)
            .map(|(status, _)| *status)
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Empty store seeded with one id per job status.
    pub fn new() -> Self {
        let state = MemoryState {
            status_ids: JobStatus::ALL
                .iter()
                .map(|status| (*status, EntityId::new_v4()))
                .collect(),
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- seeding ------------------------------------------------------------

    pub fn insert_job(&self, job: Job) {
        self.lock().jobs.insert(job.id, job);
    }

    pub fn insert_provision_contact(&self, id: EntityId) {
        self.lock().contact_handles.insert(id, None);
    }

    pub fn insert_provision_renew(&self, renew: ProvisionDomainRenew) {
        self.lock().renews.insert(renew.id, renew);
    }

    pub fn insert_provision_redeem(&self, redeem: ProvisionDomainRedeem) {
        self.lock().redeems.insert(redeem.id, redeem);
    }

    pub fn set_tld_setting(
        &self,
        accreditation_tld_id: EntityId,
        key: &str,
        value: serde_json::Value,
    ) {
        self.lock()
            .tld_settings
            .insert((accreditation_tld_id, key.to_string()), value);
    }

    pub fn insert_domain(&self, domain: DomainRecord) {
        self.lock()
            .domains
            .insert(domain.name.to_ascii_lowercase(), domain);
    }

    /// Register a domain contact type name and return its id.
    pub fn insert_contact_type(&self, name: &str) -> EntityId {
        let id = EntityId::new_v4();
        self.lock().contact_type_names.insert(id, name.to_string());
        id
    }

    // -- inspection ---------------------------------------------------------

    pub fn job(&self, job_id: EntityId) -> Option<Job> {
        self.lock().jobs.get(&job_id).cloned()
    }

    pub fn provision_contact_handle(&self, id: EntityId) -> Option<String> {
        self.lock().contact_handles.get(&id).cloned().flatten()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn JobTx>, StoreError> {
        let work = self.lock().clone();
        Ok(Box::new(MemoryTx {
            shared: Arc::clone(&self.state),
            work,
        }))
    }
}

struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    work: MemoryState,
}

#[async_trait]
impl JobTx for MemoryTx {
    async fn get_job_by_id(&mut self, job_id: EntityId) -> Result<Job, StoreError> {
        self.work
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("job", job_id))
    }

    async fn get_job_status_id(&mut self, status: JobStatus) -> Result<EntityId, StoreError> {
        self.work
            .status_ids
            .get(&status)
            .copied()
            .ok_or_else(|| StoreError::not_found("job_status", status))
    }

    async fn set_job_status(
        &mut self,
        job_id: EntityId,
        status_id: EntityId,
        result_msg: Option<&str>,
    ) -> Result<(), StoreError> {
        let status = self
            .work
            .status_by_id(status_id)
            .ok_or_else(|| StoreError::not_found("job_status", status_id))?;
        let job = self
            .work
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| StoreError::not_found("job", job_id))?;
        job.status = status;
        if let Some(msg) = result_msg {
            job.result_msg = Some(msg.to_string());
        }
        Ok(())
    }

    async fn set_provision_contact_handle(
        &mut self,
        provision_contact_id: EntityId,
        handle: &str,
    ) -> Result<(), StoreError> {
        let slot = self
            .work
            .contact_handles
            .get_mut(&provision_contact_id)
            .ok_or_else(|| StoreError::not_found("provision_contact", provision_contact_id))?;
        *slot = Some(handle.to_string());
        Ok(())
    }

    async fn get_provision_domain_renew(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRenew, StoreError> {
        self.work
            .renews
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("provision_domain_renew", id))
    }

    async fn get_provision_domain_redeem(
        &mut self,
        id: EntityId,
    ) -> Result<ProvisionDomainRedeem, StoreError> {
        self.work
            .redeems
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("provision_domain_redeem", id))
    }

    async fn get_tld_setting(
        &mut self,
        accreditation_tld_id: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self
            .work
            .tld_settings
            .get(&(accreditation_tld_id, key.to_string()))
            .cloned())
    }

    async fn get_domain(&mut self, name: &str) -> Result<Option<DomainRecord>, StoreError> {
        Ok(self.work.domains.get(&name.to_ascii_lowercase()).cloned())
    }

    async fn get_domain_contact_type_name(
        &mut self,
        domain_contact_type_id: EntityId,
    ) -> Result<String, StoreError> {
        self.work
            .contact_type_names
            .get(&domain_contact_type_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("domain_contact_type", domain_contact_type_id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx { shared, work } = *self;
        *shared.lock().unwrap_or_else(PoisonError::into_inner) = work;
        Ok(())
    }
}
