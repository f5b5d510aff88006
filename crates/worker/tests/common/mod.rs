//! Shared harness: an in-memory store and broker with stubbed registry
//! state and DNS, wired into a [`WorkerContext`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rybridge_bus::{Broker, BusError, Envelope, MemoryBroker, Subscription};
use rybridge_core::types::EntityId;
use rybridge_core::{Accreditation, Job, JobKind, JobNotification, JobStatus};
use rybridge_db::MemoryStore;
use rybridge_protocol::{DomainInfoResponse, HostInfoResponse, LookupTables, RyRequest};
use rybridge_worker::{
    dispatch, HostResolver, JobOutcome, RemoteError, RemoteState, ReplyQueues, WorkerContext,
    WorkerError,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub const ACCREDITATION: &str = "acme";
pub const TRANSFORM_QUEUE: &str = "ry-acme-transform";
pub const QUERY_QUEUE: &str = "ry-acme-query";

pub fn accreditation_tld_id() -> EntityId {
    Uuid::from_u128(0x7a1d)
}

pub fn accreditation_json() -> Value {
    json!({
        "tenant_id": Uuid::from_u128(1),
        "provider_id": Uuid::from_u128(2),
        "provider_instance_id": Uuid::from_u128(3),
        "accreditation_id": Uuid::from_u128(4),
        "accreditation_name": ACCREDITATION,
    })
}

/// Same registry relationship under a different accreditation id.
pub fn other_accreditation_json() -> Value {
    json!({
        "tenant_id": Uuid::from_u128(1),
        "provider_id": Uuid::from_u128(2),
        "provider_instance_id": Uuid::from_u128(3),
        "accreditation_id": Uuid::from_u128(99),
        "accreditation_name": "other",
    })
}

pub fn accreditation_tld_json() -> Value {
    json!({ "accreditation_tld_id": accreditation_tld_id(), "tld_name": "com" })
}

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Broker that can be told to fail every publish.
pub struct FlakyBroker {
    inner: MemoryBroker,
    fail: AtomicBool,
}

impl FlakyBroker {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Broker for FlakyBroker {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BusError::Closed("broker unavailable".into()));
        }
        self.inner.publish(envelope).await
    }

    async fn call(
        &self,
        queue: &str,
        body: Value,
        timeout: Duration,
    ) -> Result<Envelope, BusError> {
        self.inner.call(queue, body, timeout).await
    }

    async fn consume(&self, queue: &str) -> Result<Box<dyn Subscription>, BusError> {
        self.inner.consume(queue).await
    }
}

/// Registry state keyed by lower-cased name. Unknown names answer 2303.
#[derive(Default)]
pub struct StubRemote {
    domains: Mutex<HashMap<String, DomainInfoResponse>>,
    hosts: Mutex<HashMap<String, HostInfoResponse>>,
    pub domain_calls: AtomicUsize,
    pub host_calls: AtomicUsize,
}

impl StubRemote {
    pub fn set_domain(&self, info: DomainInfoResponse) {
        self.domains
            .lock()
            .unwrap()
            .insert(info.name.to_ascii_lowercase(), info);
    }

    pub fn set_host(&self, info: HostInfoResponse) {
        self.hosts
            .lock()
            .unwrap()
            .insert(info.name.to_ascii_lowercase(), info);
    }

    pub fn domain_calls(&self) -> usize {
        self.domain_calls.load(Ordering::SeqCst)
    }
}

fn missing(name: &str) -> RemoteError {
    RemoteError::Registry {
        code: 2303,
        message: format!("Object does not exist: {name}"),
    }
}

#[async_trait]
impl RemoteState for StubRemote {
    async fn domain_info(
        &self,
        _accreditation: &Accreditation,
        name: &str,
    ) -> Result<DomainInfoResponse, RemoteError> {
        self.domain_calls.fetch_add(1, Ordering::SeqCst);
        self.domains
            .lock()
            .unwrap()
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| missing(name))
    }

    async fn host_info(
        &self,
        _accreditation: &Accreditation,
        name: &str,
    ) -> Result<HostInfoResponse, RemoteError> {
        self.host_calls.fetch_add(1, Ordering::SeqCst);
        self.hosts
            .lock()
            .unwrap()
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| missing(name))
    }
}

#[derive(Default)]
pub struct StubResolver {
    addrs: Mutex<Vec<IpAddr>>,
}

impl StubResolver {
    pub fn set(&self, addrs: &[&str]) {
        *self.addrs.lock().unwrap() = addrs.iter().map(|a| a.parse().unwrap()).collect();
    }
}

#[async_trait]
impl HostResolver for StubResolver {
    async fn resolve(&self, _host: &str) -> std::io::Result<Vec<IpAddr>> {
        Ok(self.addrs.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: MemoryStore,
    pub broker: MemoryBroker,
    pub flaky: Arc<FlakyBroker>,
    pub remote: Arc<StubRemote>,
    pub resolver: Arc<StubResolver>,
    pub ctx: Arc<WorkerContext>,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let broker = MemoryBroker::new();
        let flaky = Arc::new(FlakyBroker {
            inner: broker.clone(),
            fail: AtomicBool::new(false),
        });
        let remote = Arc::new(StubRemote::default());
        let resolver = Arc::new(StubResolver::default());
        let ctx = Arc::new(WorkerContext {
            store: Arc::new(store.clone()),
            broker: flaky.clone(),
            remote: remote.clone(),
            resolver: resolver.clone(),
            tables: Arc::new(LookupTables::new()),
            queues: ReplyQueues::default(),
        });
        Self {
            store,
            broker,
            flaky,
            remote,
            resolver,
            ctx,
        }
    }

    pub fn insert_job(&self, job_type: &str, status: JobStatus, data: Value) -> EntityId {
        let id = EntityId::new_v4();
        self.store.insert_job(Job {
            id,
            job_type: job_type.to_string(),
            status,
            data,
            parent_id: None,
            result_msg: None,
            reference_id: None,
        });
        id
    }

    pub fn submit(&self, kind: JobKind, data: Value) -> EntityId {
        self.insert_job(kind.as_str(), JobStatus::Submitted, data)
    }

    pub fn notification(&self, job_id: EntityId) -> JobNotification {
        let job = self.store.job(job_id).expect("job exists");
        JobNotification {
            job_id,
            job_type: job.job_type,
            status: job.status.to_string(),
            reference_id: None,
            reference_table: None,
        }
    }

    pub async fn run(&self, job_id: EntityId) -> Result<JobOutcome, WorkerError> {
        dispatch(&self.ctx, &self.notification(job_id)).await
    }

    pub fn status(&self, job_id: EntityId) -> JobStatus {
        self.store.job(job_id).expect("job exists").status
    }

    pub fn result_msg(&self, job_id: EntityId) -> Option<String> {
        self.store.job(job_id).expect("job exists").result_msg
    }

    /// Drain `queue` and decode every message as a request.
    pub fn sent(&self, queue: &str) -> Vec<(Envelope, RyRequest)> {
        self.broker
            .drain(queue)
            .into_iter()
            .map(|envelope| {
                let request = envelope.decode::<RyRequest>().expect("request decodes");
                (envelope, request)
            })
            .collect()
    }

    /// The single request sent to `queue`.
    pub fn sent_one(&self, queue: &str) -> (Envelope, RyRequest) {
        let mut sent = self.sent(queue);
        assert_eq!(sent.len(), 1, "expected exactly one request on {queue}");
        sent.remove(0)
    }
}
