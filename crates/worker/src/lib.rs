//! Registry job worker.
//!
//! Consumes job notifications, turns each submitted job into one request
//! for the registry interface and records the job's status transition.
//! Exposed as a library so integration tests and the binary share it.

pub mod config;
pub mod consumer;
pub mod context;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod remote;
pub mod resolver;
pub mod router;

pub use config::{ConfigError, LogFormat, ReplyQueues, WorkerConfig};
pub use consumer::{handle_delivery, Consumer};
pub use context::WorkerContext;
pub use error::{HandlerError, WorkerError};
pub use guard::{run_job, JobOutcome};
pub use remote::{BrokerRemoteState, RemoteError, RemoteState};
pub use resolver::{DnsResolver, HostResolver};
pub use router::dispatch;
