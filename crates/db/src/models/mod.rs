//! Row structs read by the worker.
//!
//! Each `*Row` derives `FromRow` and matches one query's column list; rows
//! that need parsing convert into the shared core types via `TryFrom`.

pub mod domain;
pub mod job;
pub mod provision;

pub use domain::{DomainRecord, StoredDomainContact};
pub use job::JobRow;
pub use provision::{ProvisionDomainRedeem, ProvisionDomainRenew};
