//! Domain model shared by every rybridge crate.
//!
//! - [`job`]: job records, lifecycle status and the inbound notification.
//! - [`accreditation`]: registry accreditation identity and queue routing.
//! - [`payload`]: typed job payloads decoded from the job's JSON data.
//! - [`money`]: decimal price to units/nanos conversion.

pub mod accreditation;
pub mod error;
pub mod job;
pub mod money;
pub mod payload;
pub mod types;

pub use accreditation::{Accreditation, AccreditationTld, QueueKind};
pub use error::CoreError;
pub use job::{Job, JobKind, JobNotification, JobStatus};
pub use money::Money;
