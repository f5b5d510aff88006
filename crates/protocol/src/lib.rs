//! Registry interface wire model.
//!
//! - [`request`]: commands sent to the `ry-<accreditation>-*` queues.
//! - [`response`]: registry responses consumed by the remote state client.
//! - [`extension`]: fee, launch, secDNS, IDN and RGP extension encoders.
//! - [`lookup`]: lock-name and contact-type tables built once per process.

pub mod error;
pub mod extension;
pub mod lookup;
pub mod request;
pub mod response;

pub use error::EncodeError;
pub use extension::{ExtensionName, ExtensionPayload, Extensions};
pub use lookup::LookupTables;
pub use request::RyRequest;
pub use response::{DomainInfoResponse, HostInfoResponse, RegistryResponse, RyResponse};
