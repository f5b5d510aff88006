//! Repository layer.
//!
//! Repositories are zero-sized structs with async associated functions that
//! take a `&mut PgConnection`, so they run inside whatever transaction the
//! caller holds.

pub mod domain_repo;
pub mod job_repo;
pub mod provision_repo;
pub mod tld_setting_repo;

pub use domain_repo::DomainRepo;
pub use job_repo::JobRepo;
pub use provision_repo::ProvisionRepo;
pub use tld_setting_repo::TldSettingRepo;
