//! Typed job payloads.
//!
//! Each job type stores the desired end state of one operation as JSON in
//! `job.data`. These structs are the decoded form; unknown fields are
//! ignored so upstream producers can add data without breaking workers.
//!
//! Update payloads carry intent sets with three-valued semantics: a field
//! that is absent requests nothing, a present but empty field is an
//! explicit no-op, and a populated field requests changes.

pub mod common;
pub mod contact;
pub mod contacts;
pub mod domain;
pub mod host;

pub use common::{
    ClaimsData, ClaimsNotice, DomainLaunchData, DsData, IdnData, KeyData, Nameserver, OrderPrice,
    SecdnsData, SecdnsRecords, SecdnsUpdateData,
};
pub use contact::{
    ContactCheckData, ContactCreateData, ContactData, ContactDeleteData, ContactKind,
    ContactPostalInfo, ContactUpdateData,
};
pub use contacts::{ContactsAddRem, ContactsIntent, DomainContact};
pub use domain::{
    DomainCheckData, DomainClaimsCheckData, DomainCreateData, DomainRedeemData,
    DomainRedeemReportData, DomainRenewData, DomainTransferActionData, DomainTransferInData,
    DomainUpdateData, NameserverIntent, OrderType,
};
pub use host::{HostCheckData, HostCreateData, HostDeleteData, HostUpdateData};
