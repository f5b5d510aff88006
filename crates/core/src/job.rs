//! Job records, lifecycle status and job-type tags.
//!
//! Status and type names match the `job_status` / `job_type` lookup
//! tables. Both enums are closed: a name the worker does not know is an
//! error variant, never a silent fallthrough.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EntityId;

macro_rules! define_name_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($err:ident) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in lookup-table seed order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Name as stored in the lookup table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $val => Ok($name::$variant), )+
                    other => Err(CoreError::$err(other.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_name_enum! {
    /// Job lifecycle status.
    JobStatus (UnknownJobStatus) {
        Created = "created",
        Submitted = "submitted",
        Processing = "processing",
        Completed = "completed",
        Failed = "failed",
        CompletedConditionally = "completed_conditionally",
    }
}

impl JobStatus {
    /// `completed`, `failed` and `completed_conditionally` are never left.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::CompletedConditionally
        )
    }
}

define_name_enum! {
    /// Operation a job asks the worker to perform.
    JobKind (UnknownJobType) {
        DomainCreate = "provision_domain_create",
        DomainRenew = "provision_domain_renew",
        DomainRedeem = "provision_domain_redeem",
        DomainRedeemReport = "provision_domain_redeem_report",
        DomainUpdate = "provision_domain_update",
        DomainTransferIn = "provision_domain_transfer_in_request",
        DomainTransferAction = "provision_domain_transfer_action",
        ContactCreate = "provision_contact_create",
        ContactUpdate = "provision_contact_update",
        ContactDelete = "provision_contact_delete",
        HostCreate = "provision_host_create",
        HostUpdate = "provision_host_update",
        HostDelete = "provision_host_delete",
        DomainCheck = "validate_domain_available",
        DomainClaimsCheck = "validate_domain_claims",
        HostCheck = "validate_host_available",
        ContactCheck = "validate_contact_available",
    }
}

/// A job with its type and status resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: EntityId,
    pub job_type: String,
    pub status: JobStatus,
    pub data: serde_json::Value,
    pub parent_id: Option<EntityId>,
    pub result_msg: Option<String>,
    pub reference_id: Option<EntityId>,
}

/// Inbound trigger published when a job becomes ready for a worker.
///
/// Routing uses `job_type` only; `status` is informational because the
/// authoritative status is re-read inside the worker's transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNotification {
    pub job_id: EntityId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: String,
    #[serde(default)]
    pub reference_id: Option<EntityId>,
    #[serde(default)]
    pub reference_table: Option<String>,
}
