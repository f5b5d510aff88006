//! Redemption grace period (RGP) extension, RFC 3915.

use rybridge_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::extension::ExtensionPayload;

pub const RGP_UPDATE_TYPE: &str = "ry.extension.v1.RgpUpdate";

pub const RESTORE_REASON: &str = "Registrant error.";

pub const RESTORE_STATEMENTS: [&str; 2] = [
    "This registrar has not restored the Registered Name in order to assume the \
     rights to use or sell the Registered Name for itself or for any third party.",
    "The information in this report is true to best of this registrar's knowledge, \
     and this registrar acknowledges that intentionally supplying false information \
     in this report shall constitute an incurable material breach of the \
     Registry-Registrar Agreement.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RgpOp {
    Request,
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgpReport {
    pub pre_data: String,
    pub post_data: String,
    #[serde(default)]
    pub del_time: Option<Timestamp>,
    #[serde(default)]
    pub res_time: Option<Timestamp>,
    pub res_reason: String,
    pub statements: Vec<String>,
    #[serde(default)]
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgpUpdate {
    pub op: RgpOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<RgpReport>,
}

/// Restore intent for a domain update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RgpRestore {
    Request,
    /// `data` is used as both the pre- and post-restore snapshot.
    Report {
        data: String,
        deleted_at: Option<Timestamp>,
        restored_at: Option<Timestamp>,
    },
}

pub fn encode(restore: Option<&RgpRestore>) -> Result<Option<ExtensionPayload>, EncodeError> {
    let message = match restore {
        None => return Ok(None),
        Some(RgpRestore::Request) => RgpUpdate {
            op: RgpOp::Request,
            report: None,
        },
        Some(RgpRestore::Report {
            data,
            deleted_at,
            restored_at,
        }) => RgpUpdate {
            op: RgpOp::Report,
            report: Some(RgpReport {
                pre_data: data.clone(),
                post_data: data.clone(),
                del_time: *deleted_at,
                res_time: *restored_at,
                res_reason: RESTORE_REASON.to_string(),
                statements: RESTORE_STATEMENTS.iter().map(|s| s.to_string()).collect(),
                other: None,
            }),
        },
    };
    ExtensionPayload::encode(RGP_UPDATE_TYPE, &message).map(Some)
}
