//! Launch phase extension, used for the trademark claims phase only.

use rybridge_core::payload::DomainLaunchData;
use rybridge_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::extension::ExtensionPayload;

pub const LAUNCH_CREATE_TYPE: &str = "ry.extension.v1.LaunchCreate";
pub const LAUNCH_CHECK_TYPE: &str = "ry.extension.v1.LaunchCheck";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchPhase {
    Claims,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Application,
    Registration,
    Unknown,
}

impl ClaimType {
    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if n.eq_ignore_ascii_case("APPLICATION") => Self::Application,
            Some(n) if n.eq_ignore_ascii_case("REGISTRATION") => Self::Registration,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub notice_id: String,
    #[serde(default)]
    pub validator_id: Option<String>,
    #[serde(default)]
    pub not_after: Option<Timestamp>,
    #[serde(default)]
    pub accepted_date: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCreate {
    pub phase: LaunchPhase,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchCheckType {
    Claims,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchCheck {
    pub phase: LaunchPhase,
    #[serde(rename = "type")]
    pub check_type: LaunchCheckType,
}

/// Claims acknowledgement for a domain create.
pub fn encode_create(
    launch: Option<&DomainLaunchData>,
) -> Result<Option<ExtensionPayload>, EncodeError> {
    let Some(claims) = launch.and_then(|l| l.claims.as_ref()) else {
        return Ok(None);
    };

    let message = LaunchCreate {
        phase: LaunchPhase::Claims,
        claim_type: ClaimType::from_name(claims.claim_type.as_deref()),
        notices: claims
            .notices
            .iter()
            .map(|n| Notice {
                notice_id: n.notice_id.clone(),
                validator_id: n.validator_id.clone(),
                not_after: n.not_after,
                accepted_date: n.accepted_date,
            })
            .collect(),
    };
    ExtensionPayload::encode(LAUNCH_CREATE_TYPE, &message).map(Some)
}

/// Claims-phase check.
pub fn encode_claims_check() -> Result<ExtensionPayload, EncodeError> {
    ExtensionPayload::encode(
        LAUNCH_CHECK_TYPE,
        &LaunchCheck {
            phase: LaunchPhase::Claims,
            check_type: LaunchCheckType::Claims,
        },
    )
}
