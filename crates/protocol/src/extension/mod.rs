//! Protocol extension encoders.
//!
//! Each encoder maps optional structured input to an optional
//! [`ExtensionPayload`]: `None` in, `None` out, so absent data drops the
//! extension from the request. [`extension_map`] collects encoder output
//! into the name-keyed map carried by requests.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

pub mod fee;
pub mod idn;
pub mod launch;
pub mod rgp;
pub mod secdns;

/// Type-tagged opaque extension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionPayload {
    pub type_url: String,
    pub value: serde_json::Value,
}

impl ExtensionPayload {
    pub fn encode<T: Serialize>(type_url: &str, message: &T) -> Result<Self, EncodeError> {
        Ok(Self {
            type_url: type_url.to_string(),
            value: serde_json::to_value(message)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EncodeError> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// Extension name to payload. Absent key means the extension is omitted.
pub type Extensions = BTreeMap<String, ExtensionPayload>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionName {
    Fee,
    Launch,
    Secdns,
    Idn,
    Rgp,
}

impl ExtensionName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fee => "fee",
            Self::Launch => "launch",
            Self::Secdns => "secdns",
            Self::Idn => "idn",
            Self::Rgp => "rgp",
        }
    }
}

/// Build an extension map from encoder results, skipping `None`s.
pub fn extension_map<I>(entries: I) -> Extensions
where
    I: IntoIterator<Item = (ExtensionName, Option<ExtensionPayload>)>,
{
    entries
        .into_iter()
        .filter_map(|(name, payload)| payload.map(|p| (name.as_str().to_string(), p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn map_skips_absent_extensions() {
        let idn = ExtensionPayload::encode("ry.extension.v1.Idn", &json!({"table": "de"})).unwrap();
        let map = extension_map([
            (ExtensionName::Fee, None),
            (ExtensionName::Idn, Some(idn.clone())),
            (ExtensionName::Secdns, None),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("idn"), Some(&idn));
    }

    #[test]
    fn payload_decodes_back_to_message() {
        let payload = ExtensionPayload::encode("t", &vec![1, 2, 3]).unwrap();
        let decoded: Vec<i32> = payload.decode().unwrap();
        assert_eq!(decoded, [1, 2, 3]);
    }
}
