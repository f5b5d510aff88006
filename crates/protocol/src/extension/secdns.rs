//! DNSSEC (secDNS) extension.
//!
//! A block carries either DS records or key records, never both. Key data
//! nested under a DS record is accepted in payloads but is not encoded.

use rybridge_core::payload::{DsData, KeyData, SecdnsData, SecdnsRecords, SecdnsUpdateData};
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::extension::ExtensionPayload;

pub const SECDNS_CREATE_TYPE: &str = "ry.extension.v1.SecdnsCreate";
pub const SECDNS_UPDATE_TYPE: &str = "ry.extension.v1.SecdnsUpdate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsRecord {
    pub key_tag: i32,
    pub algorithm: i32,
    pub digest_type: i32,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub flags: i32,
    pub protocol: i32,
    pub algorithm: i32,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum RecordSet {
    DsData(Vec<DsRecord>),
    KeyData(Vec<KeyRecord>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsCreate {
    #[serde(default)]
    pub max_sig_life: Option<i32>,
    #[serde(default)]
    pub data: Option<RecordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsChg {
    pub max_sig_life: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecdnsUpdate {
    #[serde(default)]
    pub add: Option<RecordSet>,
    #[serde(default)]
    pub rem: Option<RecordSet>,
    #[serde(default)]
    pub chg: Option<SecdnsChg>,
}

fn ds_record(ds: &DsData) -> DsRecord {
    DsRecord {
        key_tag: ds.key_tag,
        algorithm: ds.algorithm,
        digest_type: ds.digest_type,
        digest: ds.digest.clone(),
    }
}

fn key_record(key: &KeyData) -> KeyRecord {
    KeyRecord {
        flags: key.flags,
        protocol: key.protocol,
        algorithm: key.algorithm,
        public_key: key.public_key.clone(),
    }
}

fn record_set(
    records: &SecdnsRecords,
    block: &'static str,
) -> Result<Option<RecordSet>, EncodeError> {
    let ds = records.ds_data.as_deref().filter(|d| !d.is_empty());
    let keys = records.key_data.as_deref().filter(|k| !k.is_empty());

    match (ds, keys) {
        (Some(_), Some(_)) => Err(EncodeError::ConflictingSecdnsRecords { block }),
        (Some(ds), None) => Ok(Some(RecordSet::DsData(ds.iter().map(ds_record).collect()))),
        (None, Some(keys)) => Ok(Some(RecordSet::KeyData(
            keys.iter().map(key_record).collect(),
        ))),
        (None, None) => Ok(None),
    }
}

pub fn encode_create(secdns: Option<&SecdnsData>) -> Result<Option<ExtensionPayload>, EncodeError> {
    let Some(secdns) = secdns else {
        return Ok(None);
    };

    let data = record_set(&secdns.records, "create")?;
    if data.is_none() && secdns.max_sig_life.is_none() {
        return Ok(None);
    }

    let message = SecdnsCreate {
        max_sig_life: secdns.max_sig_life,
        data,
    };
    ExtensionPayload::encode(SECDNS_CREATE_TYPE, &message).map(Some)
}

/// Add, remove and max-signature-lifetime change blocks. Returns `None`
/// when every block is empty.
pub fn encode_update(
    secdns: Option<&SecdnsUpdateData>,
) -> Result<Option<ExtensionPayload>, EncodeError> {
    let Some(secdns) = secdns else {
        return Ok(None);
    };

    let add = match &secdns.add {
        Some(records) => record_set(records, "add")?,
        None => None,
    };
    let rem = match &secdns.rem {
        Some(records) => record_set(records, "rem")?,
        None => None,
    };
    let chg = secdns
        .max_sig_life
        .map(|max_sig_life| SecdnsChg { max_sig_life });

    if add.is_none() && rem.is_none() && chg.is_none() {
        return Ok(None);
    }

    ExtensionPayload::encode(SECDNS_UPDATE_TYPE, &SecdnsUpdate { add, rem, chg }).map(Some)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn ds(key_tag: i32, nested: bool) -> DsData {
        DsData {
            key_tag,
            algorithm: 13,
            digest_type: 2,
            digest: "E2D3C916F6DEEAC73294E8268FB5885044A833FC5459588F4A9184CFC41A5766".into(),
            key_data: nested.then(key),
        }
    }

    fn key() -> KeyData {
        KeyData {
            flags: 257,
            protocol: 3,
            algorithm: 13,
            public_key: "mdsswUyr3DPW132mOi8V9xESWE8jTo0d".into(),
        }
    }

    #[test]
    fn create_with_ds_records() {
        let data = SecdnsData {
            max_sig_life: Some(604800),
            records: SecdnsRecords {
                ds_data: Some(vec![ds(1, false)]),
                key_data: None,
            },
        };
        let payload = encode_create(Some(&data)).unwrap().unwrap();
        let decoded: SecdnsCreate = payload.decode().unwrap();
        assert_eq!(decoded.max_sig_life, Some(604800));
        assert_matches!(decoded.data, Some(RecordSet::DsData(records)) if records.len() == 1);
    }

    #[test]
    fn nested_key_data_is_not_encoded() {
        let data = SecdnsData {
            max_sig_life: None,
            records: SecdnsRecords {
                ds_data: Some(vec![ds(7, true)]),
                key_data: None,
            },
        };
        let payload = encode_create(Some(&data)).unwrap().unwrap();
        let record = &payload.value["data"]["records"][0];
        assert_eq!(record["key_tag"], 7);
        assert!(record.get("key_data").is_none());
    }

    #[test]
    fn both_record_families_conflict() {
        let data = SecdnsData {
            max_sig_life: None,
            records: SecdnsRecords {
                ds_data: Some(vec![ds(1, false)]),
                key_data: Some(vec![key()]),
            },
        };
        assert_matches!(
            encode_create(Some(&data)),
            Err(EncodeError::ConflictingSecdnsRecords { block: "create" })
        );
    }

    #[test]
    fn update_builds_add_rem_chg() {
        let data = SecdnsUpdateData {
            add: Some(SecdnsRecords {
                ds_data: None,
                key_data: Some(vec![key()]),
            }),
            rem: Some(SecdnsRecords {
                ds_data: Some(vec![ds(2, false)]),
                key_data: None,
            }),
            max_sig_life: Some(3600),
        };
        let payload = encode_update(Some(&data)).unwrap().unwrap();
        let decoded: SecdnsUpdate = payload.decode().unwrap();
        assert_matches!(decoded.add, Some(RecordSet::KeyData(_)));
        assert_matches!(decoded.rem, Some(RecordSet::DsData(_)));
        assert_eq!(decoded.chg, Some(SecdnsChg { max_sig_life: 3600 }));
    }

    #[test]
    fn empty_update_is_omitted() {
        let data = SecdnsUpdateData {
            add: Some(SecdnsRecords::default()),
            rem: None,
            max_sig_life: None,
        };
        assert!(encode_update(Some(&data)).unwrap().is_none());
        assert!(encode_update(None).unwrap().is_none());
    }

    #[test]
    fn conflicting_rem_block_names_the_block() {
        let data = SecdnsUpdateData {
            add: None,
            rem: Some(SecdnsRecords {
                ds_data: Some(vec![ds(1, false)]),
                key_data: Some(vec![key()]),
            }),
            max_sig_life: None,
        };
        assert_matches!(
            encode_update(Some(&data)),
            Err(EncodeError::ConflictingSecdnsRecords { block: "rem" })
        );
    }
}
