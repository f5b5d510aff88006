use rybridge_core::payload::IdnData;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::extension::ExtensionPayload;

pub const IDN_TYPE: &str = "ry.extension.v1.Idn";

/// Internationalized label and the table it was validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idn {
    pub table: String,
    pub uname: String,
}

pub fn encode(idn: Option<&IdnData>) -> Result<Option<ExtensionPayload>, EncodeError> {
    let Some(idn) = idn else {
        return Ok(None);
    };
    let message = Idn {
        table: idn.idn_table.clone(),
        uname: idn.idn_uname.clone(),
    };
    ExtensionPayload::encode(IDN_TYPE, &message).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_table_and_label() {
        let data = IdnData {
            idn_table: "de".into(),
            idn_uname: "münchen.example".into(),
        };
        let payload = encode(Some(&data)).unwrap().unwrap();
        assert_eq!(payload.type_url, IDN_TYPE);
        let decoded: Idn = payload.decode().unwrap();
        assert_eq!(decoded.table, "de");
        assert_eq!(decoded.uname, "münchen.example");
    }

    #[test]
    fn absent_idn_is_omitted() {
        assert!(encode(None).unwrap().is_none());
    }
}
