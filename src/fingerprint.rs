use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use sha2::{Digest, Sha256};

use crate::records::{FieldValue, TableRow};

const DIGEST_LEN: usize = 32;

/// SHA-256 over a row's content values. Equal fingerprints mean equal
/// content, whatever page or run the rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    pub fn of<R: TableRow>(row: &R) -> Self {
        Self::of_values(&row.values())
    }

    /// Each value is tagged and length-prefixed so that `Null`, `""` and
    /// values containing separators can never encode alike.
    pub fn of_values(values: &[FieldValue]) -> Self {
        let mut hasher = Sha256::new();
        for value in values {
            match value {
                FieldValue::Null => hasher.update(b"n;"),
                FieldValue::Int(v) => hasher.update(format!("i{v};").as_bytes()),
                FieldValue::Text(s) => {
                    hasher.update(format!("s{}:", s.len()).as_bytes());
                    hasher.update(s.as_bytes());
                    hasher.update(b";");
                }
            }
        }
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != DIGEST_LEN * 2 || !raw.is_ascii() {
            return Err(anyhow!("fingerprint must be {} hex chars", DIGEST_LEN * 2));
        }
        let mut out = [0u8; DIGEST_LEN];
        for (idx, byte) in out.iter_mut().enumerate() {
            let pair = &raw[idx * 2..idx * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| anyhow!("invalid hex in fingerprint {raw:?}"))?;
        }
        Ok(Self(out))
    }
}
