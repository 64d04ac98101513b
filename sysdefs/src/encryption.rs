use std::fmt;

use serde::{Deserialize, Serialize};

/// dm-crypt encryption format carried on an `Encryption` device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionType {
    Luks1,
    Luks2,
    Plain,
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Luks1 => "luks1",
            Self::Luks2 => "luks2",
            Self::Plain => "plain",
        };
        f.write_str(s)
    }
}
