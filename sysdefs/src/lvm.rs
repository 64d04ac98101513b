use std::fmt;

use serde::{Deserialize, Serialize};

/// LVM logical volume flavor, mirroring `LvType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvType {
    #[default]
    Normal,
    ThinPool,
    Thin,
    Raid,
    Unknown,
}

impl fmt::Display for LvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::ThinPool => "thin-pool",
            Self::Thin => "thin",
            Self::Raid => "raid",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
