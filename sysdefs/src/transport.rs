use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical transport of a `Disk`, as reported by probing (`udevadm`,
/// `/sys/block/*/device/...`). Kept even though probing itself is out of
/// scope, because `Disk` attributes are part of the devicegraph model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    #[default]
    Unknown,
    Sbp,
    Ata,
    Fc,
    Iscsi,
    Sas,
    Sata,
    Spi,
    Usb,
    Fcoe,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
