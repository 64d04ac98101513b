use std::fmt;

use serde::{Deserialize, Serialize};

/// Software RAID level, mirroring `MdLevel` in the original implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RaidLevel {
    Raid0,
    Raid1,
    Raid5,
    Raid6,
    Raid10,
}

impl RaidLevel {
    /// Minimum number of non-spare members this level needs to produce a
    /// usable array.
    pub fn min_members(self) -> usize {
        match self {
            Self::Raid0 | Self::Raid1 | Self::Raid10 => 2,
            Self::Raid5 => 3,
            Self::Raid6 => 4,
        }
    }

    /// `mdadm`'s default chunk size for this level, used when the member
    /// devices' chunk size is unset. RAID1 always uses a fixed 64 KiB chunk
    /// so the array stays reshapable into RAID5.
    pub fn default_chunk_size(self) -> u64 {
        if matches!(self, Self::Raid1) {
            64 * 1024
        } else {
            512 * 1024
        }
    }
}

impl fmt::Display for RaidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Raid0 => "RAID0",
            Self::Raid1 => "RAID1",
            Self::Raid5 => "RAID5",
            Self::Raid6 => "RAID6",
            Self::Raid10 => "RAID10",
        };
        f.write_str(s)
    }
}

/// RAID5/6 parity layout, carried on `Md` but not otherwise interpreted by
/// the planner (it is opaque to `mdadm_create`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MdParity {
    #[default]
    Default,
    LeftAsymmetric,
    LeftSymmetric,
    RightAsymmetric,
    RightSymmetric,
}
