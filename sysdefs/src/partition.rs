use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a partition plays within its table.
///
/// `PRIMARY`/`EXTENDED` sit directly under a `PartitionTable`; `LOGICAL`
/// partitions sit inside an `EXTENDED` partition's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionType {
    Primary,
    Extended,
    Logical,
}

impl fmt::Display for PartitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Extended => "extended",
            Self::Logical => "logical",
        };
        f.write_str(s)
    }
}

/// Legacy MBR-style partition id, used both directly (MS-DOS tables) and as
/// an abstract type tag translated to a GPT type GUID (GPT tables).
///
/// Values are the traditional MBR id byte, matching what `fdisk`/`sfdisk`
/// print for an MS-DOS table. Non-standard ids round-trip through `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionId {
    Linux,
    LinuxSwap,
    Extended,
    Dos16,
    Dos32,
    Ntfs,
    WindowsBasicData,
    LinuxRaid,
    LinuxLvm,
    Esp,
    BiosBoot,
    Other(u16),
}

impl PartitionId {
    /// The raw MBR id byte (or a synthetic value above `0xff` for ids that
    /// have no MBR representation, e.g. the ESP, which only exists as a GPT
    /// type GUID in practice but is tracked here as an abstract id).
    pub fn code(self) -> u16 {
        match self {
            Self::Linux => 0x83,
            Self::LinuxSwap => 0x82,
            Self::Extended => 0x05,
            Self::Dos16 => 0x06,
            Self::Dos32 => 0x0c,
            Self::Ntfs => 0x07,
            Self::WindowsBasicData => 0x07,
            Self::LinuxRaid => 0xfd,
            Self::LinuxLvm => 0x8e,
            Self::Esp => 0xef,
            Self::BiosBoot => 0x101,
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            0x83 => Self::Linux,
            0x82 => Self::LinuxSwap,
            0x05 | 0x0f => Self::Extended,
            0x06 => Self::Dos16,
            0x0c => Self::Dos32,
            0x07 => Self::Ntfs,
            0xfd => Self::LinuxRaid,
            0x8e => Self::LinuxLvm,
            0xef => Self::Esp,
            0x101 => Self::BiosBoot,
            other => Self::Other(other),
        }
    }

    /// Human-readable name, only meaningful where
    /// `are_partition_id_values_standardized` is true (MS-DOS tables).
    pub fn name(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::LinuxSwap => "Linux swap",
            Self::Extended => "Extended",
            Self::Dos16 => "FAT16",
            Self::Dos32 => "Win95 FAT32",
            Self::Ntfs | Self::WindowsBasicData => "Windows Basic Data",
            Self::LinuxRaid => "Linux RAID",
            Self::LinuxLvm => "Linux LVM",
            Self::Esp => "EFI System",
            Self::BiosBoot => "BIOS boot",
            Self::Other(_) => "unknown",
        }
    }

    /// The default `id` a newly created partition of `partition_type` gets
    /// (`PartitionTable::default_id_for_type` in the model).
    pub fn default_for_type(partition_type: super::PartitionType) -> Self {
        match partition_type {
            super::PartitionType::Extended => Self::Extended,
            super::PartitionType::Primary | super::PartitionType::Logical => Self::Linux,
        }
    }

    /// Ids for which creation alone is assumed to have set the correct type,
    /// so the planner skips emitting a separate `SetPartitionId` action.
    pub fn implied_by_create(self) -> bool {
        matches!(
            self,
            Self::Linux
                | Self::LinuxSwap
                | Self::Dos16
                | Self::Dos32
                | Self::Ntfs
                | Self::WindowsBasicData
        )
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x} ({})", self.code(), self.name())
    }
}
