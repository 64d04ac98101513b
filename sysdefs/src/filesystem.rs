use std::fmt;

use serde::{Deserialize, Serialize};

/// Filesystem types a `Filesystem` device can carry.
///
/// Mirrors the subset of `FsType` that this engine needs to reason about
/// resize/mount behavior for; unrecognized on-disk types round-trip through
/// `Unknown` rather than failing to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilesystemType {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Btrfs,
    Vfat,
    Ntfs,
    Swap,
    Iso9660,
    Nfs,
    Tmpfs,
    Overlay,
    Unknown,
}

impl FilesystemType {
    /// Name as written to `/etc/fstab`'s third column.
    pub fn fstab_name(self) -> &'static str {
        match self {
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Btrfs => "btrfs",
            Self::Vfat => "vfat",
            Self::Ntfs => "ntfs",
            Self::Swap => "swap",
            Self::Iso9660 => "iso9660",
            Self::Nfs => "nfs",
            Self::Tmpfs => "tmpfs",
            Self::Overlay => "overlay",
            Self::Unknown => "auto",
        }
    }

    pub fn from_fstab_name(name: &str) -> Self {
        match name {
            "ext2" => Self::Ext2,
            "ext3" => Self::Ext3,
            "ext4" => Self::Ext4,
            "xfs" => Self::Xfs,
            "btrfs" => Self::Btrfs,
            "vfat" | "msdos" => Self::Vfat,
            "ntfs" | "ntfs3" => Self::Ntfs,
            "swap" => Self::Swap,
            "iso9660" => Self::Iso9660,
            "nfs" | "nfs4" => Self::Nfs,
            "tmpfs" => Self::Tmpfs,
            "overlay" => Self::Overlay,
            _ => Self::Unknown,
        }
    }

    /// Whether this filesystem can be resized while mounted, for the given
    /// resize direction. Used by the resize analyser to decide whether a
    /// temporary unmount is required around a Resize action.
    pub fn supports_mounted_resize(self, mode: super::ResizeMode) -> bool {
        use super::ResizeMode::*;
        match self {
            Self::Ext2 | Self::Ext3 | Self::Ext4 => matches!(mode, Grow),
            Self::Xfs => matches!(mode, Grow),
            Self::Btrfs => true,
            Self::Ntfs | Self::Vfat | Self::Swap | Self::Iso9660 | Self::Nfs | Self::Tmpfs
            | Self::Overlay | Self::Unknown => false,
        }
    }
}

impl fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fstab_name())
    }
}
