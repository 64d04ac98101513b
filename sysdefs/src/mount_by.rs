use std::fmt;

use serde::{Deserialize, Serialize};

/// How a device is spelled out in the first column of an `/etc/fstab` entry.
///
/// Derived from the device-name prefix; see
/// `EtcFstab::get_mount_by` in the original implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MountByType {
    Uuid,
    Label,
    Id,
    Path,
    Device,
}

impl MountByType {
    /// Classifies a device spec as it would appear in `/etc/fstab`'s first
    /// column.
    pub fn from_device_spec(device: &str) -> Self {
        if device.starts_with("UUID=") || device.starts_with("/dev/disk/by-uuid/") {
            Self::Uuid
        } else if device.starts_with("LABEL=") || device.starts_with("/dev/disk/by-label/") {
            Self::Label
        } else if device.starts_with("/dev/disk/by-id/") {
            Self::Id
        } else if device.starts_with("/dev/disk/by-path/") {
            Self::Path
        } else {
            Self::Device
        }
    }
}

impl fmt::Display for MountByType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_prefix() {
        assert_eq!(
            MountByType::from_device_spec("UUID=abc-123"),
            MountByType::Uuid
        );
        assert_eq!(
            MountByType::from_device_spec("/dev/disk/by-uuid/abc-123"),
            MountByType::Uuid
        );
        assert_eq!(
            MountByType::from_device_spec("LABEL=root"),
            MountByType::Label
        );
        assert_eq!(
            MountByType::from_device_spec("/dev/disk/by-label/root"),
            MountByType::Label
        );
        assert_eq!(
            MountByType::from_device_spec("/dev/disk/by-id/wwn-0x5000"),
            MountByType::Id
        );
        assert_eq!(
            MountByType::from_device_spec("/dev/disk/by-path/pci-0000:00:1f.2-ata-1"),
            MountByType::Path
        );
        assert_eq!(
            MountByType::from_device_spec("/dev/sda1"),
            MountByType::Device
        );
    }
}
