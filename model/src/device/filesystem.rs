use serde::{Deserialize, Serialize};
use sysdefs::{FilesystemType, MountByType, OsUuid};

/// A filesystem (or swap signature) written on some block device, addressed
/// from that device via a `Holder::Subdevice` edge to this node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filesystem {
    pub fs_type: FilesystemType,
    pub label: Option<String>,
    pub uuid: Option<OsUuid>,
    pub mkfs_options: Vec<String>,
}

impl Filesystem {
    pub fn new(fs_type: FilesystemType) -> Self {
        Self {
            fs_type,
            label: None,
            uuid: None,
            mkfs_options: Vec::new(),
        }
    }
}

/// A mount point attached to a `Filesystem` node via a `Holder::User` edge.
/// `freq`/`passno` are the `/etc/fstab` dump and fsck-pass fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountPoint {
    pub path: String,
    pub mount_options: Vec<String>,
    pub mount_by: MountByType,
    pub in_etc_fstab: bool,
    pub freq: u32,
    pub passno: u32,
}

impl MountPoint {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let passno = if path == "/" { 1 } else { 2 };
        Self {
            path,
            mount_options: Vec::new(),
            mount_by: MountByType::Uuid,
            in_etc_fstab: true,
            freq: 0,
            passno,
        }
    }
}
