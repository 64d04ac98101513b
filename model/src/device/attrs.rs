use serde::{Deserialize, Serialize};

use crate::region::Region;
use crate::topology::Topology;

/// Fields common to every `BlkDevice` variant (Disk, Partition, Md, LvmLv,
/// Bcache, Encryption).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlkDeviceAttrs {
    /// Absolute device path; must begin with the configured device-dir
    /// prefix (checked by `DeviceGraph::check`).
    pub name: String,
    pub sysfs_name: String,
    pub sysfs_path: String,
    pub active: bool,
    pub region: Region,
    pub udev_paths: Vec<String>,
    pub udev_ids: Vec<String>,
    pub dm_table_name: String,
}

impl BlkDeviceAttrs {
    pub fn new(name: impl Into<String>, region: Region) -> Self {
        Self {
            name: name.into(),
            sysfs_name: String::new(),
            sysfs_path: String::new(),
            active: true,
            region,
            udev_paths: Vec::new(),
            udev_ids: Vec::new(),
            dm_table_name: String::new(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.region.size_bytes()
    }
}

/// Fields added by the `Partitionable` capability (Disk, Md).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartitionableAttrs {
    pub topology: Topology,
    /// Maximum number of child partitions the device's firmware/driver
    /// allows, independent of the partition table's own `max_primary`.
    pub range: u32,
}
