//! The node taxonomy: one `Device` enum covering every kind of vertex that
//! can appear in a `DeviceGraph`, plus capability traits for the
//! cross-cutting views (`BlkDeviceView`, `PartitionableView`) that several
//! variants share. This replaces the original library's class hierarchy
//! (`Device` -> `BlkDevice` -> `Partitionable` -> `Disk`) with a flat sum
//! type: matching on `Device` is exhaustive and the compiler catches a
//! missing variant, where a virtual-dispatch hierarchy would not.

pub mod attrs;
pub mod bcache;
pub mod disk;
pub mod encryption;
pub mod filesystem;
pub mod lvm;
pub mod md;
pub mod partition;
pub mod partition_table;

pub use attrs::{BlkDeviceAttrs, PartitionableAttrs};
pub use bcache::{Bcache, BcacheCset, BcacheKind};
pub use disk::Disk;
pub use encryption::Encryption;
pub use filesystem::{Filesystem, MountPoint};
pub use lvm::{LvmLv, LvmVg};
pub use md::Md;
pub use partition::Partition;
pub use partition_table::{PartitionTable, PartitionTableKind};

use serde::{Deserialize, Serialize};

use crate::sid::Sid;

/// One vertex in a `DeviceGraph`. Every variant carries its own attribute
/// struct (defined in this module's submodules); this enum only tags which
/// one a given node is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Device {
    Disk(Disk),
    Partition(Partition),
    PartitionTable(PartitionTable),
    Md(Md),
    LvmVg(LvmVg),
    LvmLv(LvmLv),
    Bcache(Bcache),
    BcacheCset(BcacheCset),
    Encryption(Encryption),
    Filesystem(Filesystem),
    MountPoint(MountPoint),
}

impl Device {
    /// Short, stable type tag used in error messages and XML persistence;
    /// never changes once emitted, unlike `displayname`.
    pub fn classname(&self) -> &'static str {
        match self {
            Self::Disk(_) => "Disk",
            Self::Partition(_) => "Partition",
            Self::PartitionTable(_) => "PartitionTable",
            Self::Md(_) => "Md",
            Self::LvmVg(_) => "LvmVg",
            Self::LvmLv(_) => "LvmLv",
            Self::Bcache(_) => "Bcache",
            Self::BcacheCset(_) => "BcacheCset",
            Self::Encryption(_) => "Encryption",
            Self::Filesystem(_) => "Filesystem",
            Self::MountPoint(_) => "MountPoint",
        }
    }

    /// A human-friendly identity for logs and error messages: the device
    /// name where one exists, else a description built from the node's own
    /// identifying fields.
    pub fn displayname(&self) -> String {
        match self {
            Self::Disk(d) => d.blk.name.clone(),
            Self::Partition(p) => p.blk.name.clone(),
            Self::Md(m) => m.blk.name.clone(),
            Self::LvmLv(lv) => lv.blk.name.clone(),
            Self::Bcache(b) => b.blk.name.clone(),
            Self::Encryption(e) => e.blk.name.clone(),
            Self::PartitionTable(pt) => format!("partition table ({})", pt.kind.name()),
            Self::LvmVg(vg) => format!("volume group {}", vg.vg_name),
            Self::BcacheCset(cset) => format!("cache set {}", cset.uuid),
            Self::Filesystem(fs) => format!("{} filesystem", fs.fs_type),
            Self::MountPoint(mp) => format!("mount point {}", mp.path),
        }
    }

    pub fn as_blk_device(&self) -> Option<&BlkDeviceAttrs> {
        match self {
            Self::Disk(d) => Some(&d.blk),
            Self::Partition(p) => Some(&p.blk),
            Self::Md(m) => Some(&m.blk),
            Self::LvmLv(lv) => Some(&lv.blk),
            Self::Bcache(b) => Some(&b.blk),
            Self::Encryption(e) => Some(&e.blk),
            _ => None,
        }
    }

    pub fn as_blk_device_mut(&mut self) -> Option<&mut BlkDeviceAttrs> {
        match self {
            Self::Disk(d) => Some(&mut d.blk),
            Self::Partition(p) => Some(&mut p.blk),
            Self::Md(m) => Some(&mut m.blk),
            Self::LvmLv(lv) => Some(&mut lv.blk),
            Self::Bcache(b) => Some(&mut b.blk),
            Self::Encryption(e) => Some(&mut e.blk),
            _ => None,
        }
    }

    pub fn as_partitionable(&self) -> Option<&PartitionableAttrs> {
        match self {
            Self::Disk(d) => Some(&d.partitionable),
            Self::Md(m) => Some(&m.partitionable),
            _ => None,
        }
    }

    pub fn as_partition_table(&self) -> Option<&PartitionTable> {
        match self {
            Self::PartitionTable(pt) => Some(pt),
            _ => None,
        }
    }

    pub fn as_partition(&self) -> Option<&Partition> {
        match self {
            Self::Partition(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_filesystem(&self) -> Option<&Filesystem> {
        match self {
            Self::Filesystem(fs) => Some(fs),
            _ => None,
        }
    }

    /// Size of the region this device occupies, in bytes. Zero for node
    /// kinds with no region of their own (partition tables, VGs, cache sets,
    /// filesystems, mount points; a VG's size is the sum of its physical
    /// volumes' regions, computed by the graph rather than stored here).
    pub fn size_bytes(&self) -> u64 {
        self.as_blk_device().map(|blk| blk.size_bytes()).unwrap_or(0)
    }

    /// True when `self` and `other` agree on every semantically relevant
    /// field, ignoring identity (SID is tracked separately by `Node`) and
    /// cosmetic `BlkDeviceAttrs` fields (`sysfs_name`, `sysfs_path`,
    /// `dm_table_name`) that probing fills in after the fact and that no
    /// staging graph is expected to predict. Used by the planner to decide
    /// whether a matched pair of nodes needs a `Modify` action at all.
    pub fn equal_content(&self, other: &Device) -> bool {
        fn strip_cosmetic(blk: &BlkDeviceAttrs) -> BlkDeviceAttrs {
            BlkDeviceAttrs {
                sysfs_name: String::new(),
                sysfs_path: String::new(),
                dm_table_name: String::new(),
                ..blk.clone()
            }
        }

        match (self.as_blk_device(), other.as_blk_device()) {
            (Some(a), Some(b)) if strip_cosmetic(a) != strip_cosmetic(b) => return false,
            (Some(_), None) | (None, Some(_)) => return false,
            _ => {}
        }

        match (self, other) {
            (Self::Disk(a), Self::Disk(b)) => a.partitionable == b.partitionable && a.rotational == b.rotational && a.transport == b.transport,
            (Self::Partition(a), Self::Partition(b)) => {
                a.number == b.number && a.partition_type == b.partition_type && a.id == b.id && a.boot == b.boot && a.legacy_boot == b.legacy_boot
            }
            (Self::PartitionTable(a), Self::PartitionTable(b)) => a == b,
            (Self::Md(a), Self::Md(b)) => a.partitionable == b.partitionable && a.level == b.level && a.parity == b.parity && a.chunk_size == b.chunk_size,
            (Self::LvmVg(a), Self::LvmVg(b)) => a == b,
            (Self::LvmLv(a), Self::LvmLv(b)) => {
                a.lv_name == b.lv_name && a.lv_type == b.lv_type && a.stripes == b.stripes && a.stripe_size == b.stripe_size && a.chunk_size == b.chunk_size
            }
            (Self::Bcache(a), Self::Bcache(b)) => a.kernel_number == b.kernel_number && a.kind == b.kind,
            (Self::BcacheCset(a), Self::BcacheCset(b)) => a == b,
            (Self::Encryption(a), Self::Encryption(b)) => {
                a.encryption_type == b.encryption_type && a.password == b.password && a.key_file == b.key_file && a.mount_by == b.mount_by
            }
            (Self::Filesystem(a), Self::Filesystem(b)) => a == b,
            (Self::MountPoint(a), Self::MountPoint(b)) => a == b,
            _ => false,
        }
    }
}

/// A graph vertex: a `Device` plus the `Sid` that identifies it across
/// copies of the graph and across a probed/staging pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub sid: Sid,
    pub device: Device,
}

impl Node {
    pub fn new(sid: Sid, device: Device) -> Self {
        Self { sid, device }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    #[test]
    fn equal_content_ignores_cosmetic_blk_fields() {
        let mut probed = Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)));
        probed.blk.sysfs_name = "sda".to_string();
        probed.blk.sysfs_path = "/sys/block/sda".to_string();

        let staging = Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)));

        assert!(Device::Disk(probed).equal_content(&Device::Disk(staging)));
    }

    #[test]
    fn equal_content_detects_real_size_change() {
        let a = Device::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512))));
        let b = Device::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 200, 512))));
        assert!(!a.equal_content(&b));
    }
}
