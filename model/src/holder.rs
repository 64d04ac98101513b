use serde::{Deserialize, Serialize};

/// An edge in a `DeviceGraph`, directed from the device a thing sits on
/// towards the thing using it (e.g. `Partition -> Filesystem`, `LvmVg ->
/// LvmLv`, `Md -> MdUser -> Filesystem`). The direction matches the
/// reference library's convention so ordering logic (parents before
/// children in creation, reverse in deletion) carries over unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    /// The target is physically carved out of the source: partition table
    /// on a disk, partition on a table, filesystem on a partition, cache set
    /// member on a bcache device.
    Subdevice,
    /// The target consumes the source as a logical building block without
    /// owning its storage directly: mount point using a filesystem, LV using
    /// a VG's extents.
    User,
    /// The target is a software RAID array built from the source member.
    MdUser { spare: bool, faulty: bool },
    /// The target filesystem uses the source device for an auxiliary role
    /// rather than as its primary data device (an external journal device).
    FilesystemUser { journal: bool },
}

impl Holder {
    pub fn is_subdevice(&self) -> bool {
        matches!(self, Holder::Subdevice)
    }
}
