use thiserror::Error;

use crate::sid::Sid;

fn pretty_sid(sid: &Sid) -> String {
    format!("sid {sid}")
}

/// Raised by `DeviceGraph::check`: the graph violates one of the structural
/// invariants (acyclicity, unique names, unique SIDs, ...) spec §3 requires
/// of every graph, probed or staging.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphCheckError {
    #[error("device graph contains a cycle touching {}", pretty_sid(.0))]
    Cyclic(Sid),

    #[error("device name '{0}' is used by more than one node")]
    DuplicateName(String),

    #[error("partition number {number} is used more than once under partition table {}", pretty_sid(.table))]
    DuplicatePartitionNumber { table: Sid, number: u32 },

    #[error("more than one partition is marked bootable on {}", pretty_sid(.0))]
    MultipleBootPartitions(Sid),

    #[error("node {} has no parent and is not a root-eligible kind", pretty_sid(.0))]
    OrphanedNode(Sid),

    #[error("mount point '{0}' is used by more than one node")]
    DuplicateMountPoint(String),

    #[error("device name '{0}' does not start with the configured device directory")]
    NameNotUnderDeviceDir(String),

    #[error("logical volume {} has invalid geometry: {1}", pretty_sid(.0))]
    InvalidLvmGeometry(Sid, String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Raised when looking a node up by SID, name, or type and finding none (or,
/// for unique lookups, more than one).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LookupError {
    #[error("no device with {}", pretty_sid(.0))]
    NoSuchSid(Sid),

    #[error("no device named '{0}'")]
    NoSuchName(String),

    #[error("node {} is not a {1}", pretty_sid(.0))]
    WrongKind(Sid, &'static str),
}

/// Raised by region/topology arithmetic: alignment failures, overlapping
/// regions, or a requested size that does not fit in the available space.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GeometryError {
    #[error("region cannot be aligned to the device's topology")]
    CannotAlign,

    #[error("requested region overlaps an existing partition")]
    Overlap,

    #[error("no unused region of at least {needed} blocks is available")]
    NoSpace { needed: u64 },

    #[error("partition table of kind '{kind}' has no free slot of type {partition_type}")]
    NoFreeSlot { kind: &'static str, partition_type: &'static str },

    #[error("volume group {} has no {needed} bytes free", pretty_sid(.vg))]
    NoSpaceInVg { vg: Sid, needed: u64 },

    #[error("thin logical volume {} exceeds the pool's virtual size limit", pretty_sid(.0))]
    MaxSizeForLvmLvThin(Sid),
}

/// Raised when a device's own attributes are inconsistent, independent of
/// its position in the graph — checked at construction time rather than by
/// `DeviceGraph::check`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    #[error("'{0}' is not a valid device name")]
    InvalidName(String),

    #[error("extent size {0} is not a positive power of two")]
    InvalidExtentSize(u64),

    #[error("devices have different block sizes: {0} vs {1}")]
    DifferentBlockSizes(u32, u32),

    #[error("expected {expected} children, found {found}")]
    WrongNumberOfChildren { expected: usize, found: usize },

    #[error("node {} is a {found}, not a {expected}", pretty_sid(.sid))]
    DeviceHasWrongType { sid: Sid, expected: &'static str, found: &'static str },

    #[error("feature '{0}' is not supported on this device")]
    UnsupportedFeature(&'static str),
}
