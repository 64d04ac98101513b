use serde::{Deserialize, Serialize};
use sysdefs::OsUuid;

use super::attrs::BlkDeviceAttrs;

/// Whether a bcache device wraps a backing disk (ordinary block device with
/// caching) or is a flash-only device living entirely in the cache set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BcacheKind {
    Backed,
    Flash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bcache {
    pub blk: BlkDeviceAttrs,
    pub kernel_number: u32,
    pub kind: BcacheKind,
}

impl Bcache {
    pub fn new(blk: BlkDeviceAttrs, kernel_number: u32, kind: BcacheKind) -> Self {
        Self {
            blk,
            kernel_number,
            kind,
        }
    }
}

/// The shared cache set a `Bcache` device attaches to, referenced via a
/// `Holder::User` edge from the `Bcache` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BcacheCset {
    pub uuid: OsUuid,
}

impl BcacheCset {
    pub fn new(uuid: OsUuid) -> Self {
        Self { uuid }
    }
}
