use serde::{Deserialize, Serialize};
use sysdefs::{LvType, OsUuid};

use super::attrs::BlkDeviceAttrs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LvmVg {
    pub vg_name: String,
    pub extent_size: u64,
    pub uuid: OsUuid,
}

impl LvmVg {
    pub fn new(vg_name: impl Into<String>, extent_size: u64) -> Self {
        Self {
            vg_name: vg_name.into(),
            extent_size,
            uuid: OsUuid::Relaxed(String::new()),
        }
    }

    pub fn extent_count(&self, size_bytes: u64) -> u64 {
        if self.extent_size == 0 {
            0
        } else {
            size_bytes / self.extent_size
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LvmLv {
    pub blk: BlkDeviceAttrs,
    pub lv_name: String,
    pub lv_type: LvType,
    pub uuid: OsUuid,
    pub stripes: u32,
    pub stripe_size: u64,
    pub chunk_size: u64,
}

impl LvmLv {
    pub fn new(blk: BlkDeviceAttrs, lv_name: impl Into<String>, lv_type: LvType) -> Self {
        Self {
            blk,
            lv_name: lv_name.into(),
            lv_type,
            uuid: OsUuid::Relaxed(String::new()),
            stripes: 0,
            stripe_size: 0,
            chunk_size: 0,
        }
    }

    /// Effective chunk size for a thin pool LV: the configured override, or
    /// the size-derived default when unset. Meaningless for any other
    /// `lv_type`.
    pub fn real_chunk_size(&self) -> u64 {
        if self.chunk_size != 0 {
            self.chunk_size
        } else {
            default_thin_pool_chunk_size(self.blk.size_bytes())
        }
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

fn round_up(value: u64, multiple: u64) -> u64 {
    if multiple == 0 {
        value
    } else {
        value.div_ceil(multiple) * multiple
    }
}

fn next_power_of_two(value: u64) -> u64 {
    if value <= 1 {
        1
    } else {
        value.next_power_of_two()
    }
}

/// Default chunk size for a thin pool of `pool_size_bytes`: the smallest
/// power of two, derived from one 2 MiB-granule step per pool size, clamped
/// to LVM's [64 KiB, 1 GiB] supported range.
pub fn default_thin_pool_chunk_size(pool_size_bytes: u64) -> u64 {
    let raw = next_power_of_two(pool_size_bytes >> 21);
    raw.clamp(64 * KIB, GIB)
}

/// Default metadata-volume size for a thin pool, derived from the number of
/// chunks the pool holds (64 bytes of metadata per chunk), rounded up to a
/// whole extent and clamped to LVM's [2 MiB, 16 GiB] supported range.
pub fn default_thin_pool_metadata_size(pool_size_bytes: u64, chunk_size: u64, extent_size: u64) -> u64 {
    let chunks = if chunk_size == 0 { 0 } else { pool_size_bytes / chunk_size };
    let raw = round_up(chunks * 64, extent_size.max(1));
    raw.clamp(2 * MIB, 16 * GIB)
}

/// A thin pool's chunk size must stay small enough that `chunk_size *
/// 265_289_728` (the maximum number of chunks LVM's on-disk metadata format
/// can index) still covers the pool; this is the same bound `lvcreate`
/// enforces.
pub fn thin_pool_chunk_size_is_valid(pool_size_bytes: u64, chunk_size: u64) -> bool {
    chunk_size != 0 && chunk_size.saturating_mul(265_289_728) >= pool_size_bytes
}

/// Whether `stripe_size` is an acceptable explicit override: a power of two
/// of at least 4 KiB.
pub fn stripe_size_is_valid(stripe_size: u64) -> bool {
    stripe_size >= 4 * KIB && stripe_size & (stripe_size - 1) == 0
}

/// A VG's metadata format can only index this many extents, independent of
/// how much physical volume space is actually presented to it.
const MAX_EXTENT_COUNT_BASE_BYTES: u64 = 65_024 * 1024 * GIB;

/// Ceiling on the number of extents a VG with the given `extent_size` can
/// ever hold, regardless of how many PVs are joined to it.
pub fn max_extent_number(extent_size: u64) -> u64 {
    if extent_size == 0 {
        0
    } else {
        MAX_EXTENT_COUNT_BASE_BYTES / extent_size
    }
}

/// LVM rejects a striped LV with more than 128 stripes.
pub fn stripes_is_valid(stripes: u32) -> bool {
    stripes <= 128
}

/// Whether a thin LV's declared virtual size still fits the addressing range
/// its pool's chunk size can index (the same `265_289_728`-chunk ceiling
/// `thin_pool_chunk_size_is_valid` checks from the pool's side).
pub fn lv_fits_thin_pool(lv_size_bytes: u64, pool_chunk_size: u64) -> bool {
    pool_chunk_size != 0 && lv_size_bytes <= pool_chunk_size.saturating_mul(265_289_728)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thin_pool_chunk_size_examples() {
        assert_eq!(default_thin_pool_chunk_size(1 * GIB), 64 * KIB);
        assert_eq!(default_thin_pool_chunk_size(128 * GIB), 128 * KIB);
    }

    #[test]
    fn thin_pool_chunk_size_clamped_to_one_gib() {
        assert_eq!(default_thin_pool_chunk_size(10 * 1024 * GIB), GIB);
    }

    #[test]
    fn thin_pool_metadata_size_clamped_to_minimum() {
        let meta = default_thin_pool_metadata_size(64 * MIB, 64 * KIB, 4 * MIB);
        assert_eq!(meta, 2 * MIB);
    }

    #[test]
    fn stripe_size_validation() {
        assert!(stripe_size_is_valid(64 * KIB));
        assert!(!stripe_size_is_valid(3 * KIB));
        assert!(!stripe_size_is_valid(96 * KIB));
    }

    #[test]
    fn stripes_validation() {
        assert!(stripes_is_valid(128));
        assert!(!stripes_is_valid(129));
    }

    #[test]
    fn max_extent_number_shrinks_as_extent_size_grows() {
        let small_extents = max_extent_number(4 * MIB);
        let large_extents = max_extent_number(16 * MIB);
        assert!(small_extents > large_extents);
        assert_eq!(max_extent_number(0), 0);
    }

    #[test]
    fn thin_lv_fits_pool_within_chunk_addressing_range() {
        let chunk = 64 * KIB;
        assert!(lv_fits_thin_pool(chunk * 1000, chunk));
        assert!(!lv_fits_thin_pool(chunk.saturating_mul(265_289_728) + chunk, chunk));
        assert!(!lv_fits_thin_pool(GIB, 0));
    }
}
