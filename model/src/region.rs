use std::cmp::{max, min};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open range of blocks on a block device: `[start, start+length)` in
/// units of `block_size` bytes.
///
/// `block_size` must be nonzero; every operation that combines two regions
/// (`intersection`, `unused_regions`) assumes both share the same block
/// size, matching the model invariant that a partition's region block size
/// equals its parent partitionable's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub start: u64,
    pub length: u64,
    pub block_size: u32,
}

impl Region {
    pub fn new(start: u64, length: u64, block_size: u32) -> Self {
        assert!(block_size > 0, "block_size must be nonzero");
        Self {
            start,
            length,
            block_size,
        }
    }

    pub fn empty(block_size: u32) -> Self {
        Self::new(0, 0, block_size)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Last block included in the region. Only meaningful for a nonempty
    /// region.
    pub fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    pub fn to_bytes(&self, blocks: u64) -> u64 {
        blocks * self.block_size as u64
    }

    pub fn size_bytes(&self) -> u64 {
        self.to_bytes(self.length)
    }

    pub fn contains(&self, other: &Region) -> bool {
        self.block_size == other.block_size
            && other.start >= self.start
            && other.end() <= self.end()
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.block_size == other.block_size
            && !self.is_empty()
            && !other.is_empty()
            && self.start <= other.end()
            && other.start <= self.end()
    }

    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.intersects(other) {
            return None;
        }
        let start = max(self.start, other.start);
        let end = min(self.end(), other.end());
        Some(Region::new(start, end - start + 1, self.block_size))
    }

    /// Returns the sub-regions of `self` not covered by any region in
    /// `used`, in ascending order. `used` need not be sorted or
    /// non-overlapping; overlapping or out-of-bounds entries are clipped to
    /// `self` first.
    ///
    /// This is the building block for `get_unused_partition_slots`: the
    /// usable region of a partition table with its existing partitions
    /// subtracted out.
    pub fn unused_regions(&self, used: &[Region]) -> Vec<Region> {
        let mut clipped: Vec<Region> = used
            .iter()
            .filter_map(|r| self.intersection(r))
            .filter(|r| !r.is_empty())
            .collect();
        clipped.sort();

        let mut gaps = Vec::new();
        let mut cursor = self.start;
        for region in &clipped {
            if region.start > cursor {
                gaps.push(Region::new(cursor, region.start - cursor, self.block_size));
            }
            cursor = max(cursor, region.end() + 1);
        }
        if cursor <= self.end() {
            gaps.push(Region::new(cursor, self.end() - cursor + 1, self.block_size));
        }
        gaps
    }
}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Region {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.start, self.length).cmp(&(other.start, other.length))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {} B]",
            self.start, self.length, self.block_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_and_bytes() {
        let r = Region::new(100, 50, 512);
        assert_eq!(r.end(), 149);
        assert_eq!(r.to_bytes(10), 5120);
        assert_eq!(r.size_bytes(), 50 * 512);
    }

    #[test]
    fn intersection_overlapping() {
        let a = Region::new(0, 100, 512);
        let b = Region::new(50, 100, 512);
        assert_eq!(a.intersection(&b), Some(Region::new(50, 50, 512)));
    }

    #[test]
    fn intersection_disjoint() {
        let a = Region::new(0, 10, 512);
        let b = Region::new(20, 10, 512);
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn unused_regions_basic() {
        let whole = Region::new(0, 1000, 512);
        let used = vec![Region::new(100, 100, 512), Region::new(500, 100, 512)];
        let gaps = whole.unused_regions(&used);
        assert_eq!(
            gaps,
            vec![
                Region::new(0, 100, 512),
                Region::new(200, 300, 512),
                Region::new(600, 400, 512),
            ]
        );
    }

    #[test]
    fn unused_regions_no_gaps() {
        let whole = Region::new(0, 100, 512);
        let used = vec![Region::new(0, 100, 512)];
        assert!(whole.unused_regions(&used).is_empty());
    }

    #[test]
    fn sorting() {
        let mut regions = vec![
            Region::new(50, 10, 512),
            Region::new(0, 10, 512),
            Region::new(0, 5, 512),
        ];
        regions.sort();
        assert_eq!(
            regions,
            vec![
                Region::new(0, 5, 512),
                Region::new(0, 10, 512),
                Region::new(50, 10, 512),
            ]
        );
    }
}
