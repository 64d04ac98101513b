use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::region::Region;

const ONE_MIB: u64 = 1024 * 1024;

/// I/O alignment hints for a `Partitionable` device: the byte offset at
/// which the device's first aligned sector sits, and its optimal I/O size.
/// Both default to zero for devices with no reported hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Topology {
    pub alignment_offset: i64,
    pub optimal_io_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Start,
    End,
}

/// How `Topology::align` should treat a region that doesn't already sit on a
/// grain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignPolicy {
    /// Align both start and end; the aligned region may be smaller than the
    /// input.
    AlignEnd,
    /// Align only the start; keep the original length.
    KeepSize,
    /// Align only the start; shrink the length to keep the original end.
    KeepEnd,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("region cannot be aligned")]
pub struct AlignError;

impl Topology {
    pub fn new(alignment_offset: i64, optimal_io_size: u64) -> Self {
        Self {
            alignment_offset,
            optimal_io_size,
        }
    }

    /// Alignment granularity: the smallest power-of-two multiple of
    /// `optimal_io_size` that is at least 1 MiB (or exactly 1 MiB when
    /// `optimal_io_size` is zero).
    pub fn grain(&self) -> u64 {
        let mut grain = self.optimal_io_size.max(1);
        while grain < ONE_MIB {
            grain *= 2;
        }
        grain
    }

    fn align_block(&self, sector: u64, block_size: u32, location: Location) -> u64 {
        let block_size = block_size as i64;
        let offset_in_blocks = self.alignment_offset / block_size;
        let grain_in_blocks = (self.grain() / block_size as u64) as i64;

        let mut t = sector as i64 - offset_in_blocks;

        match location {
            Location::Start => {
                let rest = t % grain_in_blocks;
                if rest != 0 {
                    t += grain_in_blocks - rest;
                }
            }
            Location::End => {
                let rest = (t + 1) % grain_in_blocks;
                if rest != 0 {
                    t -= rest;
                }
            }
        }

        (t + offset_in_blocks) as u64
    }

    fn align_helper(&self, region: Region, align_policy: AlignPolicy) -> Option<Region> {
        let block_size = region.block_size;
        let start = self.align_block(region.start, block_size, Location::Start);

        let length = match align_policy {
            AlignPolicy::AlignEnd => {
                let end = self.align_block(region.end(), block_size, Location::End);
                if end < start {
                    return None;
                }
                end - start + 1
            }
            AlignPolicy::KeepSize => region.length,
            AlignPolicy::KeepEnd => {
                if region.end() < start {
                    return None;
                }
                let consumed = start - region.start;
                if consumed > region.length {
                    return None;
                }
                region.length - consumed
            }
        };

        Some(Region::new(start, length, block_size))
    }

    pub fn can_be_aligned(&self, region: &Region, align_policy: AlignPolicy) -> bool {
        self.align_helper(*region, align_policy).is_some()
    }

    pub fn align(&self, region: &Region, align_policy: AlignPolicy) -> Result<Region, AlignError> {
        self.align_helper(*region, align_policy).ok_or(AlignError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grain_defaults_to_one_mib() {
        assert_eq!(Topology::new(0, 0).grain(), ONE_MIB);
    }

    #[test]
    fn grain_is_power_of_two_multiple() {
        let topology = Topology::new(0, 300_000);
        let grain = topology.grain();
        assert!(grain >= ONE_MIB);
        assert_eq!(grain % 300_000, 0);
        assert_eq!(grain / 300_000 & (grain / 300_000 - 1), 0);
    }

    #[test]
    fn align_end_examples_from_spec() {
        let topology = Topology::new(0, 0);
        assert_eq!(
            topology
                .align(&Region::new(0, 10000, 512), AlignPolicy::AlignEnd)
                .unwrap(),
            Region::new(0, 8192, 512)
        );
        assert_eq!(
            topology
                .align(&Region::new(1, 10000, 512), AlignPolicy::AlignEnd)
                .unwrap(),
            Region::new(2048, 6144, 512)
        );
        assert_eq!(
            topology
                .align(&Region::new(1, 10000, 512), AlignPolicy::KeepSize)
                .unwrap(),
            Region::new(2048, 10000, 512)
        );
        assert!(!topology.can_be_aligned(&Region::new(1, 4094, 512), AlignPolicy::AlignEnd));
        assert_eq!(
            topology
                .align(&Region::new(1, 4095, 512), AlignPolicy::AlignEnd)
                .unwrap(),
            Region::new(2048, 2048, 512)
        );
    }

    #[test]
    fn align_with_nonzero_offset() {
        let topology = Topology::new(3584, 0);
        assert_eq!(
            topology
                .align(&Region::new(0, 10000, 512), AlignPolicy::KeepSize)
                .unwrap(),
            Region::new(7, 10000, 512)
        );
    }

    #[test]
    fn align_idempotent() {
        let topology = Topology::new(3584, 300_000);
        for policy in [
            AlignPolicy::AlignEnd,
            AlignPolicy::KeepSize,
            AlignPolicy::KeepEnd,
        ] {
            let region = Region::new(17, 50_000, 512);
            if let Ok(aligned) = topology.align(&region, policy) {
                let realigned = topology.align(&aligned, policy).unwrap();
                assert_eq!(aligned, realigned, "not idempotent for {policy:?}");
            }
        }
    }
}
