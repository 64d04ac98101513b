use serde::{Deserialize, Serialize};
use sysdefs::{MdParity, RaidLevel};

use super::attrs::{BlkDeviceAttrs, PartitionableAttrs};
use crate::region::Region;
use crate::topology::Topology;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Md {
    pub blk: BlkDeviceAttrs,
    pub partitionable: PartitionableAttrs,
    pub level: RaidLevel,
    pub parity: MdParity,
    /// Configured chunk size in bytes, 0 meaning "use the level's default".
    pub chunk_size: u64,
}

impl Md {
    pub fn new(blk: BlkDeviceAttrs, level: RaidLevel) -> Self {
        Self {
            blk,
            partitionable: PartitionableAttrs::default(),
            level,
            parity: MdParity::default(),
            chunk_size: 0,
        }
    }

    pub fn real_chunk_size(&self) -> u64 {
        if self.chunk_size != 0 {
            self.chunk_size
        } else {
            self.level.default_chunk_size()
        }
    }
}

/// Per-member usable size once RAID metadata and alignment are accounted
/// for: round down to a 4 KiB boundary, drop an 8 KiB metadata reservation,
/// then drop whatever remainder doesn't fill a whole chunk.
fn member_usable_size(member_size: u64, chunk_size: u64) -> u64 {
    let aligned = member_size & !0xFFF;
    let usable = aligned.saturating_sub(0x2000);
    if chunk_size == 0 {
        usable
    } else {
        usable - (usable % chunk_size)
    }
}

/// Computes the array's region (length in `block_size`-sized blocks) from
/// the participating members' sizes, following the same per-level
/// arithmetic as the reference storage library: members are first reduced
/// to their usable size, then combined per the RAID level's data layout.
/// `chunk_size` is the array's real chunk size (`Md::real_chunk_size`), not
/// necessarily the level's default.
pub fn calculate_region(level: RaidLevel, member_sizes: &[u64], block_size: u32, chunk_size: u64) -> Region {
    let usable: Vec<u64> = member_sizes
        .iter()
        .map(|&s| member_usable_size(s, chunk_size))
        .collect();

    let total_bytes = match level {
        RaidLevel::Raid0 => usable.iter().sum(),
        RaidLevel::Raid1 => usable.iter().copied().min().unwrap_or(0),
        RaidLevel::Raid5 => {
            let min = usable.iter().copied().min().unwrap_or(0);
            min * usable.len().saturating_sub(1) as u64
        }
        RaidLevel::Raid6 => {
            let min = usable.iter().copied().min().unwrap_or(0);
            min * usable.len().saturating_sub(2) as u64
        }
        RaidLevel::Raid10 => {
            let min = usable.iter().copied().min().unwrap_or(0);
            min * (usable.len() as u64 / 2)
        }
    };

    let length = total_bytes / block_size as u64;
    Region::new(0, length, block_size)
}

/// Computes the array's own optimal I/O size from its chunk size and member
/// count, following the same per-level `opt_io` rule as the reference
/// storage library: a write that size lands on every member without a
/// partial-stripe read-modify-write.
pub fn calculate_topology(level: RaidLevel, chunk_size: u64, member_count: usize, member_alignment_offset: i64) -> Topology {
    let opt_io = match level {
        RaidLevel::Raid0 => chunk_size * member_count as u64,
        RaidLevel::Raid1 => 32 * 1024,
        RaidLevel::Raid5 => chunk_size * member_count.saturating_sub(1) as u64,
        RaidLevel::Raid6 => chunk_size * member_count.saturating_sub(2) as u64,
        RaidLevel::Raid10 => chunk_size * (member_count as u64 / 2),
    };
    Topology::new(member_alignment_offset, opt_io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raid1_takes_smallest_member() {
        let chunk_size = RaidLevel::Raid1.default_chunk_size();
        let region = calculate_region(RaidLevel::Raid1, &[10 * 1024 * 1024, 12 * 1024 * 1024], 512, chunk_size);
        let expected = member_usable_size(10 * 1024 * 1024, chunk_size);
        assert_eq!(region.length, expected / 512);
    }

    #[test]
    fn raid5_loses_one_member_to_parity() {
        let chunk_size = RaidLevel::Raid5.default_chunk_size();
        let sizes = vec![100 * 1024 * 1024; 3];
        let region = calculate_region(RaidLevel::Raid5, &sizes, 512, chunk_size);
        let per_member = member_usable_size(100 * 1024 * 1024, chunk_size);
        assert_eq!(region.length, (per_member * 2) / 512);
    }

    #[test]
    fn raid1_topology_is_a_fixed_32kib() {
        let topology = calculate_topology(RaidLevel::Raid1, RaidLevel::Raid1.default_chunk_size(), 2, 0);
        assert_eq!(topology.optimal_io_size, 32 * 1024);
    }

    #[test]
    fn raid5_topology_excludes_the_parity_member() {
        let chunk_size = 64 * 1024;
        let topology = calculate_topology(RaidLevel::Raid5, chunk_size, 4, 0);
        assert_eq!(topology.optimal_io_size, chunk_size * 3);
    }

    #[test]
    fn real_chunk_size_overrides_the_level_default_in_region_calculation() {
        let mut md = Md::new(BlkDeviceAttrs::new("/dev/md0", Region::new(0, 0, 512)), RaidLevel::Raid0);
        md.chunk_size = 128 * 1024;
        let region = calculate_region(md.level, &[10 * 1024 * 1024, 10 * 1024 * 1024], 512, md.real_chunk_size());
        let expected = member_usable_size(10 * 1024 * 1024, 128 * 1024) * 2;
        assert_eq!(region.length, expected / 512);
    }
}
