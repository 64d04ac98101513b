//! Partition-table geometry rules: how many primary/logical slots a table
//! format allows, where the usable region sits, and how to enumerate the
//! gaps a new partition could go into. Grounded on
//! `PartitionTableImpl.cc::get_unused_partition_slots` — the algorithm below
//! follows it step for step, including the one-sector EBR reservation for
//! logical slots.

use devgraph::device::partition_table::{PartitionTable, PartitionTableKind};
use devgraph::device::{Partition, PartitionableAttrs};
use devgraph::region::Region;
use devgraph::topology::AlignPolicy;
use sysdefs::PartitionType;

/// Total addressable slot count (primary + logical) for an MS-DOS table.
/// The format itself never bounds this; it is a practical convention
/// carried over from how Linux historically numbered IDE/SCSI logical
/// partitions, since the original source leaves the figure to the caller.
const MSDOS_MAX_LOGICAL: u32 = 60;

fn max_primary(kind: &PartitionTableKind, range: u32) -> u32 {
    match kind {
        PartitionTableKind::Gpt { .. } => 128.min(range.max(1)),
        PartitionTableKind::Msdos => 4.min(range.max(1)),
        PartitionTableKind::DasdPt => 3,
        PartitionTableKind::ImplicitPt => 1,
    }
}

fn max_logical(kind: &PartitionTableKind) -> u32 {
    match kind {
        PartitionTableKind::Msdos => MSDOS_MAX_LOGICAL,
        _ => 0,
    }
}

fn extended_possible(kind: &PartitionTableKind) -> bool {
    kind.extended_supported()
}

/// A gap a new partition could be created in, with the constraints that
/// apply to creating one there.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSlot {
    pub number: u32,
    pub region: Region,
    pub primary_possible: bool,
    pub extended_possible: bool,
    pub logical_slot: bool,
    pub logical_possible: bool,
}

/// Front/back sector counts reserved for table metadata (MBR/GPT headers and
/// backup structures), not available to any partition.
pub fn unusable_sectors(kind: &PartitionTableKind, region: &Region) -> (u64, u64) {
    match kind {
        PartitionTableKind::Gpt { .. } => {
            let grain = (1024 * 1024 / region.block_size.max(1) as u64).max(1);
            (grain, grain)
        }
        PartitionTableKind::Msdos => (grain_front(region), 0),
        PartitionTableKind::DasdPt | PartitionTableKind::ImplicitPt => (0, 0),
    }
}

fn grain_front(region: &Region) -> u64 {
    (1024 * 1024 / region.block_size.max(1) as u64).max(1)
}

pub fn usable_region(kind: &PartitionTableKind, device_region: &Region) -> Region {
    let (front, back) = unusable_sectors(kind, device_region);
    let start = device_region.start + front;
    let end = device_region.end().saturating_sub(back);
    if end < start {
        Region::empty(device_region.block_size)
    } else {
        Region::new(start, end - start + 1, device_region.block_size)
    }
}

fn first_free_number(partitions: &[&Partition], max_primary: u32) -> u32 {
    let mut sorted: Vec<u32> = partitions.iter().map(|p| p.number).collect();
    sorted.sort_unstable();
    let mut start = 1u32;
    for number in sorted {
        if number <= start && number <= max_primary {
            if number == start {
                start += 1;
            }
        } else {
            break;
        }
    }
    start
}

/// Enumerates every free primary/extended slot, and (if an extended
/// partition exists) every free logical slot inside it, aligning each gap
/// against `partitionable`'s topology under `align_policy`. A gap that fails
/// to align, or a logical gap too small to host an EBR plus any data, is
/// silently skipped (matching the original: it just yields fewer slots).
pub fn get_unused_partition_slots(
    table: &PartitionTable,
    partitionable: &PartitionableAttrs,
    device_region: &Region,
    partitions: &[&Partition],
    extended_region: Option<&Region>,
    align_policy: AlignPolicy,
) -> Vec<PartitionSlot> {
    let kind = &table.kind;
    let max_p = max_primary(kind, partitionable.range);
    let max_l = max_logical(kind);

    let num_primary = partitions
        .iter()
        .filter(|p| p.partition_type == PartitionType::Primary)
        .count() as u32;
    let num_logical = partitions
        .iter()
        .filter(|p| p.partition_type == PartitionType::Logical)
        .count() as u32;
    let has_extended = partitions.iter().any(|p| p.partition_type == PartitionType::Extended);

    let is_primary_possible = num_primary + u32::from(has_extended) < max_p;
    let is_extended_possible = is_primary_possible && extended_possible(kind) && !has_extended;
    let is_logical_possible = has_extended && num_logical < max_l.saturating_sub(max_p);

    let mut slots = Vec::new();

    let non_logical: Vec<&Partition> = partitions
        .iter()
        .filter(|p| p.partition_type != PartitionType::Logical)
        .copied()
        .collect();
    let number = first_free_number(&non_logical, max_p);

    let used: Vec<Region> = non_logical.iter().map(|p| p.blk.region).collect();
    let usable = usable_region(kind, device_region);
    for gap in usable.unused_regions(&used) {
        if let Ok(aligned) = partitionable.topology.align(&gap, align_policy) {
            slots.push(PartitionSlot {
                number,
                region: aligned,
                primary_possible: is_primary_possible,
                extended_possible: is_extended_possible,
                logical_slot: false,
                logical_possible: false,
            });
        }
    }

    if let (true, Some(extended_region)) = (has_extended, extended_region) {
        let logical_number = max_p + num_logical + 1;
        let used: Vec<Region> = partitions
            .iter()
            .filter(|p| p.partition_type == PartitionType::Logical)
            .map(|p| p.blk.region)
            .collect();

        for gap in extended_region.unused_regions(&used) {
            if gap.length <= 1 {
                continue;
            }
            let adjusted = Region::new(gap.start + 1, gap.length - 1, gap.block_size);
            if let Ok(aligned) = partitionable.topology.align(&adjusted, align_policy) {
                slots.push(PartitionSlot {
                    number: logical_number,
                    region: aligned,
                    primary_possible: false,
                    extended_possible: false,
                    logical_slot: true,
                    logical_possible: is_logical_possible,
                });
            }
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgraph::device::{BlkDeviceAttrs, Partition};
    use devgraph::topology::Topology;

    fn partitionable() -> PartitionableAttrs {
        PartitionableAttrs {
            topology: Topology::default(),
            range: 16,
        }
    }

    #[test]
    fn fresh_msdos_disk_has_one_primary_slot() {
        let table = PartitionTable::new(PartitionTableKind::Msdos);
        let device_region = Region::new(0, 100_000, 512);
        let slots = get_unused_partition_slots(&table, &partitionable(), &device_region, &[], None, AlignPolicy::AlignEnd);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].number, 1);
        assert!(slots[0].primary_possible);
        assert!(slots[0].extended_possible);
    }

    #[test]
    fn first_free_number_skips_existing() {
        let p1 = Partition::new(BlkDeviceAttrs::new("/dev/sda1", Region::new(0, 10, 512)), 1, PartitionType::Primary);
        assert_eq!(first_free_number(&[&p1], 4), 2);
    }

    #[test]
    fn msdos_max_primary_respects_range() {
        assert_eq!(max_primary(&PartitionTableKind::Msdos, 2), 2);
        assert_eq!(max_primary(&PartitionTableKind::Msdos, 16), 4);
    }
}
