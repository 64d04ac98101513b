use serde::{Deserialize, Serialize};
use sysdefs::{PartitionId, PartitionType};

use super::attrs::BlkDeviceAttrs;
use crate::device::Device;
use crate::error::LookupError;
use crate::graph::DeviceGraph;
use crate::sid::Sid;

/// A partition on some `Partitionable` parent. `number` is the table slot
/// (1-based for MSDOS/GPT) and is unique among siblings sharing a parent
/// partition table, enforced by `DeviceGraph::check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub blk: BlkDeviceAttrs,
    pub number: u32,
    pub partition_type: PartitionType,
    pub id: PartitionId,
    pub boot: bool,
    pub legacy_boot: bool,
}

impl Partition {
    pub fn new(blk: BlkDeviceAttrs, number: u32, partition_type: PartitionType) -> Self {
        let id = PartitionId::default_for_type(partition_type);
        Self {
            blk,
            number,
            partition_type,
            id,
            boot: false,
            legacy_boot: false,
        }
    }
}

fn clear_siblings_then_set(
    graph: &mut DeviceGraph,
    partition: Sid,
    value: bool,
    get: impl Fn(&Partition) -> bool,
    set: impl Fn(&mut Partition, bool),
) -> Result<(), LookupError> {
    if value {
        if let Some(table) = graph.parents(partition)?.into_iter().next() {
            for sibling in graph.children(table)? {
                if sibling == partition {
                    continue;
                }
                if let Some(Device::Partition(p)) = graph.find_by_sid_mut(sibling) {
                    if get(p) {
                        set(p, false);
                    }
                }
            }
        }
    }

    if let Some(Device::Partition(p)) = graph.find_by_sid_mut(partition) {
        set(p, value);
    }

    Ok(())
}

/// Marks `partition` bootable, first clearing `boot` on every other
/// partition under the same table — a table can have at most one boot
/// partition (`GraphCheckError::MultipleBootPartitions` is the detection
/// side of the same invariant). Clearing the flag never touches siblings.
pub fn set_boot_flag(graph: &mut DeviceGraph, partition: Sid, boot: bool) -> Result<(), LookupError> {
    clear_siblings_then_set(graph, partition, boot, |p| p.boot, |p, v| p.boot = v)
}

/// Marks `partition` as the GPT legacy (BIOS) boot partition, first clearing
/// `legacy_boot` on every other partition under the same table.
pub fn set_legacy_boot_flag(graph: &mut DeviceGraph, partition: Sid, legacy_boot: bool) -> Result<(), LookupError> {
    clear_siblings_then_set(graph, partition, legacy_boot, |p| p.legacy_boot, |p, v| p.legacy_boot = v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::partition_table::{PartitionTable, PartitionTableKind};
    use crate::holder::Holder;
    use crate::region::Region;

    fn setup() -> (DeviceGraph, Sid, Sid, Sid) {
        let mut graph = DeviceGraph::new();
        let table = graph.add_device(Device::PartitionTable(PartitionTable::new(PartitionTableKind::Msdos)));
        let p1 = graph.add_device(Device::Partition(Partition::new(
            BlkDeviceAttrs::new("/dev/sda1", Region::new(0, 100, 512)),
            1,
            PartitionType::Primary,
        )));
        let p2 = graph.add_device(Device::Partition(Partition::new(
            BlkDeviceAttrs::new("/dev/sda2", Region::new(100, 100, 512)),
            2,
            PartitionType::Primary,
        )));
        graph.add_edge(table, p1, Holder::Subdevice).unwrap();
        graph.add_edge(table, p2, Holder::Subdevice).unwrap();
        (graph, table, p1, p2)
    }

    fn is_boot(graph: &DeviceGraph, sid: Sid) -> bool {
        matches!(graph.find_by_sid(sid), Some(Device::Partition(p)) if p.boot)
    }

    #[test]
    fn setting_boot_clears_previous_sibling() {
        let (mut graph, _table, p1, p2) = setup();
        set_boot_flag(&mut graph, p1, true).unwrap();
        assert!(is_boot(&graph, p1));
        assert!(!is_boot(&graph, p2));

        set_boot_flag(&mut graph, p2, true).unwrap();
        assert!(!is_boot(&graph, p1));
        assert!(is_boot(&graph, p2));
    }

    #[test]
    fn clearing_boot_does_not_touch_siblings() {
        let (mut graph, _table, p1, p2) = setup();
        set_boot_flag(&mut graph, p1, true).unwrap();
        set_boot_flag(&mut graph, p1, false).unwrap();
        assert!(!is_boot(&graph, p1));
        assert!(!is_boot(&graph, p2));
    }

    #[test]
    fn legacy_boot_is_tracked_independently_of_boot() {
        let (mut graph, _table, p1, p2) = setup();
        set_boot_flag(&mut graph, p1, true).unwrap();
        set_legacy_boot_flag(&mut graph, p2, true).unwrap();

        let Some(Device::Partition(p1)) = graph.find_by_sid(p1) else { unreachable!() };
        assert!(p1.boot);
        assert!(!p1.legacy_boot);
        let Some(Device::Partition(p2)) = graph.find_by_sid(p2) else { unreachable!() };
        assert!(!p2.boot);
        assert!(p2.legacy_boot);
    }
}
