//! End-to-end planning scenarios: build a staging graph by hand, diff it
//! against an empty (or different) probed graph, and check the resulting
//! action order matches what the transition actually requires.

use devgraph::device::{BlkDeviceAttrs, Device as D, Disk, Filesystem, MountPoint, Partition};
use devgraph::region::Region;
use devgraph::{DeviceGraph, Holder};
use storplan::actiongraph::{build, ActionKind};
use storplan::PlanningError;
use sysdefs::{FilesystemType, PartitionType, TargetMode};

#[test]
fn fresh_disk_to_formatted_mounted_partition_orders_creates_by_dependency() {
    // The disk itself is a fact about the hardware (Direct targeting), so it
    // lives in both graphs; only the partition/filesystem/mount are staged.
    let mut probed = DeviceGraph::new();
    let disk = probed.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2_000_000, 512)))));

    let mut staging = probed.copy();
    let partition = staging.add_device(D::Partition(Partition::new(
        BlkDeviceAttrs::new("/dev/sda1", Region::new(2048, 1_000_000, 512)),
        1,
        PartitionType::Primary,
    )));
    staging.add_edge(disk, partition, Holder::Subdevice).unwrap();

    let fs = staging.add_device(D::Filesystem(Filesystem::new(FilesystemType::Ext4)));
    staging.add_edge(partition, fs, Holder::Subdevice).unwrap();

    let mount = staging.add_device(D::MountPoint(MountPoint::new("/data")));
    staging.add_edge(fs, mount, Holder::User).unwrap();

    let (action_graph, order) = build(&probed, &staging, TargetMode::Direct).unwrap();
    assert_eq!(order.len(), 3);

    let position = |sid| order.iter().position(|&idx| action_graph.action(idx).target == sid).unwrap();

    assert!(position(partition) < position(fs));
    assert!(position(fs) < position(mount));

    for &idx in &order {
        assert_eq!(action_graph.action(idx).kind, ActionKind::Create);
    }
}

#[test]
fn deleting_a_partition_deletes_its_filesystem_first() {
    let mut probed = DeviceGraph::new();
    let disk = probed.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2_000_000, 512)))));
    let partition = probed.add_device(D::Partition(Partition::new(
        BlkDeviceAttrs::new("/dev/sda1", Region::new(2048, 1_000_000, 512)),
        1,
        PartitionType::Primary,
    )));
    probed.add_edge(disk, partition, Holder::Subdevice).unwrap();
    let fs = probed.add_device(D::Filesystem(Filesystem::new(FilesystemType::Ext4)));
    probed.add_edge(partition, fs, Holder::Subdevice).unwrap();

    let staging = probed.copy();
    let mut staging = staging;
    staging.remove_descendants(partition).unwrap();

    let (action_graph, order) = build(&probed, &staging, TargetMode::Direct).unwrap();
    assert_eq!(order.len(), 2);

    let position = |sid| order.iter().position(|&idx| action_graph.action(idx).target == sid).unwrap();
    assert!(position(fs) < position(partition));
}

#[test]
fn creating_a_disk_requires_image_target_mode() {
    let probed = DeviceGraph::new();
    let mut staging = probed.copy();
    staging.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2_000_000, 512)))));

    assert!(matches!(
        build(&probed, &staging, TargetMode::Direct).unwrap_err(),
        PlanningError::CannotCreateDevice(_, _)
    ));
    assert!(build(&probed, &staging, TargetMode::Image).is_ok());
}

#[test]
fn deleting_a_disk_is_always_rejected() {
    let mut probed = DeviceGraph::new();
    probed.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2_000_000, 512)))));
    let staging = DeviceGraph::new();

    assert!(matches!(
        build(&probed, &staging, TargetMode::Image).unwrap_err(),
        PlanningError::CannotDeleteDevice(_, _)
    ));
}

#[test]
fn devicegraph_xml_round_trip_is_structurally_equal() {
    let mut graph = DeviceGraph::new();
    let disk = graph.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2_000_000, 512)))));
    let fs = graph.add_device(D::Filesystem(Filesystem::new(FilesystemType::Xfs)));
    graph.add_edge(disk, fs, Holder::Subdevice).unwrap();

    let xml = graph.to_xml().unwrap();
    let restored = DeviceGraph::from_xml(&String::from_utf8(xml).unwrap()).unwrap();

    assert_eq!(restored.node_count(), graph.node_count());
    assert_eq!(restored.children(disk).unwrap(), graph.children(disk).unwrap());
    assert_eq!(restored.find_by_sid(fs), graph.find_by_sid(fs));
}
