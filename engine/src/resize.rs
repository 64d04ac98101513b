//! Resize/Reallot analysis: given a `BlkDevice` whose region changed between
//! two devicegraphs, work out which descendants must resize alongside it,
//! whether a temporary unmount is needed, and the ordered chain of steps
//! that accomplishes it. Container membership changes (adding/removing a PV
//! from a VG, a member from an Md array) go through `Reallot` instead.

use devgraph::device::md;
use devgraph::{Device, DeviceGraph, Region, Sid, Topology};
use sysdefs::ResizeMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReallotMode {
    Extend,
    Reduce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeStep {
    UnmountFilesystem(Sid),
    ResizeDevice(Sid),
    MountFilesystem(Sid),
}

/// DFS over `sid`'s children in `graph`, stopping at (but including) the
/// first `Filesystem` on each branch and skipping `Md` arrays entirely
/// (their size is derived from their members, never resized directly).
pub fn devices_to_resize(graph: &DeviceGraph, sid: Sid) -> Vec<Sid> {
    let mut result = Vec::new();
    let mut stack = graph.children(sid).unwrap_or_default();
    while let Some(child) = stack.pop() {
        match graph.find_by_sid(child) {
            Some(Device::Md(_)) => continue,
            Some(Device::Filesystem(_)) => result.push(child),
            Some(_) => {
                result.push(child);
                stack.extend(graph.children(child).unwrap_or_default());
            }
            None => {}
        }
    }
    result
}

fn find_descendant_filesystem(graph: &DeviceGraph, sid: Sid) -> Option<Sid> {
    devices_to_resize(graph, sid)
        .into_iter()
        .find(|&s| matches!(graph.find_by_sid(s), Some(Device::Filesystem(_))))
}

pub fn resize_mode(old_size: u64, new_size: u64) -> ResizeMode {
    if new_size < old_size {
        ResizeMode::Shrink
    } else {
        ResizeMode::Grow
    }
}

/// Whether the resize needs the filesystem unmounted first: true unless the
/// filesystem on the RHS supports being resized, in this mode, while
/// mounted.
pub fn needs_tmp_unmount(rhs_fs_type: sysdefs::FilesystemType, mode: ResizeMode) -> bool {
    !rhs_fs_type.supports_mounted_resize(mode)
}

/// Builds the ordered step chain for resizing `sid` from `old_size` to
/// `new_size`, per spec: shrink-order resizes of LHS descendants first (in
/// reverse DFS order), then the device itself, then grow-order resizes of
/// RHS descendants, with an unmount/mount pair wrapped around the whole
/// thing when required.
pub fn plan_resize_chain(
    lhs: &DeviceGraph,
    rhs: &DeviceGraph,
    sid: Sid,
    old_size: u64,
    new_size: u64,
) -> Vec<ResizeStep> {
    let mode = resize_mode(old_size, new_size);
    let lhs_fs = find_descendant_filesystem(lhs, sid);
    let rhs_fs = find_descendant_filesystem(rhs, sid);

    let unmount_needed = match (lhs_fs, rhs_fs) {
        (Some(_), Some(fs)) => match rhs.find_by_sid(fs) {
            Some(Device::Filesystem(f)) => needs_tmp_unmount(f.fs_type, mode),
            _ => false,
        },
        _ => false,
    };

    let mut steps = Vec::new();

    if unmount_needed {
        if let Some(fs) = lhs_fs {
            steps.push(ResizeStep::UnmountFilesystem(fs));
        }
    }

    match mode {
        ResizeMode::Shrink => {
            let mut lhs_descendants = devices_to_resize(lhs, sid);
            lhs_descendants.reverse();
            for d in lhs_descendants {
                if rhs.find_by_sid(d).is_some() {
                    steps.push(ResizeStep::ResizeDevice(d));
                }
            }
            steps.push(ResizeStep::ResizeDevice(sid));
        }
        ResizeMode::Grow => {
            steps.push(ResizeStep::ResizeDevice(sid));
            for d in devices_to_resize(rhs, sid) {
                if lhs.find_by_sid(d).is_some() {
                    steps.push(ResizeStep::ResizeDevice(d));
                }
            }
        }
    }

    if unmount_needed {
        if let Some(fs) = rhs_fs {
            steps.push(ResizeStep::MountFilesystem(fs));
        }
    }

    steps
}

/// Diffs the `MdUser`/PV membership of a container device (`Md` or
/// `LvmVg`) between two graphs and emits the corresponding `Reallot` steps:
/// one `Extend` per member added on the RHS, one `Reduce` per member
/// removed from the LHS.
pub fn reallot_diff(lhs: &DeviceGraph, rhs: &DeviceGraph, sid: Sid) -> Vec<(ReallotMode, Sid)> {
    let lhs_members: Vec<Sid> = lhs.parents(sid).unwrap_or_default();
    let rhs_members: Vec<Sid> = rhs.parents(sid).unwrap_or_default();

    let mut steps = Vec::new();
    for member in &rhs_members {
        if !lhs_members.contains(member) {
            steps.push((ReallotMode::Extend, *member));
        }
    }
    for member in &lhs_members {
        if !rhs_members.contains(member) {
            steps.push((ReallotMode::Reduce, *member));
        }
    }
    steps
}

/// Recomputes what an `Md` array's region and topology should be given its
/// current members in `graph`, the same arithmetic `calculate_region`/
/// `calculate_topology` use when a fresh array is first planned. Returns
/// `None` if `sid` isn't an `Md` node or has no members yet.
pub fn recompute_md_geometry(graph: &DeviceGraph, sid: Sid) -> Option<(Region, Topology)> {
    let device = graph.find_by_sid(sid)?;
    let array = match device {
        Device::Md(m) => m,
        _ => return None,
    };

    let members = graph.parents(sid).unwrap_or_default();
    if members.is_empty() {
        return None;
    }

    let member_sizes: Vec<u64> = members.iter().filter_map(|&m| graph.find_by_sid(m).map(Device::size_bytes)).collect();
    let member_alignment_offset = members
        .iter()
        .filter_map(|&m| graph.find_by_sid(m).and_then(Device::as_partitionable).map(|p| p.topology.alignment_offset))
        .next()
        .unwrap_or(0);

    let block_size = array.blk.region.block_size;
    let chunk_size = array.real_chunk_size();

    let region = md::calculate_region(array.level, &member_sizes, block_size, chunk_size);
    let topology = md::calculate_topology(array.level, chunk_size, members.len(), member_alignment_offset);
    Some((region, topology))
}

pub fn activation_step(lhs_active: bool, rhs_active: bool) -> Option<bool> {
    if lhs_active == rhs_active {
        None
    } else {
        Some(rhs_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgraph::device::{BlkDeviceAttrs, Device as D, Disk, Filesystem};
    use devgraph::region::Region;
    use devgraph::Holder;

    fn disk_with_fs() -> (DeviceGraph, Sid, Sid) {
        let mut graph = DeviceGraph::new();
        let disk = graph.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 1000, 512)))));
        let fs = graph.add_device(D::Filesystem(Filesystem::new(sysdefs::FilesystemType::Ext4)));
        graph.add_edge(disk, fs, Holder::Subdevice).unwrap();
        (graph, disk, fs)
    }

    #[test]
    fn devices_to_resize_finds_filesystem_but_not_beyond() {
        let (graph, disk, fs) = disk_with_fs();
        let resized = devices_to_resize(&graph, disk);
        assert_eq!(resized, vec![fs]);
    }

    #[test]
    fn shrink_mode_when_new_smaller() {
        assert_eq!(resize_mode(100, 50), ResizeMode::Shrink);
        assert_eq!(resize_mode(100, 150), ResizeMode::Grow);
    }

    #[test]
    fn xfs_forbids_mounted_shrink_so_unmount_is_needed() {
        assert!(needs_tmp_unmount(sysdefs::FilesystemType::Xfs, ResizeMode::Shrink));
        assert!(!needs_tmp_unmount(sysdefs::FilesystemType::Xfs, ResizeMode::Grow));
    }

    #[test]
    fn plan_resize_chain_wraps_unmount_around_shrink() {
        let (lhs, disk, fs) = disk_with_fs();
        let rhs = lhs.copy();
        let steps = plan_resize_chain(&lhs, &rhs, disk, 1000 * 512, 500 * 512);
        assert_eq!(
            steps,
            vec![
                ResizeStep::UnmountFilesystem(fs),
                ResizeStep::ResizeDevice(fs),
                ResizeStep::ResizeDevice(disk),
                ResizeStep::MountFilesystem(fs),
            ]
        );
    }
}
