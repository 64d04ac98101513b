//! The diff/planner: given a left (probed) and right (staging) devicegraph
//! sharing SIDs, synthesizes the DAG of primitive actions that transforms
//! the left into the right, in a valid execution order.

pub mod compound;

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

use devgraph::{Device, DeviceGraph, Sid};
use sysdefs::{PartitionId, TargetMode};

use crate::error::PlanningError;
use crate::resize::{self, ReallotMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Modify,
    Resize,
    Reallot(ReallotMode),
    Delete,
    Activate,
    Deactivate,
    SetPartitionId(PartitionId),
    SetBoot(bool),
    SetLegacyBoot(bool),
    AddEtcMdadm,
    Rename(String),
    TmpMount(String),
    TmpUnmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub target: Sid,
    pub kind: ActionKind,
}

impl Action {
    fn new(target: Sid, kind: ActionKind) -> Self {
        Self { target, kind }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("action graph has a cycle; no valid execution order exists")]
pub struct PlanningCycle;

/// A DAG of `Action`s; an edge `a -> b` means `a` must commit before `b` is
/// eligible to run.
#[derive(Debug, Default)]
pub struct ActionGraph {
    inner: DiGraph<Action, ()>,
}

impl ActionGraph {
    pub fn new() -> Self {
        Self { inner: DiGraph::new() }
    }

    pub fn add_action(&mut self, target: Sid, kind: ActionKind) -> NodeIndex {
        self.inner.add_node(Action::new(target, kind))
    }

    /// Links a sequence of actions produced for one device in order:
    /// `chain[0]` before `chain[1]` before ... This is how `Create`,
    /// `SetPartitionId`, `SetBoot` for a single new partition stay ordered
    /// relative to each other.
    pub fn add_chain(&mut self, chain: &[NodeIndex]) {
        for pair in chain.windows(2) {
            self.inner.add_edge(pair[0], pair[1], ());
        }
    }

    pub fn add_dependency(&mut self, before: NodeIndex, after: NodeIndex) {
        self.inner.add_edge(before, after, ());
    }

    pub fn action(&self, idx: NodeIndex) -> &Action {
        &self.inner[idx]
    }

    pub fn actions_for(&self, target: Sid) -> Vec<NodeIndex> {
        self.inner
            .node_indices()
            .filter(|&i| self.inner[i].target == target)
            .collect()
    }

    /// Returns the execution order: a topological sort of the action DAG.
    pub fn execution_order(&self) -> Result<Vec<NodeIndex>, PlanningCycle> {
        petgraph::algo::toposort(&self.inner, None).map_err(|_| PlanningCycle)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn roots_for_target(&self, target: Sid) -> Vec<NodeIndex> {
        self.actions_for(target)
            .into_iter()
            .filter(|&i| self.inner.neighbors_directed(i, Direction::Incoming).next().is_none()
                || self
                    .inner
                    .neighbors_directed(i, Direction::Incoming)
                    .all(|p| self.inner[p].target != target))
            .collect()
    }

    fn leaves_for_target(&self, target: Sid) -> Vec<NodeIndex> {
        self.actions_for(target)
            .into_iter()
            .filter(|&i| self.inner.neighbors_directed(i, Direction::Outgoing).next().is_none()
                || self
                    .inner
                    .neighbors_directed(i, Direction::Outgoing)
                    .all(|c| self.inner[c].target != target))
            .collect()
    }
}

fn add_create_actions(ag: &mut ActionGraph, rhs: &DeviceGraph, sid: Sid, mode: TargetMode) -> Result<(), PlanningError> {
    let device = rhs.find_by_sid(sid).expect("sid from rhs index");

    if matches!(device, Device::Disk(_)) && mode != TargetMode::Image {
        return Err(PlanningError::CannotCreateDevice(
            sid,
            "a Disk is a fact about the hardware under Direct targeting and cannot be created".to_string(),
        ));
    }

    let create = ag.add_action(sid, ActionKind::Create);
    let mut chain = vec![create];

    match device {
        Device::Md(_) => {
            let mdadm = ag.add_action(sid, ActionKind::AddEtcMdadm);
            chain.push(mdadm);
        }
        Device::Partition(partition) => {
            let default_id = PartitionId::default_for_type(partition.partition_type);
            if partition.id != default_id && !partition.id.implied_by_create() {
                chain.push(ag.add_action(sid, ActionKind::SetPartitionId(partition.id)));
            }
            if partition.boot {
                chain.push(ag.add_action(sid, ActionKind::SetBoot(true)));
            }
            if partition.legacy_boot {
                chain.push(ag.add_action(sid, ActionKind::SetLegacyBoot(true)));
            }
        }
        _ => {}
    }

    ag.add_chain(&chain);
    Ok(())
}

/// A Disk's deletion is always rejected, in either targeting mode: even
/// assembling a disk image never tears down the image file itself mid-plan,
/// only the partitions/filesystems it carries.
fn add_delete_actions(ag: &mut ActionGraph, lhs: &DeviceGraph, sid: Sid) -> Result<(), PlanningError> {
    let device = lhs.find_by_sid(sid).expect("sid from lhs index");
    if matches!(device, Device::Disk(_)) {
        return Err(PlanningError::CannotDeleteDevice(
            sid,
            "a Disk can never be deleted by a plan".to_string(),
        ));
    }
    ag.add_action(sid, ActionKind::Delete);
    Ok(())
}

fn add_modify_actions(ag: &mut ActionGraph, lhs: &DeviceGraph, rhs: &DeviceGraph, sid: Sid) -> Result<(), PlanningError> {
    let lhs_device = lhs.find_by_sid(sid);
    let rhs_device = rhs.find_by_sid(sid);

    let lhs_size = lhs_device.map(|d| d.size_bytes()).unwrap_or(0);
    let rhs_size = rhs_device.map(|d| d.size_bytes()).unwrap_or(0);

    if lhs_size != rhs_size {
        let steps = resize::plan_resize_chain(lhs, rhs, sid, lhs_size, rhs_size);
        let mut chain = Vec::new();
        for step in steps {
            let (target, kind) = match step {
                resize::ResizeStep::UnmountFilesystem(fs) => (fs, ActionKind::TmpUnmount),
                resize::ResizeStep::ResizeDevice(s) => (s, ActionKind::Resize),
                resize::ResizeStep::MountFilesystem(fs) => (fs, ActionKind::TmpMount(String::new())),
            };
            chain.push(ag.add_action(target, kind));
        }
        ag.add_chain(&chain);
    } else {
        ag.add_action(sid, ActionKind::Modify);
    }

    if let (Some(l), Some(r)) = (lhs_device, rhs_device) {
        if let Some(active) = resize::activation_step(
            l.as_blk_device().map(|b| b.active).unwrap_or(true),
            r.as_blk_device().map(|b| b.active).unwrap_or(true),
        ) {
            let kind = if active { ActionKind::Activate } else { ActionKind::Deactivate };
            ag.add_action(sid, kind);
        }
    }

    let reallot_steps = resize::reallot_diff(lhs, rhs, sid);
    if !reallot_steps.is_empty() {
        if let Some(Device::Md(rhs_md)) = rhs_device {
            if let Some((region, topology)) = resize::recompute_md_geometry(rhs, sid) {
                if region != rhs_md.blk.region || topology != rhs_md.partitionable.topology {
                    return Err(PlanningError::InconsistentGeometry(
                        sid,
                        "the declared region/topology don't match what the new member set produces".to_string(),
                    ));
                }
            }
        }
        for (mode, member) in reallot_steps {
            ag.add_action(member, ActionKind::Reallot(mode));
        }
    }

    Ok(())
}

/// Builds the full action graph for the transition `lhs -> rhs`: diffs by
/// SID, emits per-device create/delete/modify chains, wires the
/// cross-action dependencies spec §4.E lists, and returns the DAG together
/// with a valid execution order.
pub fn build(lhs: &DeviceGraph, rhs: &DeviceGraph, mode: TargetMode) -> Result<(ActionGraph, Vec<NodeIndex>), PlanningError> {
    let lhs_sids: BTreeSet<Sid> = lhs.all_sids().into_iter().collect();
    let rhs_sids: BTreeSet<Sid> = rhs.all_sids().into_iter().collect();

    let only_lhs: Vec<Sid> = lhs_sids.difference(&rhs_sids).copied().collect();
    let only_rhs: Vec<Sid> = rhs_sids.difference(&lhs_sids).copied().collect();
    let both: Vec<Sid> = lhs_sids.intersection(&rhs_sids).copied().collect();

    let mut ag = ActionGraph::new();

    for &sid in &only_rhs {
        add_create_actions(&mut ag, rhs, sid, mode)?;
    }
    for &sid in &only_lhs {
        add_delete_actions(&mut ag, lhs, sid)?;
    }
    for &sid in &both {
        let lhs_device = lhs.find_by_sid(sid);
        let rhs_device = rhs.find_by_sid(sid);
        let changed = match (lhs_device, rhs_device) {
            (Some(l), Some(r)) => !l.equal_content(r),
            _ => true,
        };
        if changed {
            add_modify_actions(&mut ag, lhs, rhs, sid)?;
        }
    }

    wire_dependencies(&mut ag, lhs, rhs, &only_lhs, &only_rhs);

    let order = ag.execution_order()?;
    Ok((ag, order))
}

fn wire_dependencies(ag: &mut ActionGraph, lhs: &DeviceGraph, rhs: &DeviceGraph, only_lhs: &[Sid], only_rhs: &[Sid]) {
    let create_roots: HashMap<Sid, Vec<NodeIndex>> = only_rhs
        .iter()
        .map(|&sid| (sid, ag.roots_for_target(sid)))
        .collect();
    let create_leaves: HashMap<Sid, Vec<NodeIndex>> = only_rhs
        .iter()
        .map(|&sid| (sid, ag.leaves_for_target(sid)))
        .collect();

    // A child device's Create depends on its parents' Creates.
    for &sid in only_rhs {
        for parent in rhs.parents(sid).unwrap_or_default() {
            if let (Some(parent_leaves), Some(child_roots)) = (create_leaves.get(&parent), create_roots.get(&sid)) {
                for &p in parent_leaves {
                    for &c in child_roots {
                        ag.add_dependency(p, c);
                    }
                }
            }
        }
    }

    // A parent's Delete depends on every descendant's Delete.
    let delete_nodes: HashMap<Sid, Vec<NodeIndex>> =
        only_lhs.iter().map(|&sid| (sid, ag.actions_for(sid))).collect();
    for &sid in only_lhs {
        for child in lhs.children(sid).unwrap_or_default() {
            if let (Some(child_nodes), Some(parent_nodes)) = (delete_nodes.get(&child), delete_nodes.get(&sid)) {
                for &c in child_nodes {
                    for &p in parent_nodes {
                        ag.add_dependency(c, p);
                    }
                }
            }
        }
    }

    // mdadm won't persist an array's config to /etc/mdadm.conf until the
    // root filesystem it lives under is actually mounted.
    if let Some(root_mount) = find_root_mount_creation(ag, rhs) {
        let mdadm_nodes: Vec<NodeIndex> = ag
            .inner
            .node_indices()
            .filter(|&i| ag.inner[i].kind == ActionKind::AddEtcMdadm)
            .collect();
        for mdadm in mdadm_nodes {
            ag.add_dependency(root_mount, mdadm);
        }
    }

    // Filesystem mounts on a nested path depend on the mount of any proper
    // prefix; approximated here over TmpMount actions emitted by resize.
    let mounts: Vec<(NodeIndex, String)> = ag
        .inner
        .node_indices()
        .filter_map(|i| match &ag.inner[i].kind {
            ActionKind::TmpMount(path) if !path.is_empty() => Some((i, path.clone())),
            _ => None,
        })
        .collect();
    for &(a, ref path_a) in &mounts {
        for &(b, ref path_b) in &mounts {
            if a != b && path_b.starts_with(path_a.as_str()) && path_b.len() > path_a.len() {
                ag.add_dependency(a, b);
            }
        }
    }
}

/// The Create action for the `MountPoint` whose path is `/`, if the
/// transition creates one.
fn find_root_mount_creation(ag: &ActionGraph, rhs: &DeviceGraph) -> Option<NodeIndex> {
    let root_mp = rhs.nodes().find_map(|n| match &n.device {
        Device::MountPoint(mp) if mp.path == "/" => Some(n.sid),
        _ => None,
    })?;
    ag.actions_for(root_mp)
        .into_iter()
        .find(|&i| ag.inner[i].kind == ActionKind::Create)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgraph::device::{BlkDeviceAttrs, Device as D, Disk};
    use devgraph::region::Region;

    #[test]
    fn diff_of_identical_graphs_is_empty() {
        let mut graph = DeviceGraph::new();
        graph.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));
        let copy = graph.copy();

        let (ag, order) = build(&graph, &copy, TargetMode::Direct).unwrap();
        assert_eq!(ag.node_count(), 0);
        assert!(order.is_empty());
    }

    #[test]
    fn create_only_device_emits_single_create() {
        let lhs = DeviceGraph::new();
        let mut rhs = lhs.copy();
        rhs.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));

        let (ag, order) = build(&lhs, &rhs, TargetMode::Image).unwrap();
        assert_eq!(ag.node_count(), 1);
        assert_eq!(order.len(), 1);
        assert_eq!(ag.action(order[0]).kind, ActionKind::Create);
    }

    #[test]
    fn creating_a_disk_under_direct_mode_is_rejected() {
        let lhs = DeviceGraph::new();
        let mut rhs = lhs.copy();
        rhs.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));

        let err = build(&lhs, &rhs, TargetMode::Direct).unwrap_err();
        assert!(matches!(err, PlanningError::CannotCreateDevice(_, _)));
    }

    #[test]
    fn delete_only_device_emits_single_delete() {
        let mut lhs = DeviceGraph::new();
        let disk = lhs.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));
        let fs = lhs.add_device(D::Filesystem(devgraph::device::Filesystem::new(sysdefs::FilesystemType::Ext4)));
        lhs.add_edge(disk, fs, devgraph::Holder::Subdevice).unwrap();
        let mut rhs = lhs.copy();
        rhs.remove_vertex(fs).unwrap();

        let (ag, order) = build(&lhs, &rhs, TargetMode::Direct).unwrap();
        assert_eq!(ag.node_count(), 1);
        assert_eq!(ag.action(order[0]).kind, ActionKind::Delete);
    }

    #[test]
    fn deleting_a_disk_is_always_rejected() {
        let mut lhs = DeviceGraph::new();
        lhs.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));
        let rhs = DeviceGraph::new();

        let err = build(&lhs, &rhs, TargetMode::Image).unwrap_err();
        assert!(matches!(err, PlanningError::CannotDeleteDevice(_, _)));
    }
}
