use std::collections::{BTreeMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

use crate::device::lvm::{lv_fits_thin_pool, max_extent_number, stripe_size_is_valid, stripes_is_valid, thin_pool_chunk_size_is_valid};
use crate::device::{Device, Node};
use crate::error::{GeometryError, GraphCheckError, LookupError, ValidationError};
use crate::holder::Holder;
use crate::sid::{Sid, SidAllocator};

/// Prefix every block device's `name` must start with; enforced by `check`.
const DEVICE_DIR: &str = "/dev/";

type Inner = StableDiGraph<Node, Holder>;

/// A typed DAG over a machine's (or a desired) block-device stack: disks,
/// partitions, RAID, LVM, bcache, encryption, filesystems and mount points,
/// each a `Node` with a stable `Sid`, connected by `Holder` edges.
///
/// A `DeviceGraph` produced by probing the running system is the "probed"
/// graph; `copy()` produces an independent "staging" graph a caller mutates
/// to describe the desired end state. Both share the same `SidAllocator`, so
/// new nodes created in either never collide, and the planner can still
/// recognize nodes the two graphs have in common by comparing SIDs.
#[derive(Debug, Clone)]
pub struct DeviceGraph {
    inner: Inner,
    by_sid: BTreeMap<Sid, NodeIndex>,
    allocator: SidAllocator,
}

impl Default for DeviceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceGraph {
    pub fn new() -> Self {
        Self {
            inner: StableDiGraph::new(),
            by_sid: BTreeMap::new(),
            allocator: SidAllocator::new(),
        }
    }

    fn with_allocator(allocator: SidAllocator) -> Self {
        Self {
            inner: StableDiGraph::new(),
            by_sid: BTreeMap::new(),
            allocator,
        }
    }

    /// Adds a device with a freshly allocated SID and returns it.
    pub fn add_device(&mut self, device: Device) -> Sid {
        let sid = self.allocator.allocate();
        let idx = self.inner.add_node(Node::new(sid, device));
        self.by_sid.insert(sid, idx);
        sid
    }

    /// Re-inserts a node that already carries a SID, used when
    /// deserializing a persisted graph. Panics if the SID is already
    /// present; callers load into a fresh graph.
    pub fn insert_node(&mut self, node: Node) {
        let sid = node.sid;
        let idx = self.inner.add_node(node);
        assert!(
            self.by_sid.insert(sid, idx).is_none(),
            "duplicate sid {sid} on load"
        );
    }

    /// Advances this graph's allocator past `sid`, so a later `add_device`
    /// can't hand out a SID that collides with one already present. Used
    /// right after loading nodes from XML, which carry their own SIDs.
    pub fn seed_allocator_past(&self, sid: Sid) {
        self.allocator.seed_past(sid);
    }

    pub fn add_edge(&mut self, parent: Sid, child: Sid, holder: Holder) -> Result<(), LookupError> {
        let p = self.index_of(parent)?;
        let c = self.index_of(child)?;
        self.inner.add_edge(p, c, holder);
        Ok(())
    }

    fn index_of(&self, sid: Sid) -> Result<NodeIndex, LookupError> {
        self.by_sid.get(&sid).copied().ok_or(LookupError::NoSuchSid(sid))
    }

    pub fn find_by_sid(&self, sid: Sid) -> Option<&Device> {
        let idx = *self.by_sid.get(&sid)?;
        self.inner.node_weight(idx).map(|n| &n.device)
    }

    pub fn find_by_sid_mut(&mut self, sid: Sid) -> Option<&mut Device> {
        let idx = *self.by_sid.get(&sid)?;
        self.inner.node_weight_mut(idx).map(|n| &mut n.device)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Sid> {
        self.inner
            .node_weights()
            .find(|n| n.device.as_blk_device().map(|b| b.name.as_str()) == Some(name))
            .map(|n| n.sid)
    }

    /// Looks a block device up by its primary name or by any of its stable
    /// udev aliases (`udev_paths`/`udev_ids`), the way a reference to a disk
    /// in configuration is resolved against the probed graph.
    pub fn find_by_any_name(&self, name: &str) -> Option<Sid> {
        self.inner
            .node_weights()
            .find(|n| match n.device.as_blk_device() {
                Some(blk) => {
                    blk.name == name
                        || blk.udev_paths.iter().any(|p| p == name)
                        || blk.udev_ids.iter().any(|i| i == name)
                }
                None => false,
            })
            .map(|n| n.sid)
    }

    pub fn get_devices_of_type(&self, classname: &str) -> Vec<Sid> {
        self.inner
            .node_weights()
            .filter(|n| n.device.classname() == classname)
            .map(|n| n.sid)
            .collect()
    }

    pub fn parents(&self, sid: Sid) -> Result<Vec<Sid>, LookupError> {
        let idx = self.index_of(sid)?;
        Ok(self
            .inner
            .neighbors_directed(idx, Direction::Incoming)
            .map(|i| self.inner[i].sid)
            .collect())
    }

    pub fn children(&self, sid: Sid) -> Result<Vec<Sid>, LookupError> {
        let idx = self.index_of(sid)?;
        Ok(self
            .inner
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|i| self.inner[i].sid)
            .collect())
    }

    /// Children reached via an edge for which `filter` returns true, e.g.
    /// `Holder::is_subdevice` to walk only physical containment.
    pub fn children_via(&self, sid: Sid, filter: impl Fn(&Holder) -> bool) -> Result<Vec<Sid>, LookupError> {
        let idx = self.index_of(sid)?;
        Ok(self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| filter(e.weight()))
            .map(|e| self.inner[e.target()].sid)
            .collect())
    }

    pub fn siblings(&self, sid: Sid) -> Result<Vec<Sid>, LookupError> {
        let mut result = HashSet::new();
        for parent in self.parents(sid)? {
            for child in self.children(parent)? {
                if child != sid {
                    result.insert(child);
                }
            }
        }
        Ok(result.into_iter().collect())
    }

    pub fn ancestors(&self, sid: Sid) -> Result<Vec<Sid>, LookupError> {
        let idx = self.index_of(sid)?;
        let mut seen = HashSet::new();
        let mut stack = vec![idx];
        while let Some(cur) = stack.pop() {
            for parent in self.inner.neighbors_directed(cur, Direction::Incoming) {
                if seen.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        Ok(seen.into_iter().map(|i| self.inner[i].sid).collect())
    }

    pub fn descendants(&self, sid: Sid) -> Result<Vec<Sid>, LookupError> {
        let idx = self.index_of(sid)?;
        let mut seen = HashSet::new();
        let mut stack = vec![idx];
        while let Some(cur) = stack.pop() {
            for child in self.inner.neighbors_directed(cur, Direction::Outgoing) {
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        Ok(seen.into_iter().map(|i| self.inner[i].sid).collect())
    }

    pub fn roots(&self) -> Vec<Sid> {
        self.inner
            .node_indices()
            .filter(|&i| self.inner.neighbors_directed(i, Direction::Incoming).next().is_none())
            .map(|i| self.inner[i].sid)
            .collect()
    }

    pub fn leaves(&self) -> Vec<Sid> {
        self.inner
            .node_indices()
            .filter(|&i| self.inner.neighbors_directed(i, Direction::Outgoing).next().is_none())
            .map(|i| self.inner[i].sid)
            .collect()
    }

    /// Removes a single node and its incident edges, leaving any remaining
    /// neighbors disconnected from each other (no implicit reconnection).
    pub fn remove_vertex(&mut self, sid: Sid) -> Result<(), LookupError> {
        let idx = self.index_of(sid)?;
        self.inner.remove_node(idx);
        self.by_sid.remove(&sid);
        Ok(())
    }

    /// Removes a node and everything reachable from it, the usual way to
    /// tear down e.g. a disk and every partition/filesystem/mount point it
    /// carries in one call.
    pub fn remove_descendants(&mut self, sid: Sid) -> Result<(), LookupError> {
        let mut victims = self.descendants(sid)?;
        victims.push(sid);
        for victim in victims {
            self.remove_vertex(victim)?;
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn all_sids(&self) -> Vec<Sid> {
        self.inner.node_weights().map(|n| n.sid).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> Vec<(Sid, Sid, Holder)> {
        self.inner
            .edge_references()
            .map(|e| (self.inner[e.source()].sid, self.inner[e.target()].sid, *e.weight()))
            .collect()
    }

    /// Produces an independent graph with the same nodes and edges,
    /// preserving every SID, sharing this graph's allocator so subsequent
    /// `add_device` calls on either copy never collide. This is how a
    /// staging graph is derived from a probed one.
    pub fn copy(&self) -> DeviceGraph {
        let mut copy = DeviceGraph::with_allocator(self.allocator.clone());
        for node in self.inner.node_weights() {
            copy.insert_node(node.clone());
        }
        for edge in self.inner.edge_references() {
            let parent = self.inner[edge.source()].sid;
            let child = self.inner[edge.target()].sid;
            copy
                .add_edge(parent, child, *edge.weight())
                .expect("node copied above");
        }
        copy
    }

    /// Validates every structural invariant a graph must hold, probed or
    /// staging: acyclicity, unique device/mount-point names under the
    /// configured device directory, unique partition numbers and at most
    /// one boot partition per table, a table's slot count within its
    /// format's limit, matching block sizes between a table and its
    /// partitions, a sane LVM extent size, a VG's extent budget against its
    /// PVs and LVs, LV striping limits, a thin LV against its pool's
    /// addressing range, and every non-root node reachable from something.
    /// Returns every violation found rather than stopping at the first.
    pub fn check(&self) -> Result<(), Vec<GraphCheckError>> {
        let mut errors = Vec::new();

        if petgraph::algo::is_cyclic_directed(&self.inner) {
            if let Some(idx) = self.inner.node_indices().next() {
                errors.push(GraphCheckError::Cyclic(self.inner[idx].sid));
            }
        }

        let mut names: BTreeMap<&str, Sid> = BTreeMap::new();
        let mut mount_points: BTreeMap<&str, Sid> = BTreeMap::new();
        for node in self.inner.node_weights() {
            if let Some(blk) = node.device.as_blk_device() {
                if let Some(prev) = names.insert(blk.name.as_str(), node.sid) {
                    let _ = prev;
                    errors.push(GraphCheckError::DuplicateName(blk.name.clone()));
                }
                if !blk.name.starts_with(DEVICE_DIR) {
                    errors.push(GraphCheckError::NameNotUnderDeviceDir(blk.name.clone()));
                }
            }
            if let Device::MountPoint(mp) = &node.device {
                if let Some(prev) = mount_points.insert(mp.path.as_str(), node.sid) {
                    let _ = prev;
                    errors.push(GraphCheckError::DuplicateMountPoint(mp.path.clone()));
                }
            }
            if let Device::LvmVg(vg) = &node.device {
                if vg.extent_size == 0 || !vg.extent_size.is_power_of_two() {
                    errors.push(ValidationError::InvalidExtentSize(vg.extent_size).into());
                }
            }
        }

        // Every node except a Disk or a bcache cache set must be reachable
        // from something: either the physical device it sits on, or (for an
        // Md array/LvmVg) the members that make it up.
        for node in self.inner.node_weights() {
            let root_eligible = matches!(node.device, Device::Disk(_) | Device::BcacheCset(_));
            if !root_eligible && self.parents(node.sid).map(|p| p.is_empty()).unwrap_or(true) {
                errors.push(GraphCheckError::OrphanedNode(node.sid));
            }
        }

        for idx in self.inner.node_indices() {
            let node = &self.inner[idx];
            if let Device::PartitionTable(pt) = &node.device {
                let parent_block_size = self
                    .inner
                    .neighbors_directed(idx, Direction::Incoming)
                    .find_map(|p| self.inner[p].device.as_blk_device())
                    .map(|blk| blk.region.block_size);

                let mut numbers: BTreeMap<u32, Sid> = BTreeMap::new();
                let mut boot_count = 0usize;
                let mut slot_count = 0usize;
                for child_idx in self.inner.neighbors_directed(idx, Direction::Outgoing) {
                    if let Device::Partition(p) = &self.inner[child_idx].device {
                        slot_count += 1;
                        if numbers.insert(p.number, self.inner[child_idx].sid).is_some() {
                            errors.push(GraphCheckError::DuplicatePartitionNumber {
                                table: node.sid,
                                number: p.number,
                            });
                        }
                        if p.boot {
                            boot_count += 1;
                        }
                        if let Some(parent_bs) = parent_block_size {
                            if parent_bs != p.blk.region.block_size {
                                errors.push(
                                    ValidationError::DifferentBlockSizes(parent_bs, p.blk.region.block_size).into(),
                                );
                            }
                        }
                    }
                }
                if boot_count > 1 {
                    errors.push(GraphCheckError::MultipleBootPartitions(node.sid));
                }
                if let Some(max) = pt.kind.max_primary() {
                    if slot_count > max as usize {
                        errors.push(
                            ValidationError::WrongNumberOfChildren {
                                expected: max as usize,
                                found: slot_count,
                            }
                            .into(),
                        );
                    }
                }
            }
        }

        for node in self.inner.node_weights() {
            let Device::LvmVg(vg) = &node.device else { continue };

            let pv_bytes: u64 = self
                .parents(node.sid)
                .unwrap_or_default()
                .iter()
                .filter_map(|&p| self.find_by_sid(p).map(Device::size_bytes))
                .sum();
            let available_extents = vg.extent_count(pv_bytes).min(max_extent_number(vg.extent_size));

            let lv_sids = self.children(node.sid).unwrap_or_default();
            let pool = lv_sids.iter().find_map(|&sid| match self.find_by_sid(sid) {
                Some(Device::LvmLv(lv)) if lv.lv_type == sysdefs::LvType::ThinPool => Some(lv.clone()),
                _ => None,
            });

            let mut consumed_extents = 0u64;
            for &lv_sid in &lv_sids {
                let Some(Device::LvmLv(lv)) = self.find_by_sid(lv_sid) else { continue };

                if lv.stripes > 0 && !stripes_is_valid(lv.stripes) {
                    errors.push(GraphCheckError::InvalidLvmGeometry(
                        lv_sid,
                        format!("{} stripes exceeds LVM's maximum of 128", lv.stripes),
                    ));
                }
                if lv.stripe_size != 0 && !stripe_size_is_valid(lv.stripe_size) {
                    errors.push(GraphCheckError::InvalidLvmGeometry(
                        lv_sid,
                        format!("stripe size {} is not a power of two of at least 4 KiB", lv.stripe_size),
                    ));
                }

                match lv.lv_type {
                    sysdefs::LvType::ThinPool => {
                        if lv.chunk_size != 0 && !thin_pool_chunk_size_is_valid(lv.blk.size_bytes(), lv.chunk_size) {
                            errors.push(GraphCheckError::InvalidLvmGeometry(
                                lv_sid,
                                format!(
                                    "chunk size {} cannot address a pool of {} bytes",
                                    lv.chunk_size,
                                    lv.blk.size_bytes()
                                ),
                            ));
                        }
                        consumed_extents += vg.extent_count(lv.blk.size_bytes());
                    }
                    sysdefs::LvType::Thin => {
                        if let Some(pool) = &pool {
                            if !lv_fits_thin_pool(lv.blk.size_bytes(), pool.real_chunk_size()) {
                                errors.push(GraphCheckError::Geometry(GeometryError::MaxSizeForLvmLvThin(lv_sid)));
                            }
                        }
                    }
                    _ => consumed_extents += vg.extent_count(lv.blk.size_bytes()),
                }
            }

            if consumed_extents > available_extents {
                errors.push(GraphCheckError::Geometry(GeometryError::NoSpaceInVg {
                    vg: node.sid,
                    needed: consumed_extents - available_extents,
                }));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BlkDeviceAttrs, Disk};
    use crate::region::Region;

    fn disk(name: &str, size: u64) -> Device {
        Device::Disk(Disk::new(BlkDeviceAttrs::new(name, Region::new(0, size / 512, 512))))
    }

    #[test]
    fn add_and_find_roundtrip() {
        let mut graph = DeviceGraph::new();
        let sid = graph.add_device(disk("/dev/sda", 1024 * 1024 * 1024));
        assert_eq!(graph.find_by_sid(sid).unwrap().classname(), "Disk");
        assert_eq!(graph.find_by_name("/dev/sda"), Some(sid));
    }

    #[test]
    fn copy_is_independent_but_shares_sids() {
        let mut graph = DeviceGraph::new();
        let sid = graph.add_device(disk("/dev/sda", 1024));
        let mut staging = graph.copy();
        assert_eq!(staging.find_by_sid(sid).unwrap().classname(), "Disk");

        let new_sid = staging.add_device(disk("/dev/sdb", 1024));
        assert!(graph.find_by_sid(new_sid).is_none());

        let graph_sid = graph.add_device(disk("/dev/sdc", 1024));
        assert_ne!(graph_sid, new_sid);
    }

    #[test]
    fn remove_descendants_removes_whole_subtree() {
        let mut graph = DeviceGraph::new();
        let disk_sid = graph.add_device(disk("/dev/sda", 1024));
        let part_sid = graph.add_device(Device::Filesystem(crate::device::Filesystem::new(
            sysdefs::FilesystemType::Ext4,
        )));
        graph.add_edge(disk_sid, part_sid, Holder::Subdevice).unwrap();

        graph.remove_descendants(disk_sid).unwrap();
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn check_detects_duplicate_names() {
        let mut graph = DeviceGraph::new();
        graph.add_device(disk("/dev/sda", 1024));
        graph.add_device(disk("/dev/sda", 2048));
        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::DuplicateName(n) if n == "/dev/sda")));
    }

    #[test]
    fn check_detects_duplicate_partition_numbers() {
        use crate::device::partition_table::{PartitionTable, PartitionTableKind};
        use crate::device::Partition;
        use sysdefs::PartitionType;

        let mut graph = DeviceGraph::new();
        let table_sid = graph.add_device(Device::PartitionTable(PartitionTable::new(PartitionTableKind::Msdos)));
        let p1 = graph.add_device(Device::Partition(Partition::new(
            BlkDeviceAttrs::new("/dev/sda1", Region::new(0, 100, 512)),
            1,
            PartitionType::Primary,
        )));
        let p2 = graph.add_device(Device::Partition(Partition::new(
            BlkDeviceAttrs::new("/dev/sda2", Region::new(100, 100, 512)),
            1,
            PartitionType::Primary,
        )));
        graph.add_edge(table_sid, p1, Holder::Subdevice).unwrap();
        graph.add_edge(table_sid, p2, Holder::Subdevice).unwrap();

        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::DuplicatePartitionNumber { number: 1, .. })));
    }

    #[test]
    fn check_detects_orphaned_filesystem() {
        let mut graph = DeviceGraph::new();
        let fs = graph.add_device(Device::Filesystem(crate::device::Filesystem::new(sysdefs::FilesystemType::Ext4)));
        let errors = graph.check().unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, GraphCheckError::OrphanedNode(sid) if *sid == fs)));
    }

    #[test]
    fn check_allows_a_disk_with_no_parent() {
        let mut graph = DeviceGraph::new();
        graph.add_device(disk("/dev/sda", 1024));
        assert!(graph.check().is_ok());
    }

    #[test]
    fn check_detects_name_outside_device_dir() {
        let mut graph = DeviceGraph::new();
        graph.add_device(disk("not-a-dev-path", 1024));
        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::NameNotUnderDeviceDir(n) if n == "not-a-dev-path")));
    }

    #[test]
    fn check_detects_invalid_vg_extent_size() {
        use crate::device::LvmVg;

        let mut graph = DeviceGraph::new();
        graph.add_device(Device::LvmVg(LvmVg::new("vg0", 3 * 1024 * 1024)));
        let errors = graph.check().unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            GraphCheckError::Validation(ValidationError::InvalidExtentSize(_))
        )));
    }

    #[test]
    fn check_detects_too_many_msdos_slots() {
        use crate::device::partition_table::{PartitionTable, PartitionTableKind};
        use crate::device::Partition;
        use sysdefs::PartitionType;

        let mut graph = DeviceGraph::new();
        let table_sid = graph.add_device(Device::PartitionTable(PartitionTable::new(PartitionTableKind::Msdos)));
        for n in 1..=5u32 {
            let p = graph.add_device(Device::Partition(Partition::new(
                BlkDeviceAttrs::new(format!("/dev/sda{n}"), Region::new(0, 100, 512)),
                n,
                PartitionType::Primary,
            )));
            graph.add_edge(table_sid, p, Holder::Subdevice).unwrap();
        }

        let errors = graph.check().unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            GraphCheckError::Validation(ValidationError::WrongNumberOfChildren { expected: 4, found: 5 })
        )));
    }

    #[test]
    fn check_detects_partition_block_size_mismatch() {
        use crate::device::partition_table::{PartitionTable, PartitionTableKind};
        use crate::device::Partition;
        use sysdefs::PartitionType;

        let mut graph = DeviceGraph::new();
        let disk_sid = graph.add_device(disk("/dev/sda", 1024));
        let table_sid = graph.add_device(Device::PartitionTable(PartitionTable::new(PartitionTableKind::Gpt { enlarge: false })));
        graph.add_edge(disk_sid, table_sid, Holder::Subdevice).unwrap();
        let p = graph.add_device(Device::Partition(Partition::new(
            BlkDeviceAttrs::new("/dev/sda1", Region::new(0, 100, 4096)),
            1,
            PartitionType::Primary,
        )));
        graph.add_edge(table_sid, p, Holder::Subdevice).unwrap();

        let errors = graph.check().unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            GraphCheckError::Validation(ValidationError::DifferentBlockSizes(512, 4096))
        )));
    }

    fn lv(name: &str, size: u64, lv_type: sysdefs::LvType) -> Device {
        Device::LvmLv(crate::device::LvmLv::new(BlkDeviceAttrs::new(name, Region::new(0, size / 512, 512)), name, lv_type))
    }

    #[test]
    fn check_detects_vg_overcommit() {
        use crate::device::LvmVg;

        let mut graph = DeviceGraph::new();
        let pv = graph.add_device(disk("/dev/sda", 1024 * 1024 * 1024));
        let vg = graph.add_device(Device::LvmVg(LvmVg::new("vg0", 4 * 1024 * 1024)));
        graph.add_edge(pv, vg, Holder::User).unwrap();

        let lv0 = graph.add_device(lv("/dev/vg0/lv0", 2 * 1024 * 1024 * 1024, sysdefs::LvType::Normal));
        graph.add_edge(vg, lv0, Holder::User).unwrap();

        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::Geometry(GeometryError::NoSpaceInVg { vg: v, .. }) if *v == vg)));
    }

    #[test]
    fn check_allows_a_vg_within_its_extent_budget() {
        use crate::device::LvmVg;

        let mut graph = DeviceGraph::new();
        let pv = graph.add_device(disk("/dev/sda", 4 * 1024 * 1024 * 1024));
        let vg = graph.add_device(Device::LvmVg(LvmVg::new("vg0", 4 * 1024 * 1024)));
        graph.add_edge(pv, vg, Holder::User).unwrap();

        let lv0 = graph.add_device(lv("/dev/vg0/lv0", 2 * 1024 * 1024 * 1024, sysdefs::LvType::Normal));
        graph.add_edge(vg, lv0, Holder::User).unwrap();

        assert!(graph.check().is_ok());
    }

    #[test]
    fn check_detects_too_many_stripes() {
        use crate::device::LvmVg;

        let mut graph = DeviceGraph::new();
        let pv = graph.add_device(disk("/dev/sda", 4 * 1024 * 1024 * 1024));
        let vg = graph.add_device(Device::LvmVg(LvmVg::new("vg0", 4 * 1024 * 1024)));
        graph.add_edge(pv, vg, Holder::User).unwrap();

        let lv0 = graph.add_device(lv("/dev/vg0/lv0", 1024 * 1024 * 1024, sysdefs::LvType::Normal));
        if let Device::LvmLv(l) = graph.find_by_sid_mut(lv0).unwrap() {
            l.stripes = 129;
        }
        graph.add_edge(vg, lv0, Holder::User).unwrap();

        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::InvalidLvmGeometry(sid, _) if *sid == lv0)));
    }

    #[test]
    fn check_detects_thin_lv_exceeding_pool_limit() {
        use crate::device::LvmVg;

        let mut graph = DeviceGraph::new();
        let pv = graph.add_device(disk("/dev/sda", 4 * 1024 * 1024 * 1024));
        let vg = graph.add_device(Device::LvmVg(LvmVg::new("vg0", 4 * 1024 * 1024)));
        graph.add_edge(pv, vg, Holder::User).unwrap();

        let pool = graph.add_device(lv("/dev/vg0/pool0", 1024 * 1024 * 1024, sysdefs::LvType::ThinPool));
        if let Device::LvmLv(p) = graph.find_by_sid_mut(pool).unwrap() {
            p.chunk_size = 64 * 1024;
        }
        graph.add_edge(vg, pool, Holder::User).unwrap();

        let thin = graph.add_device(lv(
            "/dev/vg0/thin0",
            (64 * 1024u64).saturating_mul(265_289_728) + 64 * 1024,
            sysdefs::LvType::Thin,
        ));
        graph.add_edge(vg, thin, Holder::User).unwrap();

        let errors = graph.check().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, GraphCheckError::Geometry(GeometryError::MaxSizeForLvmLvThin(sid)) if *sid == thin)));
    }
}
