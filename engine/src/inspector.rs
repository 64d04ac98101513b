//! The read side of the external-system boundary: `SystemInspector` answers
//! the questions `DeviceGraph::find_by_any_name` and the resize/partition
//! analysers need to ask about the live system (sysfs fallback lookups,
//! mount state) without the rest of the engine depending on how that
//! information was actually gathered.

use std::fs;
use std::io;
use std::path::Path;

use devgraph::{Device, DeviceGraph};

/// Live-system facts the planner consults that a devicegraph snapshot alone
/// doesn't carry: whether a path is presently mounted, and the sysfs name
/// fallback used by `find_by_any_name` when a device was renamed since it
/// was probed.
pub trait SystemInspector {
    fn is_mounted(&self, path: &str) -> bool;
    fn sysfs_name_for(&self, device_name: &str) -> Option<String>;
    /// Re-reads the full probed devicegraph, e.g. after udev settles
    /// post-action. Real probing (lsblk/udev/parted/lvs/mdstat) is out of
    /// scope; this returns whatever was last handed to the inspector.
    fn probe(&self) -> DeviceGraph;
}

/// Demonstration inspector standing in for live probing: loads a probed
/// devicegraph from an XML file once and answers every query against that
/// frozen snapshot.
pub struct XmlInspector {
    graph: DeviceGraph,
    mounted_paths: Vec<String>,
}

impl XmlInspector {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let graph = DeviceGraph::from_xml(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mounted_paths = graph
            .get_devices_of_type("MountPoint")
            .into_iter()
            .filter_map(|sid| match graph.find_by_sid(sid) {
                Some(Device::MountPoint(mp)) => Some(mp.path.clone()),
                _ => None,
            })
            .collect();
        Ok(Self { graph, mounted_paths })
    }
}

impl SystemInspector for XmlInspector {
    fn is_mounted(&self, path: &str) -> bool {
        self.mounted_paths.iter().any(|p| p == path)
    }

    fn sysfs_name_for(&self, device_name: &str) -> Option<String> {
        let sid = self.graph.find_by_name(device_name)?;
        self.graph
            .find_by_sid(sid)
            .and_then(|d| d.as_blk_device())
            .map(|b| b.sysfs_name.clone())
            .filter(|s| !s.is_empty())
    }

    fn probe(&self) -> DeviceGraph {
        self.graph.copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgraph::device::{BlkDeviceAttrs, Device as D, Disk};
    use devgraph::region::Region;

    #[test]
    fn xml_inspector_round_trips_through_a_file() {
        let mut graph = DeviceGraph::new();
        graph.add_device(D::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 100, 512)))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probed.xml");
        fs::write(&path, graph.to_xml().unwrap()).unwrap();

        let inspector = XmlInspector::load(&path).unwrap();
        assert_eq!(inspector.probe().node_count(), 1);
        assert!(!inspector.is_mounted("/"));
    }
}
