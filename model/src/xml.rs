//! Serialization of a `DeviceGraph` to and from the on-disk XML format used
//! to persist a probed or staging graph between runs. The shape mirrors how
//! `harpoon`'s Omaha client frames a request: a `quick_xml::Writer` for an
//! explicit XML declaration plus `write_serializable`, and
//! `quick_xml::de::Deserializer` paired with `serde_path_to_error` so a
//! malformed file names the offending element instead of failing blind.

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::Node;
use crate::graph::DeviceGraph;
use crate::holder::Holder;
use crate::sid::Sid;

const XML_HEADER_VERSION: &str = "1.0";
const XML_HEADER_ENCODING: &str = "UTF-8";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("failed to serialize device graph: {0}")]
    Serialize(#[from] quick_xml::SeError),

    #[error("failed to serialize device graph: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse device graph: {0}")]
    Parse(String),
}

#[derive(Serialize, Deserialize)]
struct XmlEdge {
    parent: Sid,
    child: Sid,
    holder: Holder,
}

#[derive(Serialize, Deserialize)]
struct XmlGraph {
    node: Vec<Node>,
    edge: Vec<XmlEdge>,
}

impl DeviceGraph {
    pub fn to_xml(&self) -> Result<Vec<u8>, XmlError> {
        let doc = XmlGraph {
            node: self.nodes().cloned().collect(),
            edge: self.edge_list(),
        };

        let mut data = Vec::new();
        let mut writer = Writer::new(&mut data);
        writer.write_event(Event::Decl(BytesDecl::new(
            XML_HEADER_VERSION,
            Some(XML_HEADER_ENCODING),
            None,
        )))?;
        writer.write_serializable("devicegraph", &doc)?;
        Ok(data)
    }

    pub fn from_xml(text: &str) -> Result<DeviceGraph, XmlError> {
        let mut xmld = quick_xml::de::Deserializer::from_str(text);
        let doc: XmlGraph =
            serde_path_to_error::deserialize(&mut xmld).map_err(|e| XmlError::Parse(e.to_string()))?;

        let mut graph = DeviceGraph::new();
        for node in doc.node {
            let sid = node.sid;
            graph.insert_node(node);
            graph.seed_allocator_past(sid);
        }
        for edge in doc.edge {
            graph
                .add_edge(edge.parent, edge.child, edge.holder)
                .map_err(|e| XmlError::Parse(e.to_string()))?;
        }
        Ok(graph)
    }

    fn edge_list(&self) -> Vec<XmlEdge> {
        self.edges()
            .into_iter()
            .map(|(parent, child, holder)| XmlEdge { parent, child, holder })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BlkDeviceAttrs, Device, Disk};
    use crate::region::Region;

    #[test]
    fn xml_round_trip_preserves_nodes_and_edges() {
        let mut graph = DeviceGraph::new();
        let disk_sid = graph.add_device(Device::Disk(Disk::new(BlkDeviceAttrs::new(
            "/dev/sda",
            Region::new(0, 2048, 512),
        ))));
        let fs_sid = graph.add_device(Device::Filesystem(crate::device::Filesystem::new(
            sysdefs::FilesystemType::Ext4,
        )));
        graph.add_edge(disk_sid, fs_sid, Holder::Subdevice).unwrap();

        let xml = graph.to_xml().unwrap();
        let text = String::from_utf8(xml).unwrap();
        let restored = DeviceGraph::from_xml(&text).unwrap();

        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.children(disk_sid).unwrap(), vec![fs_sid]);
    }

    #[test]
    fn loaded_graph_allocates_sids_past_the_highest_one_on_disk() {
        let mut graph = DeviceGraph::new();
        graph.add_device(Device::Disk(Disk::new(BlkDeviceAttrs::new("/dev/sda", Region::new(0, 2048, 512)))));
        let xml = graph.to_xml().unwrap();

        let mut restored = DeviceGraph::from_xml(&String::from_utf8(xml).unwrap()).unwrap();
        let new_sid = restored.add_device(Device::Disk(Disk::new(BlkDeviceAttrs::new(
            "/dev/sdb",
            Region::new(0, 2048, 512),
        ))));

        assert_eq!(restored.node_count(), 2);
        assert!(restored.find_by_sid(new_sid).is_some());
        assert!(restored.all_sids().iter().all(|&s| s.0 > 0));
        assert_eq!(restored.all_sids().len(), restored.all_sids().iter().collect::<std::collections::HashSet<_>>().len());
    }
}
