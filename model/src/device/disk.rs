use serde::{Deserialize, Serialize};
use sysdefs::Transport;

use super::attrs::{BlkDeviceAttrs, PartitionableAttrs};

/// A raw block device as reported by the kernel: a whole disk, a multipath
/// map, or any other device that is not itself carved out of another one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub blk: BlkDeviceAttrs,
    pub partitionable: PartitionableAttrs,
    pub rotational: bool,
    pub transport: Transport,
}

impl Disk {
    pub fn new(blk: BlkDeviceAttrs) -> Self {
        Self {
            blk,
            partitionable: PartitionableAttrs::default(),
            rotational: false,
            transport: Transport::Unknown,
        }
    }
}

/// Filters a disk's full `udev_paths` listing down to the stable subset this
/// model keeps, in kernel-reported order. Paths not rooted at one of the
/// known stable prefixes (scsi controller, PCI slot, or DASD channel) are
/// unusable as a persistent identifier and dropped.
pub fn process_udev_paths(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter(|p| {
            p.starts_with("pci-") || p.starts_with("scsi-") || p.starts_with("ccw-")
        })
        .cloned()
        .collect()
}

/// Filters a disk's full `udev_ids` listing down to the stable subset,
/// preferring `ata-` entries first since multiple ids can alias the same
/// device and udev itself orders them arbitrarily.
pub fn process_udev_ids(ids: &[String]) -> Vec<String> {
    let mut stable: Vec<String> = ids
        .iter()
        .filter(|i| {
            i.starts_with("ata-")
                || i.starts_with("scsi-")
                || i.starts_with("usb-")
                || i.starts_with("wwn-")
                || i.starts_with("nvme-")
        })
        .cloned()
        .collect();
    stable.sort_by_key(|id| if id.starts_with("ata-") { 0 } else { 1 });
    stable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_stable_path_prefixes() {
        let paths = vec![
            "pci-0000:00:1f.2-ata-1".to_string(),
            "platform-something".to_string(),
            "scsi-0:0:0:0".to_string(),
        ];
        assert_eq!(
            process_udev_paths(&paths),
            vec!["pci-0000:00:1f.2-ata-1".to_string(), "scsi-0:0:0:0".to_string()]
        );
    }

    #[test]
    fn orders_ata_ids_first() {
        let ids = vec![
            "wwn-0x5000c5-deadbeef".to_string(),
            "ata-WDC_WD10-serial".to_string(),
        ];
        assert_eq!(
            process_udev_ids(&ids),
            vec!["ata-WDC_WD10-serial".to_string(), "wwn-0x5000c5-deadbeef".to_string()]
        );
    }
}
