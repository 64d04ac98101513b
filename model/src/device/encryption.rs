use serde::{Deserialize, Serialize};
use sysdefs::{EncryptionType, MountByType};

use super::attrs::BlkDeviceAttrs;

/// A dm-crypt mapping over some underlying block device: `LUKS1`/`LUKS2`
/// managed volumes, or a `Plain` mapping with no on-disk header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encryption {
    pub blk: BlkDeviceAttrs,
    pub encryption_type: EncryptionType,
    pub password: Option<String>,
    pub key_file: Option<String>,
    pub mount_by: Option<MountByType>,
    pub crypt_options: Vec<String>,
    pub in_etc_crypttab: bool,
}

impl Encryption {
    pub fn new(blk: BlkDeviceAttrs, encryption_type: EncryptionType) -> Self {
        Self {
            blk,
            encryption_type,
            password: None,
            key_file: None,
            mount_by: None,
            crypt_options: Vec::new(),
            in_etc_crypttab: true,
        }
    }
}
