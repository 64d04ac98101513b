use std::fmt::Display;

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// A filesystem or volume identifier as it shows up on a running system:
/// a proper UUID, or some other string blkid/lvm reports that doesn't parse
/// as one (btrfs and LVM both hand out identifiers that aren't RFC 4122
/// UUIDs).
///
/// Devicegraph nodes (`Filesystem::uuid`, `LvmLv::uuid`, `LvmVg::uuid`,
/// `Bcache::uuid`) carry one of these, and `/etc/fstab` device specs and
/// udev `by-uuid` aliases are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsUuid {
    Uuid(Uuid),
    Relaxed(String),
}

impl OsUuid {
    /// The `/etc/fstab` device-spec spelling, e.g. `UUID=1234-5678`.
    pub fn fstab_spec(&self) -> String {
        format!("UUID={self}")
    }

    /// The udev `by-uuid` symlink path this identifier resolves to.
    pub fn by_uuid_alias(&self) -> String {
        format!("/dev/disk/by-uuid/{self}")
    }

    /// Whether `spec` (an `/etc/fstab` device column, or a bare path under
    /// `/dev/disk/by-uuid/`) names this identifier.
    pub fn matches_spec(&self, spec: &str) -> bool {
        let candidate = spec.strip_prefix("UUID=").or_else(|| spec.strip_prefix("/dev/disk/by-uuid/")).unwrap_or(spec);
        candidate == self.to_string()
    }
}

impl From<&str> for OsUuid {
    fn from(value: &str) -> Self {
        match Uuid::parse_str(value) {
            Ok(uuid) => Self::Uuid(uuid),
            Err(_) => Self::Relaxed(value.to_string()),
        }
    }
}

impl From<String> for OsUuid {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl From<Uuid> for OsUuid {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl Display for OsUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsUuid::Uuid(uuid) => write!(f, "{}", uuid.hyphenated()),
            OsUuid::Relaxed(s) => write!(f, "{s}"),
        }
    }
}

impl<'de> Deserialize<'de> for OsUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(String::deserialize(deserializer)?.as_str().into())
    }
}

impl Serialize for OsUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}
