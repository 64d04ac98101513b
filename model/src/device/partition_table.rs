use serde::{Deserialize, Serialize};

/// Discriminates the on-disk partition table format. `Gpt::enlarge` tracks
/// whether a resized disk's secondary GPT header has been relocated to the
/// new last sector (an explicit `Action::Modify` in the planner, since
/// enlarging a GPT doesn't happen implicitly on disk resize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionTableKind {
    Gpt { enlarge: bool },
    Msdos,
    /// DASD (ECKD/FBA) tables on s390, always exactly one partition.
    DasdPt,
    /// Single-partition device with no real table (e.g. a whole-disk
    /// filesystem); synthesized so the rest of the model can still address
    /// "partition 1" uniformly.
    ImplicitPt,
}

impl PartitionTableKind {
    /// Highest number of primary slots the format allows, or `None` if
    /// unbounded (GPT is bounded too, but by the header's declared entry
    /// count rather than the format itself, so callers read that from the
    /// device instead).
    pub fn max_primary(&self) -> Option<u32> {
        match self {
            Self::Gpt { .. } => None,
            Self::Msdos => Some(4),
            Self::DasdPt | Self::ImplicitPt => Some(1),
        }
    }

    pub fn extended_supported(&self) -> bool {
        matches!(self, Self::Msdos)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gpt { .. } => "gpt",
            Self::Msdos => "msdos",
            Self::DasdPt => "dasd",
            Self::ImplicitPt => "implicit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    pub kind: PartitionTableKind,
    pub read_only: bool,
}

impl PartitionTable {
    pub fn new(kind: PartitionTableKind) -> Self {
        Self {
            kind,
            read_only: false,
        }
    }
}
