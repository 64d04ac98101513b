//! The devicegraph: a typed, SID-addressed DAG describing a machine's
//! block-device stack (disks through mount points), independent of how it
//! was discovered or how it will be applied. `storplan` (the planner crate)
//! consumes two of these — a probed graph and a staging graph — and
//! produces the ordered actions that turn one into the other.

pub mod device;
pub mod error;
pub mod graph;
pub mod holder;
pub mod region;
pub mod sid;
pub mod topology;
pub mod xml;

pub use device::{Device, Node};
pub use error::{GeometryError, GraphCheckError, LookupError, ValidationError};
pub use graph::DeviceGraph;
pub use holder::Holder;
pub use region::Region;
pub use sid::{Sid, SidAllocator};
pub use topology::{AlignError, AlignPolicy, Topology};
