//! The planning engine: diffs two devicegraphs into an ordered `ActionGraph`
//! and exposes the trait boundaries (`SystemInspector`, `SystemExecutor`)
//! a caller wires up to actually commit it.

pub mod actiongraph;
pub mod error;
pub mod executor;
pub mod fstab;
pub mod inspector;
pub mod partition_table;
pub mod resize;

pub use actiongraph::{Action, ActionGraph, ActionKind, PlanningCycle};
pub use error::{ExecutionException, PlanningError};
pub use executor::{LoggingExecutor, SystemExecutor};
pub use inspector::{SystemInspector, XmlInspector};
