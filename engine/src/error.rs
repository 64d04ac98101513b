//! Planning- and execution-level errors: what can go wrong building an
//! `ActionGraph` or committing it, as distinct from the structural/lookup
//! errors the devicegraph crate already raises on its own.

use thiserror::Error;

use devgraph::Sid;

pub use crate::actiongraph::PlanningCycle;

/// Raised while diffing two devicegraphs into an `ActionGraph`, before any
/// action has executed.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error(transparent)]
    Cycle(#[from] PlanningCycle),

    #[error("cannot create {} in its target state: {1}", pretty_sid(.0))]
    CannotCreateDevice(Sid, String),

    #[error("cannot delete {}: {1}", pretty_sid(.0))]
    CannotDeleteDevice(Sid, String),

    #[error("Md array {} geometry does not match its current members: {1}", pretty_sid(.0))]
    InconsistentGeometry(Sid, String),
}

fn pretty_sid(sid: &Sid) -> String {
    format!("sid {sid}")
}

/// Raised by `SystemExecutor` when committing a single action fails.
/// Carries the action's target SID and the underlying cause so a caller can
/// report exactly where a transition stopped.
#[derive(Debug, Error)]
#[error("execution of action on {} failed: {cause}", pretty_sid(.target))]
pub struct ExecutionException {
    pub target: Sid,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl ExecutionException {
    pub fn new(target: Sid, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self { target, cause: Box::new(cause) }
    }
}
