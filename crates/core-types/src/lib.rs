//! Shared primitives for the tracewalk workspace.
//!
//! Plans, steps and element targets flow from the planner into the runner;
//! step records flow out of the runner into the trace writer. Every crate in
//! the workspace speaks these types.

pub mod errors;
mod lenient;
pub mod record;
pub mod step;
pub mod target;

pub use errors::PlanError;
pub use record::{ActionStatus, RunTrace, StepRecord};
pub use step::{ActionKind, Plan, Step, DEFAULT_WAIT_MS};
pub use target::TargetSpec;
