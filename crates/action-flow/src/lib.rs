//! Step Runner
//!
//! Drives a plan one step at a time: act, observe, maybe capture, record.
//! A step that fails to act or to be observed never stops the run; it
//! shows up in the trace instead.

pub mod errors;
pub mod runner;
pub mod types;

pub use errors::FlowError;
pub use runner::{complete_run, StepRunner};
pub use tracewalk_core_types::RunTrace;
pub use types::{RunSummary, RunnerConfig};
