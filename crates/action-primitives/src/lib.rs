//! Step execution for tracewalk runs
//!
//! This crate turns one planned [`Step`](tracewalk_core_types::Step) into
//! browser input:
//! - goto, click, hover, type, press, wait_for and scroll primitives
//! - every browser call bounded by a soft timeout from [`ExecutorConfig`]
//! - a single non-verifying retry for clicks that changed nothing
//! - failures reported in the [`ActionReport`], never raised

pub mod errors;
mod primitives;
pub mod types;
mod waiting;

pub use errors::*;
pub use primitives::*;
pub use types::*;
pub use waiting::*;
