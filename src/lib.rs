//! tracewalk
//!
//! Walks a planned UI task through a real browser, one step at a time, and
//! leaves behind a screenshot per meaningful page state plus a JSON trace.
//! Exposes modules for integration testing.

pub mod apps;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod planner;
pub mod session;

pub use apps::{AppProfile, AppRegistry};
pub use config::Config;
pub use planner::{FilePlanner, HeuristicPlanner, Planner};
