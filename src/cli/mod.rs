pub mod app;
pub mod apps;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod plan;
pub mod run;
pub mod runtime;

pub use env::CliArgs;
pub use run::{execute_run, RunArgs, RunOutcome};
