use clap::Subcommand;

use super::apps::AppsArgs;
use super::plan::PlanArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Execute a task against an app and record the trace
    Run(RunArgs),

    /// Print the heuristic plan for a task as JSON
    Plan(PlanArgs),

    /// List known app profiles
    Apps(AppsArgs),
}
