use anyhow::Result;
use clap::Args;

use super::context::CliContext;
use crate::planner::{HeuristicPlanner, Planner};

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    /// App profile name
    #[arg(long)]
    pub app: String,

    /// Natural-language task
    #[arg(long)]
    pub task: String,
}

pub fn cmd_plan(args: PlanArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app(&args.app)?;
    let plan = HeuristicPlanner.plan(app, &args.task)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
