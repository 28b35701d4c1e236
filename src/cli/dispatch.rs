use anyhow::Result;

use super::apps::cmd_apps;
use super::env::CliArgs;
use super::plan::cmd_plan;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Plan(args) => cmd_plan(args, ctx),
        Commands::Apps(args) => cmd_apps(args, ctx),
    }
}
