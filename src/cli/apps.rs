use anyhow::Result;
use clap::Args;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct AppsArgs {
    /// Print profiles as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_apps(args: AppsArgs, ctx: &CliContext) -> Result<()> {
    let profiles: Vec<_> = ctx.apps().iter().collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }
    for profile in profiles {
        match &profile.login_url {
            Some(login) => println!("{:<10} {}  (login: {})", profile.name, profile.start_url(), login),
            None => println!("{:<10} {}", profile.name, profile.start_url()),
        }
    }
    Ok(())
}
