use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_dotenv, LogOptions};
use crate::config::load_config;

pub async fn run() -> Result<()> {
    load_dotenv();
    let cli = CliArgs::parse();

    let _log_guard = init_logging(&LogOptions {
        level: cli.log_level.clone(),
        debug: cli.debug,
        format: cli.log_format,
        dir: cli.log_dir.clone(),
    })?;

    info!(
        "Starting tracewalk v{} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("TRACEWALK_GIT_HASH"),
        env!("TRACEWALK_BUILD_DATE")
    );

    let loaded = load_config(cli.config.as_deref())?;
    let mut config = loaded.config;
    config.apply_process_env()?;
    let ctx = CliContext::new(config, loaded.path);

    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
