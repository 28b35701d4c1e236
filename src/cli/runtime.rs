use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use super::output::LogFormat;

/// Crates that are chatty at `info` and below.
const QUIET_DEPENDENCIES: &str = "chromiumoxide=warn,tungstenite=warn,hyper=warn";

pub struct LogOptions {
    pub level: String,
    pub debug: bool,
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
}

/// Loads `.env` from the working directory; variables already set win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("warning: ignoring unreadable .env: {err}"),
    }
}

/// `RUST_LOG` wins; otherwise `--log-level`, or `debug` under `--debug`.
pub fn env_filter(level: &str, debug: bool) -> Result<EnvFilter> {
    let level = if debug {
        Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},{QUIET_DEPENDENCIES}",
            level.to_string().to_lowercase()
        ))
    }))
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole process or buffered file output is lost.
pub fn init_logging(opts: &LogOptions) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&opts.level, opts.debug)?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    match opts.format {
        LogFormat::Human => layers.push(fmt::layer().with_target(true).boxed()),
        LogFormat::Json => layers.push(fmt::layer().json().with_current_span(false).boxed()),
    }

    let guard = match &opts.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("tracewalk")
                .filename_suffix("log")
                .build(dir)
                .context("Failed to open log file")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_levels() {
        assert!(env_filter("chatty", false).is_err());
    }

    #[test]
    fn debug_flag_skips_level_parsing() {
        assert!(env_filter("chatty", true).is_ok());
    }
}
