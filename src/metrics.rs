//! Prometheus text export of the browser-adapter collectors.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};

/// Registry holding every collector the run feeds.
pub fn run_registry() -> Registry {
    let registry = Registry::new();
    cdp_adapter::metrics::register_metrics(&registry);
    registry
}

pub fn render(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .context("failed to encode prometheus metrics")?;
    String::from_utf8(buffer).context("prometheus output is not UTF-8")
}

/// Writes the exposition text to `path`, node-exporter textfile style.
pub fn write_textfile(path: &Path) -> Result<()> {
    let body = render(&run_registry())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("Failed to write metrics to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_commands_show_up_in_the_export() {
        cdp_adapter::metrics::record_command("Page.navigate");
        let text = render(&run_registry()).unwrap();
        assert!(text.contains("tracewalk_cdp_commands_total{method=\"Page.navigate\"}"));
        assert!(text.contains("# TYPE tracewalk_cdp_commands_total counter"));
    }

    #[test]
    fn textfile_lands_in_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics/run.prom");
        cdp_adapter::metrics::record_screenshot();
        write_textfile(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("tracewalk_cdp_screenshots_total"));
    }
}
