//! Trace persistence.

use std::path::PathBuf;

use tracewalk_core_types::RunTrace;
use tracing::info;

use crate::errors::SnapError;
use crate::fs::{layout, writer};

/// Persists a finished run.
pub trait TraceWriter: Send + Sync {
    fn write(&self, trace: &RunTrace) -> Result<PathBuf, SnapError>;
}

/// Pretty JSON `metadata.json` next to the run's screenshots.
#[derive(Debug, Clone)]
pub struct JsonTraceWriter {
    out_root: PathBuf,
}

impl JsonTraceWriter {
    pub fn new(out_root: impl Into<PathBuf>) -> Self {
        Self {
            out_root: out_root.into(),
        }
    }
}

impl TraceWriter for JsonTraceWriter {
    fn write(&self, trace: &RunTrace) -> Result<PathBuf, SnapError> {
        let path = layout::metadata_path(&self.out_root, &trace.app, &trace.task);
        let data = serde_json::to_vec_pretty(trace)?;
        let path = writer::write_atomic(&path, &data)?;
        info!(
            target: "snapshot-store",
            path = %path.display(),
            steps = trace.len(),
            "Saved run metadata"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;
    use tracewalk_core_types::{ActionKind, Step, StepRecord, TargetSpec};

    #[test]
    fn writes_metadata_beside_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let step = Step::new(ActionKind::Click, "Open filter")
            .with_selector(TargetSpec::RoleNamePattern {
                role: "button".into(),
                pattern: "filter|Filter".into(),
            });
        let mut trace = RunTrace::new("linear", "Filter issues");
        trace.push(StepRecord::observed(1, &step, Utc::now()));
        trace.push(StepRecord::degraded(2, &step, "page unavailable"));

        let path = JsonTraceWriter::new(dir.path()).write(&trace).unwrap();
        assert_eq!(path, dir.path().join("linear/filter-issues/metadata.json"));

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["app"], "linear");
        assert_eq!(value["task"], "Filter issues");
        assert_eq!(value["steps"].as_array().unwrap().len(), 2);
        assert_eq!(value["steps"][0]["selector"]["name_regex"], "filter|Filter");
        assert_eq!(value["steps"][1]["error"], "page unavailable");
    }
}
