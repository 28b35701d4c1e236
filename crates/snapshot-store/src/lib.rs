//! Screenshots and the run trace on disk.
//!
//! Layout under the output root:
//!
//! ```text
//! <out_root>/<app>/<task-slug>/step-01-<description-slug>.png
//! <out_root>/<app>/<task-slug>/metadata.json
//! ```

pub mod errors;
pub mod fs;
pub mod guard;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod trace;

pub use errors::{SnapErrKind, SnapError};
pub use fs::layout::{slugify, task_dir};
pub use guard::CaptureGuard;
pub use model::{CaptureMemory, Fingerprint};
pub use policy::CaptureConfig;
pub use trace::{JsonTraceWriter, TraceWriter};
