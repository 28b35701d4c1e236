//! Page state detection between steps.
//!
//! After each action the detector lets the page settle, probes for modal
//! and overlay surfaces and fingerprints the markup so the runner can tell
//! whether anything worth capturing happened.

pub mod api;
pub mod detector;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod signature;

pub use api::PageObserver;
pub use detector::{StateDetector, MODAL_SELECTOR, OVERLAY_SELECTOR};
pub use errors::DetectError;
pub use model::PageState;
pub use policy::DetectorConfig;
pub use signature::content_signature;
