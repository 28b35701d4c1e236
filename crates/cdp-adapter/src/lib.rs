//! Chromium DevTools Protocol adapter.
//!
//! Owns the browser process (or an attached websocket), keeps a registry of
//! page targets fed by the protocol event stream, and exposes the page-level
//! operations the runner needs through the [`Cdp`] trait.

pub mod adapter;
pub mod commands;
pub mod config;
pub mod error;
pub mod ids;
pub mod keys;
pub mod metrics;
pub mod network;
pub mod registry;
pub mod transport;

mod launch;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use adapter::{Cdp, CdpAdapter};
pub use commands::{js_string, ElementQuery, ElementState, WaitGate};
pub use config::{detect_chrome_executable, CdpConfig, Viewport};
pub use error::{AdapterError, AdapterErrorKind};
pub use ids::{PageId, SessionId};
pub use launch::chrome_args;
pub use metrics::AdapterMetricsSnapshot;
pub use transport::{CdpTransport, ChromiumTransport, CommandTarget, NoopTransport, TransportEvent};
