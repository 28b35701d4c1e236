//! Element location for plan steps.
//!
//! A [`TargetSpec`](tracewalk_core_types::TargetSpec) names an element the way
//! a planner thinks about it: a CSS selector, an ARIA role with a name, some
//! visible text. The resolver turns it into an
//! [`ElementQuery`](cdp_adapter::ElementQuery), a script that lists the
//! matching elements afresh every time the adapter evaluates it.
//!
//! - one strategy per target tag, tried in a fixed precedence
//! - zero matches is an answer, not an error
//! - callers act on the first match

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
