//! Leakwatch Testing Infrastructure
//!
//! Test-side pieces built on `leakwatch-core`: a context decorator that
//! records listener registrations, assertion macros, and logging setup.
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! leakwatch-testkit = { path = "../leakwatch-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,ignore
//! use leakwatch_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     let mut scope = LeakScope::new();
//!     let context = TrackingContext::from_scope(MyHost::default(), &scope);
//!     // ... test logic
//!     assert_no_leaks!(scope);
//! }
//! ```

pub mod assertions;
pub mod context;
pub mod logging;

pub use assertions::Verify;
pub use context::{HostContext, ListenerKind, TrackingContext};
pub use logging::init_test_logging;

// Re-export commonly used core types for convenience
pub use leakwatch_core::{
    BacktraceMode, LeakConfig, LeakError, LeakReport, LeakScope, ListenerIdentity, Tracker,
};
