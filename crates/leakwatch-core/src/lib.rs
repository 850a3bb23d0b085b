//! Leakwatch Core
//!
//! Bookkeeping for listener registrations made during a test. Each
//! registration of a receiver, service connection or callback is recorded
//! with the call stack that made it; unregistration clears the listener's
//! records. At teardown any listener with outstanding records fails the test
//! with the captured stacks.
//!
//! # Usage
//!
//! ```rust
//! use leakwatch_core::{LeakScope, ListenerIdentity, RECEIVER};
//! use std::sync::Arc;
//!
//! let mut scope = LeakScope::new();
//! let receivers = scope.tracker(RECEIVER);
//!
//! let receiver = Arc::new("battery-receiver");
//! receivers.add(ListenerIdentity::of_arc(&receiver));
//! receivers.clear(&ListenerIdentity::of_arc(&receiver));
//!
//! scope.verify_all().unwrap();
//! ```
//!
//! Trackers are single-threaded by default. Enable the `sync` feature when
//! listeners are registered from other threads.

pub mod config;
pub mod error;
pub mod event;
pub mod handle;
pub mod identity;
pub mod report;
pub mod scope;
pub mod tracker;

pub use config::{BacktraceMode, LeakConfig};
pub use error::{ConfigError, LeakError, LeakResult};
pub use event::AllocationEvent;
pub use handle::{Tracker, TrackerGuard};
pub use identity::ListenerIdentity;
pub use report::{LeakReport, LeakedListener};
pub use scope::{LeakScope, COMPONENT, RECEIVER, SERVICE};
pub use tracker::{LeakRecord, LeakTracker};
