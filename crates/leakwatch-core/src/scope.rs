//! Per-test tracker registry
//!
//! A [`LeakScope`] is created at test setup, hands out one [`Tracker`] per
//! category on request, and verifies all of them at teardown.

use crate::config::LeakConfig;
use crate::error::{LeakError, LeakResult};
use crate::handle::{lock, shared, Shared, Tracker};
use crate::report::LeakReport;
use indexmap::IndexMap;

/// Category for broadcast receivers
pub const RECEIVER: &str = "receiver";
/// Category for bound service connections
pub const SERVICE: &str = "service";
/// Category for component callbacks
pub const COMPONENT: &str = "component";

/// Trackers for a single test case
#[derive(Debug)]
pub struct LeakScope {
    config: LeakConfig,
    trackers: Shared<IndexMap<String, Tracker>>,
    // Registrations per category at the last `verify_all`.
    verified_at: Option<IndexMap<String, u64>>,
}

impl Default for LeakScope {
    fn default() -> Self {
        Self::new()
    }
}

impl LeakScope {
    /// Scope with the default configuration
    pub fn new() -> Self {
        Self::with_config(LeakConfig::default())
    }

    /// Scope whose trackers use `config`
    pub fn with_config(config: LeakConfig) -> Self {
        Self {
            config,
            trackers: shared(IndexMap::new()),
            verified_at: None,
        }
    }

    /// Configuration applied to new trackers
    pub fn config(&self) -> &LeakConfig {
        &self.config
    }

    /// Tracker for `category`, created on first request
    pub fn tracker(&self, category: &str) -> Tracker {
        let mut trackers = lock(&self.trackers);
        if let Some(tracker) = trackers.get(category) {
            return tracker.clone();
        }
        tracing::debug!(category, "tracker created");
        let tracker = Tracker::with_config(category, &self.config);
        trackers.insert(category.to_string(), tracker.clone());
        tracker
    }

    /// Categories requested so far, in creation order
    pub fn categories(&self) -> Vec<String> {
        lock(&self.trackers).keys().cloned().collect()
    }

    /// Outstanding registrations across every category
    pub fn outstanding_count(&self) -> usize {
        let trackers: Vec<Tracker> = lock(&self.trackers).values().cloned().collect();
        trackers.iter().map(Tracker::outstanding_count).sum()
    }

    /// Combined report for every category
    pub fn report(&self) -> LeakReport {
        let trackers: Vec<Tracker> = lock(&self.trackers).values().cloned().collect();
        let mut combined = LeakReport::default();
        for tracker in &trackers {
            combined.merge(tracker.report());
        }
        combined
    }

    /// Verify every category, merging all leaks into one error.
    ///
    /// Registrations made after this call are still checked when the scope
    /// is dropped.
    pub fn verify_all(&mut self) -> LeakResult {
        let trackers: Vec<(String, Tracker)> = lock(&self.trackers)
            .iter()
            .map(|(category, tracker)| (category.clone(), tracker.clone()))
            .collect();
        self.verified_at = Some(
            trackers
                .iter()
                .map(|(category, tracker)| (category.clone(), tracker.registrations()))
                .collect(),
        );
        let report = self.report();
        if report.is_clean() {
            return Ok(());
        }
        tracing::warn!(
            leaked = report.leaked_listeners(),
            outstanding = report.outstanding_events(),
            "listener leaks detected at teardown"
        );
        Err(LeakError::LeakDetected(report))
    }
}

impl Drop for LeakScope {
    fn drop(&mut self) {
        let mut report = self.report();
        if let Some(verified_at) = &self.verified_at {
            report.retain_events(|category, event| {
                event.sequence() >= verified_at.get(category).copied().unwrap_or(0)
            });
        }
        if report.is_clean() {
            return;
        }
        if self.verified_at.is_some() {
            tracing::error!(
                leaked = report.leaked_listeners(),
                outstanding = report.outstanding_events(),
                "listeners registered after verification were never unregistered"
            );
        } else {
            tracing::error!(
                leaked = report.leaked_listeners(),
                outstanding = report.outstanding_events(),
                "leak scope dropped without verification"
            );
        }
        if self.config.verify_on_drop && !std::thread::panicking() {
            panic!("{report}");
        }
    }
}
