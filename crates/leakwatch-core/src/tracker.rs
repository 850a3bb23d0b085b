//! Leak tracker
//!
//! A [`LeakTracker`] maps listener identities to the registrations that have
//! not been undone yet. Registration appends an [`AllocationEvent`];
//! unregistration releases every event for that listener at once, matching
//! platform unregister calls that drop the listener as a whole.
//!
//! Records iterate in first-registration order so leak reports are
//! deterministic across runs.

use crate::config::{BacktraceMode, LeakConfig};
use crate::error::{LeakError, LeakResult};
use crate::event::AllocationEvent;
use crate::identity::ListenerIdentity;
use crate::report::{LeakReport, LeakedListener};
use indexmap::map::MutableKeys;
use indexmap::IndexMap;

/// Outstanding registrations for one listener
#[derive(Debug, Clone, Default)]
pub struct LeakRecord {
    events: Vec<AllocationEvent>,
}

impl LeakRecord {
    /// Outstanding events, oldest first
    pub fn events(&self) -> &[AllocationEvent] {
        &self.events
    }

    /// Number of outstanding events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are outstanding
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Tracks outstanding listener registrations for one category
#[derive(Debug)]
pub struct LeakTracker {
    category: String,
    backtrace: BacktraceMode,
    max_report_frames: Option<usize>,
    records: IndexMap<ListenerIdentity, LeakRecord>,
    next_sequence: u64,
}

impl LeakTracker {
    /// Create a tracker with the default configuration
    pub fn new(category: impl Into<String>) -> Self {
        Self::with_config(category, &LeakConfig::default())
    }

    /// Create a tracker with explicit configuration
    pub fn with_config(category: impl Into<String>, config: &LeakConfig) -> Self {
        Self {
            category: category.into(),
            backtrace: config.backtrace,
            max_report_frames: config.max_report_frames,
            records: IndexMap::new(),
            next_sequence: 0,
        }
    }

    /// Category this tracker covers (e.g. `receiver`)
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Record one registration of `identity` at the caller's location.
    ///
    /// If the listener was first registered through a borrowed identity and
    /// `identity` retains it, the retaining identity replaces the stored key.
    #[track_caller]
    pub fn add(&mut self, identity: ListenerIdentity) {
        let event = AllocationEvent::capture(self.next_sequence, self.backtrace);
        self.next_sequence += 1;

        if let Some((_, key, _)) = self.records.get_full_mut2(&identity) {
            if identity.is_retained() && !key.is_retained() {
                *key = identity.clone();
            }
        }
        let record = self.records.entry(identity).or_default();
        record.events.push(event);
        tracing::trace!(
            category = %self.category,
            outstanding = record.len(),
            "registration recorded"
        );
    }

    /// Release every registration of `identity`.
    ///
    /// Returns the number of events released. Unknown identities are a no-op.
    pub fn clear(&mut self, identity: &ListenerIdentity) -> usize {
        match self.records.shift_remove(identity) {
            Some(record) => {
                tracing::trace!(
                    category = %self.category,
                    listener = %identity,
                    released = record.len(),
                    "registrations cleared"
                );
                record.len()
            }
            None => {
                tracing::debug!(
                    category = %self.category,
                    listener = %identity,
                    "clear for untracked listener ignored"
                );
                0
            }
        }
    }

    /// Every outstanding event across all identities.
    ///
    /// The iterator borrows the tracker and can be recreated at will.
    pub fn outstanding(&self) -> impl Iterator<Item = (&ListenerIdentity, &AllocationEvent)> + '_ {
        self.records
            .iter()
            .flat_map(|(identity, record)| record.events.iter().map(move |event| (identity, event)))
    }

    /// Registrations recorded since creation, cleared or not
    pub fn registrations(&self) -> u64 {
        self.next_sequence
    }

    /// Total outstanding events
    pub fn outstanding_count(&self) -> usize {
        self.records.values().map(LeakRecord::len).sum()
    }

    /// Outstanding events for one identity
    pub fn outstanding_for(&self, identity: &ListenerIdentity) -> usize {
        self.records.get(identity).map_or(0, LeakRecord::len)
    }

    /// Record for one identity, if any registration is outstanding
    pub fn record(&self, identity: &ListenerIdentity) -> Option<&LeakRecord> {
        self.records.get(identity)
    }

    /// Whether `identity` has outstanding registrations
    pub fn is_tracked(&self, identity: &ListenerIdentity) -> bool {
        self.records.get(identity).is_some_and(|record| !record.is_empty())
    }

    /// Drop all records without reporting them
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Snapshot of every leaked listener
    pub fn report(&self) -> LeakReport {
        let leaks = self
            .records
            .iter()
            .filter(|(_, record)| !record.is_empty())
            .map(|(identity, record)| LeakedListener {
                category: self.category.clone(),
                identity: identity.clone(),
                events: record.events.clone(),
            })
            .collect();
        LeakReport::new(leaks, self.max_report_frames)
    }

    /// Fail with [`LeakError::LeakDetected`] if anything is outstanding
    pub fn verify(&self) -> LeakResult {
        let report = self.report();
        if report.is_clean() {
            return Ok(());
        }
        tracing::warn!(
            category = %self.category,
            leaked = report.leaked_listeners(),
            outstanding = report.outstanding_events(),
            "listener leak detected"
        );
        Err(LeakError::LeakDetected(report))
    }
}
