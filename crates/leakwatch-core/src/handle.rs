//! Shared tracker handle
//!
//! The delegation layer and the test harness hold the same tracker. Without
//! the `sync` feature the handle is `Rc<RefCell<_>>` and stays on the test
//! thread; with it the handle is `Arc<Mutex<_>>` and may be sent to
//! background threads that register listeners.

use crate::config::LeakConfig;
use crate::error::LeakResult;
use crate::identity::ListenerIdentity;
use crate::report::LeakReport;
use crate::tracker::LeakTracker;

#[cfg(not(feature = "sync"))]
pub(crate) type Shared<T> = std::rc::Rc<std::cell::RefCell<T>>;
#[cfg(feature = "sync")]
pub(crate) type Shared<T> = std::sync::Arc<parking_lot::Mutex<T>>;

/// Exclusive access to a shared value
#[cfg(not(feature = "sync"))]
pub type SharedGuard<'a, T> = std::cell::RefMut<'a, T>;
/// Exclusive access to a shared value
#[cfg(feature = "sync")]
pub type SharedGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

/// Exclusive access to a tracker behind a [`Tracker`] handle
pub type TrackerGuard<'a> = SharedGuard<'a, LeakTracker>;

pub(crate) fn shared<T>(value: T) -> Shared<T> {
    #[cfg(not(feature = "sync"))]
    {
        std::rc::Rc::new(std::cell::RefCell::new(value))
    }
    #[cfg(feature = "sync")]
    {
        std::sync::Arc::new(parking_lot::Mutex::new(value))
    }
}

pub(crate) fn lock<T>(shared: &Shared<T>) -> SharedGuard<'_, T> {
    #[cfg(not(feature = "sync"))]
    {
        shared.borrow_mut()
    }
    #[cfg(feature = "sync")]
    {
        shared.lock()
    }
}

/// Cloneable handle to one category's [`LeakTracker`]
#[derive(Debug, Clone)]
pub struct Tracker {
    inner: Shared<LeakTracker>,
}

impl Tracker {
    /// Handle to a new tracker with default configuration
    pub fn new(category: impl Into<String>) -> Self {
        Self::from_tracker(LeakTracker::new(category))
    }

    /// Handle to a new tracker with explicit configuration
    pub fn with_config(category: impl Into<String>, config: &LeakConfig) -> Self {
        Self::from_tracker(LeakTracker::with_config(category, config))
    }

    /// Wrap an existing tracker
    pub fn from_tracker(tracker: LeakTracker) -> Self {
        Self {
            inner: shared(tracker),
        }
    }

    /// Lock the tracker for direct access.
    ///
    /// The guard must be released before the next call through any handle to
    /// the same tracker.
    pub fn lock(&self) -> TrackerGuard<'_> {
        lock(&self.inner)
    }

    /// Category of the underlying tracker
    pub fn category(&self) -> String {
        self.lock().category().to_string()
    }

    /// See [`LeakTracker::add`]
    #[track_caller]
    pub fn add(&self, identity: ListenerIdentity) {
        self.lock().add(identity);
    }

    /// See [`LeakTracker::clear`]
    pub fn clear(&self, identity: &ListenerIdentity) -> usize {
        self.lock().clear(identity)
    }

    /// See [`LeakTracker::registrations`]
    pub fn registrations(&self) -> u64 {
        self.lock().registrations()
    }

    /// See [`LeakTracker::outstanding_count`]
    pub fn outstanding_count(&self) -> usize {
        self.lock().outstanding_count()
    }

    /// See [`LeakTracker::outstanding_for`]
    pub fn outstanding_for(&self, identity: &ListenerIdentity) -> usize {
        self.lock().outstanding_for(identity)
    }

    /// See [`LeakTracker::report`]
    pub fn report(&self) -> LeakReport {
        self.lock().report()
    }

    /// See [`LeakTracker::verify`]
    pub fn verify(&self) -> LeakResult {
        self.lock().verify()
    }

    /// Whether two handles share a tracker
    pub fn ptr_eq(&self, other: &Self) -> bool {
        #[cfg(not(feature = "sync"))]
        {
            std::rc::Rc::ptr_eq(&self.inner, &other.inner)
        }
        #[cfg(feature = "sync")]
        {
            std::sync::Arc::ptr_eq(&self.inner, &other.inner)
        }
    }
}
