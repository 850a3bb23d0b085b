//! Assertion helpers for leak checks
//!
//! High-level macros that turn tracker state into test failures with the
//! captured registration stacks in the panic message.

/// Assert that a [`LeakScope`](leakwatch_core::LeakScope) or
/// [`Tracker`](leakwatch_core::Tracker) has no outstanding registrations
#[macro_export]
macro_rules! assert_no_leaks {
    ($tracked:expr) => {
        if let Err(err) = $crate::Verify::verify_leaks(&mut $tracked) {
            panic!("{}", err);
        }
    };
}

/// Assert the number of outstanding registrations for one listener
#[macro_export]
macro_rules! assert_outstanding {
    ($tracker:expr, $listener:expr, $expected:expr) => {
        assert_eq!(
            $tracker.outstanding_for(&$crate::ListenerIdentity::of_arc(&$listener)),
            $expected,
            "Expected {} outstanding registration(s) for {}",
            $expected,
            $crate::ListenerIdentity::of_arc(&$listener)
        )
    };
}

/// Anything that can be verified at teardown
pub trait Verify {
    /// Run the leak check
    fn verify_leaks(&mut self) -> leakwatch_core::LeakResult;
}

impl Verify for leakwatch_core::LeakScope {
    fn verify_leaks(&mut self) -> leakwatch_core::LeakResult {
        self.verify_all()
    }
}

impl Verify for leakwatch_core::Tracker {
    fn verify_leaks(&mut self) -> leakwatch_core::LeakResult {
        self.verify()
    }
}

impl Verify for leakwatch_core::LeakTracker {
    fn verify_leaks(&mut self) -> leakwatch_core::LeakResult {
        self.verify()
    }
}
