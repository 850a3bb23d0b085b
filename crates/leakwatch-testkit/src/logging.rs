//! Test logging setup

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_TEST_FILTER: &str = "leakwatch_core=debug,leakwatch_testkit=debug";

/// Install a test-friendly `tracing` subscriber.
///
/// Output goes through the test harness's captured writer. Safe to call from
/// every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
