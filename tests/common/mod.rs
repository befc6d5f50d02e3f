//! Shared helpers for integration tests.

/// Result alias keeping test signatures short.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Install a subscriber printing events for failing-test diagnosis.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
