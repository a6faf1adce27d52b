//! Tracing setup for test binaries

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber that writes through the test harness's capture.
///
/// `RUST_LOG` wins over `default_filter`. Safe to call from every test; only
/// the first call in a process installs anything.
pub fn init_test_tracing_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// [`init_test_tracing_with`] using the default harness filter.
pub fn init_test_tracing() {
    init_test_tracing_with(&crate::HarnessConfig::default().log_filter);
}
