use std::sync::Once;

use tracing_subscriber::EnvFilter;

fn env_filter(default_filter: &str) -> crate::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| crate::Error::LogInitFailed(e.to_string()))
}

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init(default_filter: &str) -> crate::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter)?)
        .with_target(false)
        .try_init()
        .map_err(|e| crate::Error::LogInitFailed(e.to_string()))
}

/// Like [`init`], but writes through the test harness and ignores later calls.
pub fn init_for_tests(default_filter: &str) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        if let Ok(filter) = env_filter(default_filter) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        }
    });
}
