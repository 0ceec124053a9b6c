//! Shared logging setup for unit and integration tests.

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Install a test-captured tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `orgchart=trace` so builder and store
/// events show up when a test fails.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        Err(_) => EnvFilter::new("orgchart=trace"),
    };

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_calls_when_init_test_setup_then_installs_once() {
        init_test_setup();
        init_test_setup();
        assert!(TEST_SETUP.is_completed());
    }
}
