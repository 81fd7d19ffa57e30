//! Fakes and helpers shared by the `infra-backend` integration tests.

pub mod builders;
pub mod fake_backend;
pub mod state_store;
pub mod ui;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use infra_backend::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single await in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests unless run with `-- --nocapture`. The filter comes from
/// `INFRA_BACKEND_LOG`, then `RUST_LOG`, then defaults to `info`:
/// `INFRA_BACKEND_LOG=infra_backend=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("test step timed out")
}
