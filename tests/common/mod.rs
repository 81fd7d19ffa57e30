#![allow(dead_code, unused_imports)]

pub use infra_backend_test_utils::builders;
pub use infra_backend_test_utils::fake_backend;
pub use infra_backend_test_utils::state_store;
pub use infra_backend_test_utils::ui;
pub use infra_backend_test_utils::{init_tracing, with_timeout};
