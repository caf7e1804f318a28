//! Disposable DynamoDB instances for integration tests.
//!
//! The harness either starts DynamoDB Local in a container (Docker or Podman)
//! on a free port, or reuses an instance provided by the environment, then
//! runs a caller-supplied setup and [`Suite`] against it. See
//! [`TestHarness`] for the full sequence and [`HarnessConfig::from_lookup`]
//! for the environment variables it reads.

pub mod client;
pub mod config;
pub mod container;
mod error;
mod harness;
pub mod port;
mod suite;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use client::{create_client, fake_credentials, wait_until_ready};
pub use config::{integration_enabled, ClientSettings, HarnessConfig, InstanceMode};
pub use error::{HarnessError, Result};
pub use harness::{Instance, TestHarness};
pub use suite::{Suite, SuiteReport, TestContext};

/// Installs a tracing subscriber for test binaries.
///
/// Honors `RUST_LOG`; defaults to `dynakit_harness=info`. Calling it more than
/// once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynakit_harness=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
