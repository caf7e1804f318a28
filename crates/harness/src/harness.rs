//! Integration test entry point.
//!
//! [`TestHarness::run`] is meant to be the whole body of a `harness = false`
//! test target:
//!
//! ```no_run
//! use std::process::ExitCode;
//!
//! use dynakit_harness::{init_tracing, HarnessConfig, Suite, TestHarness};
//!
//! #[tokio::main]
//! async fn main() -> ExitCode {
//!     init_tracing();
//!
//!     let config = match HarnessConfig::from_env() {
//!         Ok(config) => config,
//!         Err(err) => {
//!             eprintln!("{err}");
//!             return ExitCode::FAILURE;
//!         }
//!     };
//!
//!     let suite = Suite::new().test("lists_tables", |ctx| async move {
//!         ctx.client().await?.list_tables().send().await?;
//!         Ok(())
//!     });
//!
//!     TestHarness::new(config)
//!         .with_table("test-table")
//!         .run(suite, |_client| async { Ok(()) })
//!         .await
//! }
//! ```

use std::future::Future;
use std::process::ExitCode;

use aws_sdk_dynamodb::Client;

use crate::client::{create_client, wait_until_ready};
use crate::config::{HarnessConfig, InstanceMode};
use crate::container::{detect_runtime, start_container, ContainerGuard, ContainerSpec};
use crate::error::{HarnessError, Result};
use crate::port::acquire_free_port;
use crate::suite::{Suite, SuiteReport, TestContext};

/// A DynamoDB instance the run can talk to.
#[derive(Debug)]
pub struct Instance {
    endpoint: String,
    name: String,
    container: Option<ContainerGuard>,
}

impl Instance {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True when this run started the instance and will remove it.
    pub fn is_managed(&self) -> bool {
        self.container.is_some()
    }

    /// Releases the instance. External instances are left untouched.
    pub async fn shutdown(self) {
        if let Some(container) = self.container {
            container.terminate().await;
        }
    }
}

/// Provisions a DynamoDB instance, runs setup and a [`Suite`] against it, and
/// tears it down again.
#[derive(Debug, Clone)]
pub struct TestHarness {
    config: HarnessConfig,
    table: String,
}

impl TestHarness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            table: String::new(),
        }
    }

    /// Sets the table name exposed to tests through [`TestContext::table`].
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Starts a container or resolves the external endpoint.
    pub async fn provision(&self) -> Result<Instance> {
        match &self.config.mode {
            InstanceMode::External { endpoint } => {
                tracing::info!(endpoint = %endpoint, "using external DynamoDB instance");
                Ok(Instance {
                    endpoint: endpoint.clone(),
                    name: endpoint.clone(),
                    container: None,
                })
            }
            InstanceMode::Managed => {
                let runtime = detect_runtime(self.config.prefer_podman).await?;
                let port = acquire_free_port()?;
                let spec = ContainerSpec::dynamodb_local(&self.config.image, port);
                let container = start_container(runtime, &spec).await?;
                let endpoint = spec.endpoint();

                tracing::info!(endpoint = %endpoint, name = %spec.name, "DynamoDB Local started");
                Ok(Instance {
                    endpoint,
                    name: spec.name,
                    container: Some(container),
                })
            }
        }
    }

    /// Builds a client for `instance` and waits until it answers.
    pub async fn connect(&self, instance: &Instance) -> Result<Client> {
        let client = create_client(&self.config.client, &instance.endpoint).await?;
        wait_until_ready(
            &client,
            &instance.name,
            self.config.readiness_timeout,
            self.config.readiness_interval,
        )
        .await?;
        Ok(client)
    }

    /// Runs the full sequence and returns the process exit code.
    ///
    /// Any failure before the suite starts aborts the run with
    /// `ExitCode::FAILURE`. The summary or the abort reason is always written
    /// to stderr, whether or not a tracing subscriber is installed.
    pub async fn run<S, Fut>(&self, suite: Suite, setup: S) -> ExitCode
    where
        S: FnOnce(Client) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        match self.try_run(suite, setup).await {
            Ok(report) => {
                eprintln!("{}", report.summary());
                report.exit_code()
            }
            Err(err) => {
                tracing::debug!(error = ?err, "test run aborted");
                eprintln!("{}", abort_message(&err));
                ExitCode::FAILURE
            }
        }
    }

    /// Like [`TestHarness::run`], but returns the report or the error that
    /// aborted the run. The instance is released on every path.
    pub async fn try_run<S, Fut>(&self, suite: Suite, setup: S) -> Result<SuiteReport>
    where
        S: FnOnce(Client) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let instance = self.provision().await?;
        let outcome = self.execute(&instance, suite, setup).await;
        instance.shutdown().await;
        outcome
    }

    async fn execute<S, Fut>(
        &self,
        instance: &Instance,
        suite: Suite,
        setup: S,
    ) -> Result<SuiteReport>
    where
        S: FnOnce(Client) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let client = self.connect(instance).await?;

        setup(client).await.map_err(HarnessError::Setup)?;
        tracing::info!(tests = suite.len(), "setup complete, running tests");

        let ctx = TestContext::new(
            instance.endpoint.clone(),
            self.table.clone(),
            self.config.client.clone(),
        );
        Ok(suite.run(ctx).await)
    }
}

fn abort_message(err: &HarnessError) -> String {
    format!("error: aborting test run: {}", err)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn unreachable_external() -> HarnessConfig {
        let port = acquire_free_port().unwrap();
        HarnessConfig::default()
            .with_mode(InstanceMode::External {
                endpoint: format!("http://127.0.0.1:{}", port),
            })
            .with_readiness_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_provision_external_has_no_container() {
        let harness = TestHarness::new(HarnessConfig::default().with_mode(
            InstanceMode::External {
                endpoint: "http://localhost:8000".to_string(),
            },
        ));

        let instance = harness.provision().await.unwrap();
        assert_eq!(instance.endpoint(), "http://localhost:8000");
        assert!(!instance.is_managed());
        instance.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_fails_when_instance_never_becomes_ready() {
        let harness = TestHarness::new(unreachable_external());
        let mut setup_called = false;

        let err = harness
            .try_run(Suite::new(), |_client| {
                setup_called = true;
                async { Ok(()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::ContainerNotReady { .. }));
        assert!(!setup_called);
    }

    #[tokio::test]
    async fn test_run_fails_on_invalid_endpoint() {
        let harness = TestHarness::new(HarnessConfig::default().with_mode(
            InstanceMode::External {
                endpoint: "http://".to_string(),
            },
        ));

        let err = harness
            .try_run(Suite::new(), |_client| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidEndpoint { .. }));
        assert!(abort_message(&err)
            .starts_with("error: aborting test run: Invalid endpoint 'http://'"));
    }

    #[test]
    fn test_abort_message_keeps_setup_context() {
        let err = HarnessError::Setup(anyhow::anyhow!("table exists").context("create table"));
        assert_eq!(
            abort_message(&err),
            "error: aborting test run: Setup failed: create table: table exists"
        );
    }

    #[test]
    fn test_with_table() {
        let harness = TestHarness::new(HarnessConfig::default()).with_table("test-table");
        assert_eq!(harness.table, "test-table");
        assert_eq!(harness.config().mode, InstanceMode::Managed);
    }
}
