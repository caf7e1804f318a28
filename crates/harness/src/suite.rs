//! Test registration and execution against a provisioned instance.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use aws_sdk_dynamodb::Client;
use tokio::task::JoinSet;

use crate::client::create_client;
use crate::config::ClientSettings;
use crate::error::Result;

type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type TestFn = Box<dyn FnOnce(TestContext) -> TestFuture + Send>;

/// What a test gets to talk to the instance provisioned for this run.
#[derive(Debug, Clone)]
pub struct TestContext {
    endpoint: String,
    table: String,
    settings: ClientSettings,
}

impl TestContext {
    pub fn new(
        endpoint: impl Into<String>,
        table: impl Into<String>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            table: table.into(),
            settings,
        }
    }

    /// Endpoint URL of the instance.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Table name configured on the harness.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Builds a new client for the instance.
    pub async fn client(&self) -> Result<Client> {
        create_client(&self.settings, &self.endpoint).await
    }
}

/// A named set of async tests, run concurrently once the instance is set up.
#[derive(Default)]
pub struct Suite {
    tests: Vec<(String, TestFn)>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a test.
    pub fn test<F, Fut>(mut self, name: impl Into<String>, test: F) -> Self
    where
        F: FnOnce(TestContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let boxed: TestFn = Box::new(move |ctx| Box::pin(test(ctx)));
        self.tests.push((name.into(), boxed));
        self
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Runs every test on its own task and collects the outcomes.
    ///
    /// A test fails when it returns an error or panics.
    pub async fn run(self, ctx: TestContext) -> SuiteReport {
        let start = Instant::now();
        let mut set = JoinSet::new();
        let mut names = HashMap::new();

        for (name, test) in self.tests {
            let handle = set.spawn(test(ctx.clone()));
            names.insert(handle.id(), name);
        }

        let mut report = SuiteReport::default();

        while let Some(joined) = set.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, result)) => (id, Ok(result)),
                Err(err) => (err.id(), Err(err)),
            };
            let name = names
                .remove(&id)
                .unwrap_or_else(|| "<unknown>".to_string());

            match outcome {
                Ok(Ok(())) => {
                    tracing::info!(test = %name, "ok");
                    report.passed.push(name);
                }
                Ok(Err(err)) => {
                    tracing::error!(test = %name, error = %format!("{:#}", err), "FAILED");
                    report.failed.push((name, format!("{:#}", err)));
                }
                Err(err) => {
                    let reason = if err.is_panic() {
                        "test panicked".to_string()
                    } else {
                        err.to_string()
                    };
                    tracing::error!(test = %name, error = %reason, "FAILED");
                    report.failed.push((name, reason));
                }
            }
        }

        report.passed.sort();
        report.failed.sort();
        report.elapsed = start.elapsed();
        report
    }
}

/// Outcome of a suite run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: Vec<String>,
    /// Failed test names with the reason they failed.
    pub failed: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    /// One-line summary in the style of `cargo test`.
    pub fn summary(&self) -> String {
        format!(
            "test result: {}. {} passed; {} failed; finished in {:.2}s",
            if self.success() { "ok" } else { "FAILED" },
            self.passed.len(),
            self.failed.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TestContext {
        TestContext::new(
            "http://localhost:8000",
            "test-table",
            ClientSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_run_collects_outcomes() {
        let suite = Suite::new()
            .test("passes", |_| async { Ok(()) })
            .test("fails", |_| async { anyhow::bail!("boom") })
            .test("sees_context", |ctx| async move {
                anyhow::ensure!(ctx.table() == "test-table", "wrong table");
                anyhow::ensure!(ctx.endpoint() == "http://localhost:8000", "wrong endpoint");
                Ok(())
            });
        assert_eq!(suite.len(), 3);

        let report = suite.run(ctx()).await;

        assert_eq!(report.passed, vec!["passes", "sees_context"]);
        assert_eq!(report.failed, vec![("fails".to_string(), "boom".to_string())]);
        assert!(!report.success());
    }

    #[tokio::test]
    async fn test_run_captures_panics() {
        let report = Suite::new()
            .test("panics", |ctx| async move {
                assert_eq!(ctx.table(), "another-table");
                Ok(())
            })
            .run(ctx())
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "panics");
        assert_eq!(report.failed[0].1, "test panicked");
    }

    #[tokio::test]
    async fn test_panics_keep_their_names_among_many() {
        let mut suite = Suite::new();
        for i in 0..8 {
            suite = suite.test(format!("case_{i}"), move |_| async move {
                assert!(i % 2 == 0, "odd case");
                Ok(())
            });
        }

        let report = suite.run(ctx()).await;

        assert_eq!(report.passed, vec!["case_0", "case_2", "case_4", "case_6"]);
        let failed: Vec<_> = report.failed.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(failed, vec!["case_1", "case_3", "case_5", "case_7"]);
        assert!(report.failed.iter().all(|(_, reason)| reason == "test panicked"));
    }

    #[tokio::test]
    async fn test_empty_suite_succeeds() {
        let suite = Suite::new();
        assert!(suite.is_empty());

        let report = suite.run(ctx()).await;
        assert!(report.success());
        assert!(report.summary().starts_with("test result: ok. 0 passed; 0 failed"));
    }

    #[test]
    fn test_summary_reports_failures() {
        let report = SuiteReport {
            passed: vec!["a".to_string()],
            failed: vec![("b".to_string(), "boom".to_string())],
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            report.summary(),
            "test result: FAILED. 1 passed; 1 failed; finished in 1.50s"
        );
    }
}
