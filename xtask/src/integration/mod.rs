//! Integration test runner.
//!
//! Runs the workspace test suite with `DYNAKIT_ITEST=1`, which enables the
//! `harness = false` test targets that talk to a real DynamoDB instance.
//!
//! # Usage
//!
//! ```bash
//! # Start a disposable DynamoDB Local container per test binary
//! cargo xtask integration
//!
//! # Prefer Podman over Docker
//! cargo xtask integration --podman
//!
//! # Reuse an instance that is already running
//! cargo xtask integration --external --endpoint http://localhost:8000
//! ```

pub mod error;

pub use error::{IntegrationError, Result};

use crate::prelude::*;

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run integration tests against DynamoDB Local.

By default every integration test binary starts its own DynamoDB Local
container on a free port and removes it when the binary exits.

Environment variables:
  DYNAKIT_IMAGE       - Override the DynamoDB Local image
  RUST_LOG            - Harness log filter (default: dynakit_harness=info)")]
pub struct IntegrationCommand {
    /// Reuse an already running instance instead of starting containers.
    #[arg(long)]
    pub external: bool,

    /// Endpoint of the external instance.
    #[arg(long, env = "DYNAKIT_ENDPOINT", default_value = "http://localhost:8000")]
    pub endpoint: String,

    /// Check Podman before Docker.
    #[arg(long)]
    pub podman: bool,

    /// Timeout in seconds for the readiness probe.
    #[arg(long, default_value = "30")]
    pub readiness_timeout: u64,

    /// Only run tests from this package.
    #[arg(long, short)]
    pub package: Option<String>,
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
        aprintln!(
            "{} {}",
            p_b("Instance:"),
            if command.external {
                format!("external ({})", command.endpoint)
            } else if command.podman {
                "managed (podman)".to_string()
            } else {
                "managed (docker)".to_string()
            }
        );
        aprintln!();
    }

    let mut cmd = tokio::process::Command::new("cargo");
    cmd.args(cargo_test_args(&command));
    for (key, value) in environment_variables(&command) {
        cmd.env(key, value);
    }

    let status = cmd.status().await?;

    for line in outcome_lines(status.success(), global.is_silent()) {
        aprintln!("{}", line);
    }

    if status.success() {
        Ok(())
    } else {
        Err(IntegrationError::TestFailed(format!(
            "cargo test exited with {}",
            status
        )))
    }
}

/// Lines printed after `cargo test` exits. Empty when output is silenced.
pub fn outcome_lines(success: bool, silent: bool) -> Vec<String> {
    if silent {
        return Vec::new();
    }

    let outcome = if success {
        format!("{} {}", p_g("✅"), p_g("All integration tests passed!"))
    } else {
        format!("{} {}", p_r("❌"), p_r("Some integration tests failed"))
    };

    vec![String::new(), outcome]
}

/// Returns the arguments for `cargo`.
pub fn cargo_test_args(command: &IntegrationCommand) -> Vec<String> {
    let mut args = vec!["test".to_string()];

    match &command.package {
        Some(package) => {
            args.push("-p".to_string());
            args.push(package.clone());
        }
        None => args.push("--workspace".to_string()),
    }

    args
}

/// Returns the harness environment for the given command.
pub fn environment_variables(command: &IntegrationCommand) -> Vec<(&'static str, String)> {
    let mut vars = vec![
        ("DYNAKIT_ITEST", "1".to_string()),
        (
            "DYNAKIT_READINESS_TIMEOUT_SECS",
            command.readiness_timeout.to_string(),
        ),
    ];

    if command.external {
        vars.push(("DYNAKIT_EXTERNAL", "1".to_string()));
        vars.push(("DYNAKIT_ENDPOINT", command.endpoint.clone()));
    } else if command.podman {
        vars.push(("DYNAKIT_PREFER_PODMAN", "1".to_string()));
    }

    vars
}
