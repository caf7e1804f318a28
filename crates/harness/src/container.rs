//! Container management for disposable DynamoDB Local instances.
//!
//! Follows the Functional Core - Imperative Shell split:
//!
//! - **Pure functions** build the container specification and `run` arguments.
//! - **I/O functions** detect the runtime and start/remove containers.
//!
//! A started container is owned by a [`ContainerGuard`], which removes it
//! exactly once: explicitly through [`ContainerGuard::terminate`], or from
//! `Drop` when the guard goes away on an unwinding or early-return path.

use tokio::process::Command;
use uuid::Uuid;

use crate::error::{HarnessError, Result};

/// Port DynamoDB Local listens on inside the container.
pub const DYNAMODB_CONTAINER_PORT: u16 = 8000;

/// Arguments passed to the image's `java` entrypoint.
const DYNAMODB_COMMAND: &str = "-jar DynamoDBLocal.jar -inMemory -sharedDb";

/// Container runtime (Docker or Podman).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerRuntime {
    #[default]
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Returns the command name for the container runtime.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
        }
    }
}

/// Specification for one disposable container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    pub command: Option<String>,
}

impl ContainerSpec {
    /// DynamoDB Local bound to `host_port`, with a unique container name.
    pub fn dynamodb_local(image: impl Into<String>, host_port: u16) -> Self {
        Self {
            name: unique_container_name(),
            image: image.into(),
            host_port,
            container_port: DYNAMODB_CONTAINER_PORT,
            command: Some(DYNAMODB_COMMAND.to_string()),
        }
    }

    /// Endpoint URL of the container as seen from the host.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.host_port)
    }
}

/// Returns a container name no other run will use.
pub fn unique_container_name() -> String {
    format!("dynakit-{}", Uuid::new_v4().simple())
}

/// Builds arguments for `docker run` / `podman run`.
///
/// The container is detached and started with `--rm`, so stopping it also
/// removes it.
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        spec.name.clone(),
        "-p".to_string(),
        format!("{}:{}", spec.host_port, spec.container_port),
        spec.image.clone(),
    ];

    if let Some(cmd) = &spec.command {
        args.extend(cmd.split_whitespace().map(String::from));
    }

    args
}

/// Builds arguments that force-remove a container.
pub fn container_remove_args(name: &str) -> Vec<String> {
    vec!["rm".to_string(), "-f".to_string(), name.to_string()]
}

/// Detects which container runtime is available.
///
/// If `prefer_podman` is true, checks Podman first, then Docker.
/// Otherwise checks Docker first, then Podman.
pub async fn detect_runtime(prefer_podman: bool) -> Result<ContainerRuntime> {
    let check_order = if prefer_podman {
        [ContainerRuntime::Podman, ContainerRuntime::Docker]
    } else {
        [ContainerRuntime::Docker, ContainerRuntime::Podman]
    };

    for runtime in check_order {
        let output = Command::new(runtime.command())
            .arg("--version")
            .output()
            .await;

        if let Ok(output) = output {
            if output.status.success() {
                tracing::debug!(runtime = runtime.command(), "detected container runtime");
                return Ok(runtime);
            }
        }
    }

    Err(HarnessError::ContainerRuntimeNotFound(
        "Neither docker nor podman found in PATH".to_string(),
    ))
}

/// Starts a container and returns the guard that owns it.
pub async fn start_container(
    runtime: ContainerRuntime,
    spec: &ContainerSpec,
) -> Result<ContainerGuard> {
    let args = container_run_args(spec);

    tracing::info!(
        name = %spec.name,
        image = %spec.image,
        port = spec.host_port,
        "starting container"
    );

    let output = Command::new(runtime.command()).args(&args).output().await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HarnessError::ContainerStartFailed(format!(
            "Failed to start container '{}': {}",
            spec.name,
            stderr.trim()
        )));
    }

    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    tracing::debug!(name = %spec.name, id = %id, "container started");

    Ok(ContainerGuard::new(runtime.command(), spec.name.clone()))
}

/// Exclusive owner of a running container.
#[derive(Debug)]
pub struct ContainerGuard {
    /// Runtime binary that receives the `rm -f` arguments.
    program: String,
    name: String,
    released: bool,
}

impl ContainerGuard {
    fn new(program: impl Into<String>, name: String) -> Self {
        Self {
            program: program.into(),
            name,
            released: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Removes the container.
    ///
    /// Failures are logged and swallowed: teardown runs after the outcome of
    /// the run is already known and must not change it.
    pub async fn terminate(mut self) {
        self.released = true;

        let output = Command::new(&self.program)
            .args(container_remove_args(&self.name))
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                tracing::info!(name = %self.name, "container removed");
            }
            Ok(output) => {
                tracing::warn!(
                    name = %self.name,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "failed to remove container"
                );
            }
            Err(err) => {
                tracing::warn!(name = %self.name, error = %err, "failed to remove container");
            }
        }
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        tracing::warn!(name = %self.name, "container guard dropped, removing container");

        // Blocking on purpose: Drop can run outside of any async context.
        let result = std::process::Command::new(&self.program)
            .args(container_remove_args(&self.name))
            .output();

        if let Err(err) = result {
            tracing::warn!(name = %self.name, error = %err, "failed to remove container");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_run_args() {
        let spec = ContainerSpec {
            name: "dynakit-test".to_string(),
            image: "amazon/dynamodb-local:latest".to_string(),
            host_port: 54321,
            container_port: 8000,
            command: Some(DYNAMODB_COMMAND.to_string()),
        };
        let args = container_run_args(&spec);

        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--rm",
                "--name",
                "dynakit-test",
                "-p",
                "54321:8000",
                "amazon/dynamodb-local:latest",
                "-jar",
                "DynamoDBLocal.jar",
                "-inMemory",
                "-sharedDb",
            ]
        );
    }

    #[test]
    fn test_container_run_args_without_command() {
        let spec = ContainerSpec {
            command: None,
            ..ContainerSpec::dynamodb_local("img", 1234)
        };
        let args = container_run_args(&spec);

        assert_eq!(args.last().map(String::as_str), Some("img"));
        assert!(args.contains(&"1234:8000".to_string()));
    }

    #[test]
    fn test_dynamodb_local_spec() {
        let spec = ContainerSpec::dynamodb_local("amazon/dynamodb-local:latest", 40000);

        assert!(spec.name.starts_with("dynakit-"));
        assert_eq!(spec.container_port, 8000);
        assert_eq!(spec.endpoint(), "http://localhost:40000");
    }

    #[test]
    fn test_container_names_are_unique_per_run() {
        let a = ContainerSpec::dynamodb_local("img", 1);
        let b = ContainerSpec::dynamodb_local("img", 1);
        assert_ne!(a.name, b.name);
    }

    #[test]
    fn test_container_remove_args() {
        assert_eq!(container_remove_args("dynakit-x"), vec!["rm", "-f", "dynakit-x"]);
    }

    #[test]
    fn test_runtime_command() {
        assert_eq!(ContainerRuntime::Docker.command(), "docker");
        assert_eq!(ContainerRuntime::Podman.command(), "podman");
    }

    /// Writes a stand-in runtime that appends its arguments to `calls.log`.
    #[cfg(unix)]
    fn recording_runtime() -> (std::path::PathBuf, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(unique_container_name());
        std::fs::create_dir_all(&dir).unwrap();
        let log = dir.join("calls.log");
        let program = dir.join("runtime");

        std::fs::write(
            &program,
            format!("#!/bin/sh\necho \"$@\" >> '{}'\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        (program, log)
    }

    #[cfg(unix)]
    fn recorded_calls(log: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_guard_terminate_then_drop_removes_once() {
        let (program, log) = recording_runtime();
        let guard = ContainerGuard::new(program.to_string_lossy(), "dynakit-a".to_string());
        assert_eq!(guard.name(), "dynakit-a");

        guard.terminate().await;

        assert_eq!(recorded_calls(&log), vec!["rm -f dynakit-a"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_guard_drop_removes_once() {
        let (program, log) = recording_runtime();
        let guard = ContainerGuard::new(program.to_string_lossy(), "dynakit-b".to_string());

        drop(guard);

        assert_eq!(recorded_calls(&log), vec!["rm -f dynakit-b"]);
    }
}
