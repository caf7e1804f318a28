//! Error types for the test harness.

use thiserror::Error;

/// Result type alias for the harness.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that abort a harness run before the suite executes.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Container runtime not found: {0}")]
    ContainerRuntimeNotFound(String),

    #[error("Couldn't acquire a free port: {0}")]
    PortUnavailable(#[source] std::io::Error),

    #[error("Container start failed: {0}")]
    ContainerStartFailed(String),

    #[error("Container '{name}' is not ready after {timeout_secs}s")]
    ContainerNotReady { name: String, timeout_secs: u64 },

    #[error("Invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_not_ready_display() {
        let error = HarnessError::ContainerNotReady {
            name: "dynakit-abc".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(
            error.to_string(),
            "Container 'dynakit-abc' is not ready after 30s"
        );
    }

    #[test]
    fn test_setup_display_includes_context_chain() {
        let source = anyhow::anyhow!("table exists").context("create table");
        let error = HarnessError::Setup(source);
        assert_eq!(error.to_string(), "Setup failed: create table: table exists");
    }
}
