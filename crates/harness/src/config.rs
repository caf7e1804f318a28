//! Harness configuration (Functional Core - pure data).
//!
//! The configuration is resolved once, before anything is started. Reading
//! the environment goes through a lookup function so that the parsing rules
//! can be tested without touching process state.

use std::time::Duration;

use crate::error::{HarnessError, Result};

pub const DEFAULT_IMAGE: &str = "amazon/dynamodb-local:latest";
pub const DEFAULT_EXTERNAL_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where the DynamoDB instance used by the tests comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceMode {
    /// Start a disposable DynamoDB Local container for this run.
    Managed,
    /// Reuse an instance someone else already started (e.g. a CI service).
    External { endpoint: String },
}

/// Settings used to build every DynamoDB client handed out by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub region: String,
    /// Timeout applied to each request attempt.
    pub request_timeout: Duration,
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            request_timeout: Duration::from_secs(3),
            max_attempts: 1,
        }
    }
}

/// Full harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub mode: InstanceMode,
    pub image: String,
    pub prefer_podman: bool,
    pub client: ClientSettings,
    pub readiness_timeout: Duration,
    pub readiness_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: InstanceMode::Managed,
            image: DEFAULT_IMAGE.to_string(),
            prefer_podman: false,
            client: ClientSettings::default(),
            readiness_timeout: Duration::from_secs(30),
            readiness_interval: Duration::from_millis(500),
        }
    }
}

impl HarnessConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// | Variable                         | Effect                                  |
    /// |----------------------------------|-----------------------------------------|
    /// | `DYNAKIT_EXTERNAL` / `CIRCLECI`  | reuse the instance at `DYNAKIT_ENDPOINT` |
    /// | `DYNAKIT_ENDPOINT`               | external endpoint                       |
    /// | `DYNAKIT_IMAGE`                  | container image                         |
    /// | `DYNAKIT_PREFER_PODMAN`          | check podman before docker              |
    /// | `DYNAKIT_REGION`                 | client region                           |
    /// | `DYNAKIT_READINESS_TIMEOUT_SECS` | readiness poll budget                   |
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let external = lookup("DYNAKIT_EXTERNAL").is_some_and(|v| is_truthy(&v))
            || lookup("CIRCLECI").is_some_and(|v| v == "true");

        if external {
            let endpoint = lookup("DYNAKIT_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_EXTERNAL_ENDPOINT.to_string());
            config.mode = InstanceMode::External { endpoint };
        }

        if let Some(image) = lookup("DYNAKIT_IMAGE").filter(|v| !v.trim().is_empty()) {
            config.image = image;
        }

        config.prefer_podman = lookup("DYNAKIT_PREFER_PODMAN").is_some_and(|v| is_truthy(&v));

        if let Some(region) = lookup("DYNAKIT_REGION").filter(|v| !v.trim().is_empty()) {
            config.client.region = region;
        }

        if let Some(raw) = lookup("DYNAKIT_READINESS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                HarnessError::InvalidConfig(format!(
                    "DYNAKIT_READINESS_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    raw
                ))
            })?;
            config.readiness_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the instance mode.
    pub fn with_mode(mut self, mode: InstanceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the container image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the readiness poll budget.
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    /// Sets the client settings.
    pub fn with_client_settings(mut self, client: ClientSettings) -> Self {
        self.client = client;
        self
    }
}

/// Returns true when integration tests were explicitly enabled with
/// `DYNAKIT_ITEST`.
pub fn integration_enabled() -> bool {
    std::env::var("DYNAKIT_ITEST").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
