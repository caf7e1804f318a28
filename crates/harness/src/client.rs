//! DynamoDB client setup (Imperative Shell).

use std::time::{Duration, Instant};

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;
use url::Url;

use crate::config::ClientSettings;
use crate::error::{HarnessError, Result};

/// Local instances accept any credentials, so every client uses this fixed set.
pub fn fake_credentials() -> Credentials {
    Credentials::new(
        "KEY",
        "SECRET",
        Some("SESSION".to_string()),
        None,
        "fake credentials",
    )
}

/// Validates `endpoint` and returns it in normalised form.
///
/// A bare `host:port` is accepted and treated as plain HTTP.
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = Url::parse(&candidate).map_err(|source| HarnessError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if url.host_str().is_none() {
        return Err(HarnessError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Creates a DynamoDB client pointed at `endpoint`.
pub async fn create_client(settings: &ClientSettings, endpoint: &str) -> Result<Client> {
    let endpoint = normalize_endpoint(endpoint)?;

    let timeout_config = TimeoutConfig::builder()
        .operation_attempt_timeout(settings.request_timeout)
        .build();

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .endpoint_url(&endpoint)
        .credentials_provider(fake_credentials())
        .timeout_config(timeout_config)
        .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts))
        .load()
        .await;

    Ok(Client::new(&sdk_config))
}

/// Polls the instance with a `ListTables` metadata probe until it answers or
/// `timeout` elapses.
pub async fn wait_until_ready(
    client: &Client,
    name: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match client.list_tables().limit(1).send().await {
            Ok(_) => {
                tracing::info!(name, attempts, "DynamoDB is ready");
                return Ok(());
            }
            Err(err) => {
                tracing::debug!(name, attempts, error = %err, "DynamoDB not ready yet");
            }
        }

        if start.elapsed() >= timeout {
            return Err(HarnessError::ContainerNotReady {
                name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }

        tokio::time::sleep(interval).await;
    }
}
