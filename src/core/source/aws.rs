//! AWS Secrets Manager fetcher.
//!
//! Reads secret blobs with `GetSecretValue`.
//! Enable with `--features aws`.
//!
//! Credentials and region come from the default AWS provider chain
//! (AWS_ACCESS_KEY_ID, AWS_PROFILE, instance/Lambda role, ...). Two
//! overrides are honored:
//!
//! - `ENVSECRETS_AWS_REGION`: region to use instead of the chain's
//! - `ENVSECRETS_AWS_ENDPOINT`: custom endpoint, e.g. localstack
//!
//! The fetcher owns a current-thread tokio runtime and blocks on it. Called
//! from inside another tokio runtime (a Lambda handler, say), the request is
//! driven on a helper thread instead, which still blocks the calling task.

use std::future::Future;

use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, trace};

use super::SecretFetcher;
use crate::core::constants::env;
use crate::error::StoreError;

/// AWS Secrets Manager fetcher.
pub struct AwsSecretsManager {
    client: Client,
    // Only taken in Drop
    runtime: Option<Runtime>,
}

impl AwsSecretsManager {
    /// Build a fetcher from the default AWS configuration plus envsecrets overrides.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Client` if the runtime cannot be created.
    pub fn from_env() -> Result<Self, StoreError> {
        let region = std::env::var(env::AWS_REGION).ok();
        let endpoint = std::env::var(env::AWS_ENDPOINT).ok();
        Self::new(region, endpoint)
    }

    /// Build a fetcher with explicit region and endpoint overrides.
    pub fn new(region: Option<String>, endpoint: Option<String>) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Client(format!("failed to create runtime: {}", e)))?;

        let loaded = run(&runtime, async {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(region) = region.clone() {
                loader = loader.region(aws_config::Region::new(region));
            }
            let shared = loader.load().await;

            let mut builder = aws_sdk_secretsmanager::config::Builder::from(&shared);
            if let Some(url) = endpoint.as_deref() {
                builder = builder.endpoint_url(url);
            }
            Client::from_conf(builder.build())
        });
        let client = match loaded {
            Ok(client) => client,
            Err(e) => {
                runtime.shutdown_background();
                return Err(e);
            }
        };

        debug!(
            region = region.as_deref().unwrap_or("default"),
            custom_endpoint = endpoint.is_some(),
            "created secrets manager client"
        );

        Ok(Self {
            client,
            runtime: Some(runtime),
        })
    }
}

impl AwsSecretsManager {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_stage: &str,
    ) -> Result<String, StoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .version_stage(version_stage)
            .send()
            .await
            .map_err(|e| StoreError::unavailable(secret_id, DisplayErrorContext(&e).to_string()))?;

        if let Some(text) = output.secret_string() {
            trace!(secret_id, len = text.len(), "fetched secret string");
            return Ok(text.to_string());
        }

        // Binary secrets carry the same JSON, just stored as bytes
        if let Some(blob) = output.secret_binary() {
            let text = String::from_utf8(blob.as_ref().to_vec()).map_err(|e| {
                StoreError::unavailable(secret_id, format!("binary secret is not UTF-8: {}", e))
            })?;
            trace!(secret_id, len = text.len(), "fetched secret binary");
            return Ok(text);
        }

        Err(StoreError::EmptyPayload {
            secret_id: secret_id.to_string(),
        })
    }
}

impl SecretFetcher for AwsSecretsManager {
    fn fetch(&self, secret_id: &str, version_stage: &str) -> Result<String, StoreError> {
        trace!(secret_id, version_stage, "fetching from secrets manager");
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| StoreError::Client("runtime already shut down".to_string()))?;
        run(runtime, self.get_secret_value(secret_id, version_stage))?
    }

    fn name(&self) -> &'static str {
        "aws-secretsmanager"
    }
}

impl Drop for AwsSecretsManager {
    fn drop(&mut self) {
        // A blocking shutdown panics inside an async context
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Block on `future` with the private runtime.
///
/// Tokio refuses to block a thread that is already driving a runtime, so in
/// that case the future runs on a scoped helper thread.
fn run<F>(runtime: &Runtime, future: F) -> Result<F::Output, StoreError>
where
    F: Future + Send,
    F::Output: Send,
{
    if Handle::try_current().is_err() {
        return Ok(runtime.block_on(future));
    }

    trace!("inside a tokio runtime, blocking on a helper thread");
    std::thread::scope(|scope| {
        scope
            .spawn(move || runtime.block_on(future))
            .join()
            .map_err(|_| StoreError::Client("secrets manager thread panicked".to_string()))
    })
}
