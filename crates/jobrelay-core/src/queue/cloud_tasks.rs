//! Google Cloud Tasks client.
//!
//! [`CloudTasksClient`] submits [`CreateTaskRequest`]s to the Cloud Tasks v2
//! REST API, authenticating with application default credentials.
//!
//! The real client is only compiled when the `gcp` feature is enabled.
//! Without it, a placeholder with the same constructor reports a
//! configuration error on every call.
//!
//! ## Example
//!
//! ```rust,ignore
//! use jobrelay_core::queue::cloud_tasks::{CloudTasksClient, CloudTasksClientConfig};
//!
//! let client = CloudTasksClient::new(CloudTasksClientConfig::default()).await?;
//! let created = client.create_task(&request).await?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Public Cloud Tasks API endpoint.
pub const DEFAULT_API_BASE: &str = "https://cloudtasks.googleapis.com";

/// OAuth scope requested for Cloud Tasks API calls.
pub const CLOUD_TASKS_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Connection settings for the Cloud Tasks API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudTasksClientConfig {
    /// API base URL, without a trailing `/v2`.
    pub api_base: String,
    /// HTTP timeout for the creation call.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for CloudTasksClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: default_timeout(),
        }
    }
}

impl CloudTasksClientConfig {
    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the settings before a client is built.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base is blank or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(Error::configuration("api_base cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the task creation URL for `queue_path`.
    #[must_use]
    pub fn tasks_url(&self, queue_path: &str) -> String {
        format!("{}/v2/{queue_path}/tasks", self.api_base.trim_end_matches('/'))
    }
}

/// Cloud Tasks API error response.
#[derive(Debug, Deserialize)]
struct CloudTasksErrorResponse {
    error: CloudTasksError,
}

#[derive(Debug, Deserialize)]
struct CloudTasksError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Builds the dispatch error for a non-success API response.
#[cfg_attr(not(feature = "gcp"), allow(dead_code))]
pub(crate) fn api_error(status: u16, body: &str) -> Error {
    if let Ok(response) = serde_json::from_str::<CloudTasksErrorResponse>(body) {
        return Error::dispatch(format!(
            "Cloud Tasks API error {status}: {} ({})",
            response.error.message, response.error.status
        ));
    }

    Error::dispatch(format!("Cloud Tasks API error {status}: {body}"))
}

#[cfg(feature = "gcp")]
mod gcp_impl {
    use std::sync::Arc;

    use async_trait::async_trait;
    use gcp_auth::TokenProvider;
    use serde::Deserialize;

    use super::{CLOUD_TASKS_SCOPE, CloudTasksClientConfig, api_error};
    use crate::error::{Error, Result};
    use crate::queue::{CreatedTask, TaskQueueClient};
    use crate::task::CreateTaskRequest;

    /// Cloud Tasks API success response.
    #[derive(Debug, Deserialize)]
    struct CreateTaskResponse {
        name: String,
    }

    /// Google Cloud Tasks client.
    pub struct CloudTasksClient {
        config: CloudTasksClientConfig,
        token_provider: Arc<dyn TokenProvider>,
        client: reqwest::Client,
    }

    // TokenProvider doesn't implement Debug.
    impl std::fmt::Debug for CloudTasksClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CloudTasksClient")
                .field("config", &self.config)
                .field("token_provider", &"<TokenProvider>")
                .field("client", &self.client)
                .finish()
        }
    }

    impl CloudTasksClient {
        /// Creates a client using application default credentials.
        ///
        /// # Errors
        ///
        /// Returns an error if:
        /// - Configuration is invalid
        /// - GCP authentication cannot be initialized
        pub async fn new(config: CloudTasksClientConfig) -> Result<Self> {
            config.validate()?;

            let token_provider = gcp_auth::provider()
                .await
                .map_err(|e| Error::authentication(format!("failed to initialize GCP auth: {e}")))?;

            Self::with_token_provider(config, token_provider)
        }

        /// Creates a client with an explicit token provider.
        ///
        /// # Errors
        ///
        /// Returns an error if the configuration is invalid or the HTTP
        /// client cannot be built.
        pub fn with_token_provider(
            config: CloudTasksClientConfig,
            token_provider: Arc<dyn TokenProvider>,
        ) -> Result<Self> {
            config.validate()?;

            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;

            Ok(Self {
                config,
                token_provider,
                client,
            })
        }

        async fn access_token(&self) -> Result<String> {
            let token = self
                .token_provider
                .token(&[CLOUD_TASKS_SCOPE])
                .await
                .map_err(|e| Error::authentication(format!("failed to get GCP access token: {e}")))?;

            Ok(token.as_str().to_string())
        }
    }

    #[async_trait]
    impl TaskQueueClient for CloudTasksClient {
        async fn create_task(&self, request: &CreateTaskRequest) -> Result<CreatedTask> {
            let access_token = self.access_token().await?;
            let api_url = self.config.tasks_url(&request.queue_path);

            tracing::debug!(url = %api_url, "creating Cloud Task");

            let response = self
                .client
                .post(&api_url)
                .bearer_auth(&access_token)
                .json(request)
                .send()
                .await
                .map_err(|e| Error::dispatch_with_source("Cloud Tasks API request failed", e))?;

            let status = response.status();
            if status.is_success() {
                let created: CreateTaskResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::dispatch_with_source("failed to parse create response", e))?;
                return Ok(CreatedTask { name: created.name });
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(api_error(status.as_u16(), &body))
        }

        fn endpoint(&self) -> &str {
            &self.config.api_base
        }
    }
}

#[cfg(not(feature = "gcp"))]
mod placeholder_impl {
    use async_trait::async_trait;

    use super::CloudTasksClientConfig;
    use crate::error::{Error, Result};
    use crate::queue::{CreatedTask, TaskQueueClient};
    use crate::task::CreateTaskRequest;

    /// Placeholder Cloud Tasks client (GCP feature not enabled).
    #[derive(Debug)]
    pub struct CloudTasksClient {
        config: CloudTasksClientConfig,
    }

    impl CloudTasksClient {
        /// Creates a placeholder client.
        ///
        /// # Errors
        ///
        /// Returns an error if the configuration is invalid.
        #[allow(clippy::unused_async)]
        pub async fn new(config: CloudTasksClientConfig) -> Result<Self> {
            config.validate()?;
            Ok(Self { config })
        }
    }

    #[async_trait]
    impl TaskQueueClient for CloudTasksClient {
        async fn create_task(&self, _request: &CreateTaskRequest) -> Result<CreatedTask> {
            Err(Error::configuration(
                "CloudTasksClient requires the 'gcp' feature to be enabled",
            ))
        }

        fn endpoint(&self) -> &str {
            &self.config.api_base
        }
    }
}

#[cfg(feature = "gcp")]
pub use gcp_impl::CloudTasksClient;

#[cfg(not(feature = "gcp"))]
pub use placeholder_impl::CloudTasksClient;
