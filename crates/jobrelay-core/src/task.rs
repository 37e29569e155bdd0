//! Cloud Tasks HTTP task descriptor and create request.
//!
//! Types here serialize to the Cloud Tasks v2 REST shapes. The queue path is
//! carried alongside the body because the API takes it in the URL.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::{AuthTokenKind, DispatchConfig};
use crate::error::{Error, Result};

/// HTTP method used by the task callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `POST`
    #[default]
    Post,
}

/// OIDC token configuration for authenticated callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcToken {
    /// Service account email.
    pub service_account_email: String,
    /// Audience; Cloud Tasks falls back to the target URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

/// OAuth token configuration for callbacks into Google APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthToken {
    /// Service account email.
    pub service_account_email: String,
    /// Scope; Cloud Tasks falls back to `cloud-platform`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// HTTP request executed by Cloud Tasks when the task fires.
///
/// No headers, deadline or retry settings are set, so the queue defaults
/// apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTask {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Request body, standard base64.
    pub body: String,
    /// OIDC token, when the callback uses identity tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc_token: Option<OidcToken>,
    /// OAuth token, when the callback targets a Google API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<OAuthToken>,
}

impl HttpTask {
    /// Builds the descriptor that POSTs `envelope` to the configured workflow URL.
    #[must_use]
    pub fn new(config: &DispatchConfig, envelope: &str) -> Self {
        let email = config.service_account_email.clone();
        let (oidc_token, oauth_token) = match config.auth_token {
            AuthTokenKind::Oidc => (
                Some(OidcToken {
                    service_account_email: email,
                    audience: config.audience.clone(),
                }),
                None,
            ),
            AuthTokenKind::Oauth => (
                None,
                Some(OAuthToken {
                    service_account_email: email,
                    scope: config.scope.clone(),
                }),
            ),
        };

        Self {
            url: config.workflow_url.clone(),
            http_method: HttpMethod::Post,
            body: base64::engine::general_purpose::STANDARD.encode(envelope),
            oidc_token,
            oauth_token,
        }
    }

    /// Returns the service account whose token signs the callback.
    #[must_use]
    pub fn service_account_email(&self) -> Option<&str> {
        self.oidc_token
            .as_ref()
            .map(|token| token.service_account_email.as_str())
            .or_else(|| {
                self.oauth_token
                    .as_ref()
                    .map(|token| token.service_account_email.as_str())
            })
    }

    /// Decodes the body back into the envelope text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid base64 or not UTF-8.
    pub fn decoded_body(&self) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.body)
            .map_err(|e| Error::envelope(format!("body is not base64: {e}")))?;
        String::from_utf8(bytes).map_err(|e| Error::envelope(format!("body is not UTF-8: {e}")))
    }
}

/// Cloud Task resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudTask {
    /// HTTP request to execute.
    pub http_request: HttpTask,
}

/// Queue-qualified task creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// `projects/{project}/locations/{location}/queues/{queue}`.
    #[serde(skip)]
    pub queue_path: String,
    /// Task to create.
    pub task: CloudTask,
}

impl CreateTaskRequest {
    /// Pairs `task` with its parent queue.
    #[must_use]
    pub fn new(queue_path: impl Into<String>, task: HttpTask) -> Self {
        Self {
            queue_path: queue_path.into(),
            task: CloudTask { http_request: task },
        }
    }

    /// Returns the HTTP request the task will execute.
    #[must_use]
    pub const fn http_task(&self) -> &HttpTask {
        &self.task.http_request
    }

    /// Serializes the REST request body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| Error::serialization(e.to_string()))
    }
}
