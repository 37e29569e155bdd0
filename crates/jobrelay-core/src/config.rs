//! Environment-driven dispatch configuration.
//!
//! All job and destination parameters are read once at startup into a
//! [`DispatchConfig`] and validated before any payload is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::payload::parse_classes;

/// Commit under test.
pub const COMMIT_HASH: &str = "COMMIT_HASH";
/// Comma-separated list of test classes to run.
pub const CLASSES: &str = "CLASSES";
/// Pull request number the job belongs to.
pub const PULL_REQUEST_NUMBER: &str = "PULL_REQUEST_NUMBER";
/// GCP project that owns the queue.
pub const PROJECT_ID: &str = "PROJECT_ID";
/// Cloud Tasks queue identifier.
pub const QUEUE_ID: &str = "QUEUE_ID";
/// Cloud Tasks location (e.g. `us-central1`).
pub const LOCATION: &str = "LOCATION";
/// Endpoint the created task will call.
pub const WORKFLOW_URL: &str = "WORKFLOW_URL";
/// Service account whose identity signs the callback.
pub const SERVICE_ACCOUNT_EMAIL: &str = "SERVICE_ACCOUNT_EMAIL";
/// Optional: `oauth` (default) or `oidc`.
pub const AUTH_TOKEN_TYPE: &str = "AUTH_TOKEN_TYPE";
/// Optional: OIDC audience override.
pub const AUTH_AUDIENCE: &str = "AUTH_AUDIENCE";
/// Optional: OAuth scope override.
pub const AUTH_SCOPE: &str = "AUTH_SCOPE";

/// Kind of token Cloud Tasks attaches to the callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthTokenKind {
    /// OAuth access token, for Google APIs such as Workflows executions.
    #[default]
    Oauth,
    /// OIDC identity token, for endpoints that verify the caller's identity.
    Oidc,
}

impl FromStr for AuthTokenKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "oidc" => Ok(Self::Oidc),
            "oauth" => Ok(Self::Oauth),
            other => Err(Error::invalid_variable(
                AUTH_TOKEN_TYPE,
                format!("expected `oidc` or `oauth`, got `{other}`"),
            )),
        }
    }
}

impl fmt::Display for AuthTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oidc => f.write_str("oidc"),
            Self::Oauth => f.write_str("oauth"),
        }
    }
}

/// Validated configuration for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Commit under test.
    pub commit_hash: String,
    /// Raw comma-separated class list, as provided.
    pub classes: String,
    /// Pull request number.
    pub pull_request: String,
    /// GCP project ID.
    pub project_id: String,
    /// Cloud Tasks location.
    pub location: String,
    /// Cloud Tasks queue ID.
    pub queue_id: String,
    /// Target URL for the HTTP task.
    pub workflow_url: String,
    /// Service account used for the callback token.
    pub service_account_email: String,
    /// Token kind attached to the callback.
    #[serde(default)]
    pub auth_token: AuthTokenKind,
    /// OIDC audience; Cloud Tasks uses the target URL when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// OAuth scope; Cloud Tasks uses `cloud-platform` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl DispatchConfig {
    /// Reads and validates configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first variable that is missing, blank or
    /// malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads and validates configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first variable that is missing, blank or
    /// malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| required_var(&lookup, name);
        let optional = |name: &'static str| optional_var(&lookup, name);

        let config = Self {
            commit_hash: required(COMMIT_HASH)?,
            classes: required(CLASSES)?,
            pull_request: required(PULL_REQUEST_NUMBER)?,
            project_id: required(PROJECT_ID)?,
            location: required(LOCATION)?,
            queue_id: required(QUEUE_ID)?,
            workflow_url: required(WORKFLOW_URL)?,
            service_account_email: required(SERVICE_ACCOUNT_EMAIL)?,
            auth_token: optional(AUTH_TOKEN_TYPE)
                .map(|value| value.parse())
                .transpose()?
                .unwrap_or_default(),
            audience: optional(AUTH_AUDIENCE),
            scope: optional(AUTH_SCOPE),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks the values that need more than a presence check.
    ///
    /// # Errors
    ///
    /// Returns an error if the class list is blank or the workflow URL is
    /// not an absolute HTTP(S) URL.
    pub fn validate(&self) -> Result<()> {
        parse_classes(&self.classes)?;

        let url = Url::parse(&self.workflow_url)
            .map_err(|e| Error::invalid_variable(WORKFLOW_URL, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_variable(
                WORKFLOW_URL,
                format!("unsupported scheme `{}`", url.scheme()),
            ));
        }

        Ok(())
    }

    /// Returns the fully qualified queue resource name.
    #[must_use]
    pub fn queue_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location, self.queue_id
        )
    }
}

fn required_var<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or(Error::MissingVariable { name })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyVariable { name });
    }
    Ok(trimmed.to_string())
}

fn optional_var<F>(lookup: &F, name: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (COMMIT_HASH, "abc123".to_string()),
            (CLASSES, "Foo, Bar".to_string()),
            (PULL_REQUEST_NUMBER, "42".to_string()),
            (PROJECT_ID, "p".to_string()),
            (LOCATION, "l".to_string()),
            (QUEUE_ID, "q".to_string()),
            (WORKFLOW_URL, "https://x/y".to_string()),
            (SERVICE_ACCOUNT_EMAIL, "sa@p.iam".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<DispatchConfig> {
        DispatchConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn loads_complete_environment() {
        let config = load(&sample_env()).unwrap();

        assert_eq!(config.commit_hash, "abc123");
        assert_eq!(config.classes, "Foo, Bar");
        assert_eq!(config.pull_request, "42");
        assert_eq!(config.workflow_url, "https://x/y");
        assert_eq!(config.service_account_email, "sa@p.iam");
        assert_eq!(config.auth_token, AuthTokenKind::Oauth);
        assert!(config.audience.is_none());
        assert!(config.scope.is_none());
    }

    #[test]
    fn queue_path_is_fully_qualified() {
        let config = load(&sample_env()).unwrap();
        assert_eq!(config.queue_path(), "projects/p/locations/l/queues/q");
    }

    #[test]
    fn missing_variable_is_named() {
        for name in [
            COMMIT_HASH,
            CLASSES,
            PULL_REQUEST_NUMBER,
            PROJECT_ID,
            LOCATION,
            QUEUE_ID,
            WORKFLOW_URL,
            SERVICE_ACCOUNT_EMAIL,
        ] {
            let mut env = sample_env();
            env.remove(name);

            match load(&env) {
                Err(Error::MissingVariable { name: missing }) => assert_eq!(missing, name),
                other => panic!("expected MissingVariable for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_variable_is_rejected() {
        let mut env = sample_env();
        env.insert(PROJECT_ID, "   ".to_string());

        assert!(matches!(
            load(&env),
            Err(Error::EmptyVariable { name: PROJECT_ID })
        ));
    }

    #[test]
    fn values_are_trimmed() {
        let mut env = sample_env();
        env.insert(COMMIT_HASH, "abc123\n".to_string());

        assert_eq!(load(&env).unwrap().commit_hash, "abc123");
    }

    #[test]
    fn trailing_class_separator_is_accepted() {
        let mut env = sample_env();
        env.insert(CLASSES, "Foo,Bar,".to_string());

        assert_eq!(load(&env).unwrap().classes, "Foo,Bar,");
    }

    #[test]
    fn workflow_url_must_be_absolute_http() {
        let mut env = sample_env();
        env.insert(WORKFLOW_URL, "/relative/path".to_string());
        assert!(matches!(
            load(&env),
            Err(Error::InvalidVariable {
                name: WORKFLOW_URL,
                ..
            })
        ));

        env.insert(WORKFLOW_URL, "ftp://x/y".to_string());
        assert!(matches!(
            load(&env),
            Err(Error::InvalidVariable {
                name: WORKFLOW_URL,
                ..
            })
        ));
    }

    #[test]
    fn optional_auth_settings() {
        let mut env = sample_env();
        env.insert(AUTH_TOKEN_TYPE, "OIDC".to_string());
        env.insert(AUTH_SCOPE, "https://www.googleapis.com/auth/cloud-platform".to_string());
        env.insert(AUTH_AUDIENCE, String::new());

        let config = load(&env).unwrap();
        assert_eq!(config.auth_token, AuthTokenKind::Oidc);
        assert_eq!(
            config.scope.as_deref(),
            Some("https://www.googleapis.com/auth/cloud-platform")
        );
        assert!(config.audience.is_none());
    }

    #[test]
    fn unknown_token_type_is_rejected() {
        let mut env = sample_env();
        env.insert(AUTH_TOKEN_TYPE, "basic".to_string());

        assert!(matches!(
            load(&env),
            Err(Error::InvalidVariable {
                name: AUTH_TOKEN_TYPE,
                ..
            })
        ));
    }
}
