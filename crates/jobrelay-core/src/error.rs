//! Error types for job dispatch.
//!
//! Configuration problems are reported separately from failures of the
//! downstream Cloud Tasks call, and each one names the variable or call
//! involved so CI logs can be triaged without rerunning the job.

/// The result type used throughout jobrelay.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or submitting a job task.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment variable is not set.
    #[error("missing required environment variable {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: &'static str,
    },

    /// A required environment variable is set but blank.
    #[error("environment variable {name} is empty")]
    EmptyVariable {
        /// Name of the blank variable.
        name: &'static str,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("invalid value for {name}: {message}")]
    InvalidVariable {
        /// Name of the offending variable.
        name: &'static str,
        /// Description of what is wrong with the value.
        message: String,
    },

    /// Dispatcher or client configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A payload or request could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An envelope could not be decoded back into a job payload.
    #[error("malformed envelope: {message}")]
    Envelope {
        /// Description of the decoding failure.
        message: String,
    },

    /// An access token for the task queue service could not be obtained.
    #[error("authentication error: {message}")]
    Authentication {
        /// Description of the authentication failure.
        message: String,
    },

    /// The task queue service rejected the request or could not be reached.
    #[error("dispatch error: {message}")]
    Dispatch {
        /// Description of the failed call.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new invalid-variable error.
    #[must_use]
    pub fn invalid_variable(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidVariable {
            name,
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new envelope decoding error.
    #[must_use]
    pub fn envelope(message: impl Into<String>) -> Self {
        Self::Envelope {
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new dispatch error.
    #[must_use]
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::Dispatch {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new dispatch error with a source cause.
    #[must_use]
    pub fn dispatch_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Dispatch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the error was caused by configuration rather than the
    /// downstream call.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingVariable { .. }
                | Self::EmptyVariable { .. }
                | Self::InvalidVariable { .. }
                | Self::Configuration { .. }
        )
    }
}
