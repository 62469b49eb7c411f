//! Error types for groundwork operations
//!
//! Errors are structured with fields to aid debugging in production.
//! Each error variant includes contextual information like resource names,
//! provider types, and underlying causes.

use thiserror::Error;

/// Main error type for groundwork operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete user input, detected before any cloud call
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "aws.region")
        field: Option<String>,
    },

    /// A cloud provider API call failed
    #[error("provider error [{provider}] for {resource}: {message}")]
    Api {
        /// Provider type (aws, gcp)
        provider: String,
        /// Name of the resource the call was about
        resource: String,
        /// Description of what failed
        message: String,
        /// Whether this error is retryable
        retryable: bool,
    },

    /// A resource reported a terminal provider-side state (e.g. FAILED)
    #[error("resource {resource} entered terminal state: {detail}")]
    ResourceFailed {
        /// Name of the resource that failed
        resource: String,
        /// Provider-reported failure detail
        detail: String,
    },

    /// A long-running operation completed with an error payload
    #[error("operation {operation} failed permanently: {detail}")]
    OperationFailed {
        /// Provider handle of the operation
        operation: String,
        /// The error payload reported by the provider
        detail: String,
    },

    /// A whole creation attempt exceeded its deadline
    #[error("cluster creation attempt timed out after {seconds} seconds")]
    AttemptTimeout {
        /// The deadline that was exceeded
        seconds: u64,
    },

    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// Filesystem error (kubeconfig write and similar)
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the workspace
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a configuration error with a field path
    pub fn config_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a retryable provider error
    pub fn api(
        provider: impl Into<String>,
        resource: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Api {
            provider: provider.into(),
            resource: resource.into(),
            message: msg.into(),
            retryable: true,
        }
    }

    /// Create a non-retryable provider error (quota, permission, bad request)
    pub fn api_permanent(
        provider: impl Into<String>,
        resource: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Api {
            provider: provider.into(),
            resource: resource.into(),
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create a terminal resource-state error
    pub fn resource_failed(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ResourceFailed {
            resource: resource.into(),
            detail: detail.into(),
        }
    }

    /// Create a permanent operation failure
    pub fn operation_failed(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Check if this error is retryable at the attempt level
    ///
    /// Configuration and serialization errors are not retryable (require a
    /// config fix). Attempt timeouts are retryable: the next attempt resumes
    /// against whatever infrastructure already exists.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Config { .. } => false,
            Error::Api { retryable, .. } => *retryable,
            Error::ResourceFailed { .. } => true,
            Error::OperationFailed { .. } => true,
            Error::AttemptTimeout { .. } => true,
            Error::Kube { source } => {
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Serialization { .. } => false,
            Error::Io { .. } => true,
        }
    }

    /// Whether log output for this error should omit the detail line
    ///
    /// Attempt timeouts carry no interesting detail; logging the full chain
    /// on every retry drowns the actual progress messages.
    pub fn is_quiet(&self) -> bool {
        matches!(self, Error::AttemptTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_not_retryable() {
        assert!(!Error::config("missing region").is_retryable());
        assert!(!Error::config_field("aws.region", "missing").is_retryable());
        assert!(!Error::serialization("bad yaml").is_retryable());
    }

    #[test]
    fn api_errors_carry_retryability() {
        assert!(Error::api("aws", "vpc", "throttled").is_retryable());
        assert!(!Error::api_permanent("aws", "vpc", "quota exceeded").is_retryable());
    }

    #[test]
    fn terminal_states_are_retryable_at_attempt_level() {
        // The next attempt tears the failed resource down and re-creates it.
        assert!(Error::resource_failed("eks-prod", "FAILED").is_retryable());
        assert!(Error::operation_failed("op-123", "peering rejected").is_retryable());
    }

    #[test]
    fn attempt_timeout_is_quiet() {
        let err = Error::AttemptTimeout { seconds: 2400 };
        assert!(err.is_quiet());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("2400"));
        assert!(!Error::config("x").is_quiet());
    }

    #[test]
    fn error_messages_include_context() {
        let err = Error::api("gcp", "address-prod", "backend error");
        assert!(err.to_string().contains("gcp"));
        assert!(err.to_string().contains("address-prod"));

        let err = Error::config_field("node_count", "must be positive");
        assert!(err.to_string().contains("must be positive"));
    }
}
