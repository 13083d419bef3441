use thiserror::Error;

/// How a remote failure should be treated by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 401/403 - credentials are wrong, retrying cannot help
    Auth,
    /// Other 4xx, or a body that is not the expected JSON
    Client,
    /// 5xx, network failure or timeout
    Transient,
}

/// Classified failure of a single remote call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response body: {message}")]
    Decode { message: String },
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Classifies the failure. A timeout is never a client error, even when the
    /// server reports it as 408. An unparseable body (e.g. a 203 sign-in page
    /// served for a bad token) will not parse on a second try either.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Decode { .. } => ErrorClass::Client,
            Self::Status { status: 401 | 403, .. } => ErrorClass::Auth,
            Self::Status { status: 408, .. } => ErrorClass::Transient,
            Self::Status { status, .. } if (400..500).contains(status) => ErrorClass::Client,
            _ => ErrorClass::Transient,
        }
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to {operation}: {source}")]
    Remote {
        operation: String,
        #[source]
        source: ApiError,
    },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, source: ApiError) -> Self {
        Self::Remote {
            operation: operation.into(),
            source,
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// The underlying remote error, if this error came from the API
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
