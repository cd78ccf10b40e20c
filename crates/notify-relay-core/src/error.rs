use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed fragment (no `label:body` shape): {fragment}")]
    MalformedFragment { fragment: String },

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Completion endpoint error (HTTP {status}): {body}")]
    EndpointError { status: u16, body: String },

    #[error("No consumer registered")]
    NoConsumerRegistered,

    #[error("Registered consumer is gone")]
    ConsumerGone,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Short, stable error code used in logs and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::MalformedFragment { .. } => "MALFORMED_FRAGMENT",
            RelayError::TransportFailure(_) => "TRANSPORT_FAILURE",
            RelayError::EndpointError { .. } => "ENDPOINT_ERROR",
            RelayError::NoConsumerRegistered => "NO_CONSUMER_REGISTERED",
            RelayError::ConsumerGone => "CONSUMER_GONE",
            RelayError::Serialization(_) => "SERIALIZATION_ERROR",
            RelayError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
