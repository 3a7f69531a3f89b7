use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
///
/// These are fatal at setup time and are never retried automatically.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("wrong scheme in AMQP URI: {scheme}")]
    InvalidScheme { scheme: String },

    #[error("bad user info in AMQP URI: {user_info}")]
    BadUserInfo { user_info: String },

    #[error("multiple segments in vhost path: {path}")]
    MultiSegmentVhost { path: String },

    #[error("failed to percent-decode '{input}': {reason}")]
    Decode { input: String, reason: String },

    #[error("failed to parse connection string: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors raised while assembling a ticket payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "conflicting selection for event {event_id}, outcome {id}: \
         same key with different odds, boosted odds or banker flag"
    )]
    ConflictingSelection { event_id: String, id: String },
}

/// Errors from the request/response correlation layer.
#[derive(Error, Debug)]
pub enum CorrelationError {
    #[error("correlation id '{correlation_id}' is already pending")]
    DuplicateCorrelation { correlation_id: String },

    #[error("no response for correlation id '{correlation_id}' within {timeout:?}")]
    ResponseTimeout {
        correlation_id: String,
        timeout: Duration,
    },

    #[error("failed to publish request '{correlation_id}': {reason}")]
    Publish {
        correlation_id: String,
        reason: String,
    },
}

/// Top-level error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
