//! Error types for the gateway.

use crate::transport::sanitize_reqwest_error;
use thiserror::Error;

/// Main error type for the gateway.
///
/// Every failure mode of a tool invocation maps onto exactly one variant.
/// Nothing propagates past the dispatcher as anything else; the serving
/// layer renders any of these as a single `"Error: ..."` line.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors (unreadable/malformed TLS material, invalid base URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// Arguments that fail a tool's declared parameter contract
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Dispatch requested for a name absent from the catalog
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Network failure, TLS handshake failure, or timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status from the partner, with status and body captured
    #[error("partner error: {0}")]
    Partner(String),

    /// Success status with an undecodable response body
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(sanitize_reqwest_error(&value))
        } else {
            Self::Transport(sanitize_reqwest_error(&value))
        }
    }
}
