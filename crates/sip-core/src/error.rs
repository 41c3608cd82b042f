//! Error types for the SIP message model

use thiserror::Error;

/// Result type alias for sip-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while constructing SIP values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Method token is empty or contains characters not allowed in a token
    #[error("Invalid method: {0:?}")]
    InvalidMethod(String),

    /// Status code outside the 100-699 range
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    /// Transport name other than UDP or TCP
    #[error("Invalid transport: {0:?}")]
    InvalidTransport(String),
}
