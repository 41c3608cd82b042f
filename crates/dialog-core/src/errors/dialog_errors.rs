use thiserror::Error;

use minisip_sip_core::Response;

use crate::transaction::error::TransactionError;

/// Result type for dialog operations
pub type DialogResult<T> = Result<T, DialogError>;

/// Errors returned by the dialog driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    /// The transaction layer reported a failure (unreachable peer, timeout, ...)
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// The peer answered with a final status of 300 or above
    #[error("Peer sent negative response code {status} ({reason})")]
    NegativeResponse { status: u16, reason: String },

    /// A message or call sequence violated the dialog protocol
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// A new call was requested while another dialog is still recorded
    #[error("Dialog {call_id} is still in progress")]
    DialogInProgress { call_id: String },

    /// An in-dialog request was requested with no dialog established
    #[error("No dialog established")]
    NoDialog,

    /// The endpoint has not been bound to a transaction layer
    #[error("Endpoint not started")]
    NotStarted,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl DialogError {
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::ProtocolError { message: message.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Error for a final response of 300 or above
    pub fn negative_response(response: &Response) -> Self {
        Self::NegativeResponse {
            status: response.status_code(),
            reason: response.reason_phrase().to_string(),
        }
    }

    /// Status code carried by a negative response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NegativeResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transaction-layer failure carried by this error
    pub fn transaction_error(&self) -> Option<&TransactionError> {
        match self {
            Self::Transaction(err) => Some(err),
            _ => None,
        }
    }
}
