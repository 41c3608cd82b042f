//! Errors raised by the transaction layer

use thiserror::Error;

use super::key::TransactionKey;

/// Result type for transaction-layer operations
pub type Result<T> = std::result::Result<T, TransactionError>;

/// Transport or transaction failure, surfaced to the dialog layer unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Nothing is listening at the destination
    #[error("Destination {destination} is unreachable")]
    Unreachable { destination: String },

    /// No final response (client) or ACK (server) within the transaction timeout
    #[error("Transaction {key} timed out")]
    Timeout { key: TransactionKey },

    /// The transaction ended before the expected message arrived
    #[error("Transaction closed")]
    Closed,

    /// Another manager is already bound to this address
    #[error("Address {address} already in use")]
    AddressInUse { address: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl TransactionError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn unreachable(destination: impl Into<String>) -> Self {
        Self::Unreachable { destination: destination.into() }
    }
}
