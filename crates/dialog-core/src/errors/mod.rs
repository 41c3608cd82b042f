//! Error types for dialog-core
//!
//! [`DialogError`] is what every endpoint operation returns. Failures raised
//! by the transaction layer are carried unchanged inside
//! [`DialogError::Transaction`].

pub mod dialog_errors;

pub use dialog_errors::{DialogError, DialogResult};
pub use crate::transaction::error::TransactionError;
