//! # minisip-dialog-core
//!
//! A minimal SIP user-agent dialog driver: it sets up, keeps and tears down
//! a single call between a caller (UAC) and a callee (UAS) by correlating
//! requests with their responses.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Endpoint                   │
//! │  invite / bye / send_request │ accept / serve│
//! ├──────────────────────────────┼───────────────┤
//! │       UAC Transaction Driver │ UAS Responder │
//! ├──────────────────────────────┴───────────────┤
//! │        Dialog State  +  Header Builder       │
//! ├──────────────────────────────────────────────┤
//! │  TransactionManager / Client- & Server-      │
//! │  Transaction traits (LoopbackNetwork impl)   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! - [`headers`]: builds Via, To, From, Contact, CSeq, Call-ID and
//!   Content-Length from an identity and dialog values
//! - [`dialog`]: the per-call record (Call-ID, tags, CSeq, in-flight
//!   transaction, lifecycle state) and identifier generation
//! - [`protocol`]: the UAC driver and UAS responder
//! - [`endpoint`]: the user-facing [`Endpoint`]
//! - [`transaction`]: the transaction-layer seam and an in-process
//!   implementation
//!
//! Sockets, retransmission timers and wire encoding live below the
//! [`transaction::TransactionManager`] seam and are not part of this crate.

pub mod config;
pub mod dialog;
pub mod endpoint;
pub mod errors;
pub mod headers;
pub mod protocol;
pub mod transaction;

pub use config::{EndpointConfig, Identity};
pub use dialog::{Dialog, DialogState, TransactionInfo};
pub use endpoint::Endpoint;
pub use errors::{DialogError, DialogResult};
pub use protocol::{CompletedTransaction, UacState};
pub use transaction::{
    ClientEvent, ClientTransaction, LoopbackManager, LoopbackNetwork, LoopbackSettings, ServerTransaction,
    TransactionError, TransactionKey, TransactionLayer, TransactionManager,
};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{EndpointConfig, Identity};
    pub use crate::dialog::{Dialog, DialogState, TransactionInfo};
    pub use crate::endpoint::Endpoint;
    pub use crate::errors::{DialogError, DialogResult};
    pub use crate::protocol::{CompletedTransaction, UacState};
    pub use crate::transaction::{
        ClientEvent, ClientTransaction, LoopbackManager, LoopbackNetwork, LoopbackSettings, ServerTransaction,
        TraceEntry, TracedMessage, TransactionError, TransactionKey, TransactionLayer, TransactionManager,
    };
}
