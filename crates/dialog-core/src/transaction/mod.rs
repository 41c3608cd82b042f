//! # Transaction layer seam
//!
//! The dialog driver never touches sockets, timers or retransmissions. It
//! talks to a transaction layer through the traits in this module:
//!
//! ```text
//! TransactionLayer::bind(transport, local_addr)      -> TransactionManager
//! TransactionManager::send(request, destination)     -> ClientTransaction
//! TransactionManager::next_request()                 -> ServerTransaction
//!
//! ClientTransaction::next_event()  -> Response | Error | Closed
//! ClientTransaction::ack(request)
//! ServerTransaction::respond(response)
//! ServerTransaction::wait_ack()    -> ACK request
//! ```
//!
//! [`loopback`] provides an in-process implementation that connects
//! managers by `host:port` without any network I/O.

pub mod error;
pub mod key;
pub mod loopback;

use async_trait::async_trait;

use minisip_sip_core::{Request, Response, Transport};

pub use error::{Result, TransactionError};
pub use key::TransactionKey;
pub use loopback::{LoopbackClientTransaction, LoopbackManager, LoopbackNetwork, LoopbackServerTransaction, LoopbackSettings, TraceEntry, TracedMessage};

/// Something that happened on a client transaction
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A provisional or final response
    Response(Response),
    /// The transaction failed
    Error(TransactionError),
    /// The event stream ended
    Closed,
}

/// Outbound transaction created by [`TransactionManager::send`]
#[async_trait]
pub trait ClientTransaction: Send {
    fn key(&self) -> &TransactionKey;

    /// The request that opened this transaction
    fn origin(&self) -> &Request;

    /// Wait for the next response or error
    async fn next_event(&mut self) -> ClientEvent;

    /// Send the ACK for a 2xx answer to the INVITE that opened this transaction
    async fn ack(&mut self, request: Request) -> Result<()>;
}

/// Inbound transaction handed out by [`TransactionManager::next_request`]
#[async_trait]
pub trait ServerTransaction: Send {
    fn key(&self) -> &TransactionKey;

    /// The request that opened this transaction
    fn origin(&self) -> &Request;

    async fn respond(&mut self, response: Response) -> Result<()>;

    /// Wait for the ACK to a final response on an INVITE transaction
    async fn wait_ack(&mut self) -> Result<Request>;
}

/// Transaction manager bound to one local address
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Client: ClientTransaction;
    type Server: ServerTransaction;

    /// `host:port` this manager listens on
    fn local_addr(&self) -> &str;

    /// Start a client transaction for `request` towards `destination` (`host:port`)
    async fn send(&self, request: Request, destination: &str) -> Result<Self::Client>;

    /// Next inbound request, or `None` once the request stream has closed
    async fn next_request(&mut self) -> Option<Self::Server>;
}

/// Factory for transaction managers
#[async_trait]
pub trait TransactionLayer: Send + Sync {
    type Manager: TransactionManager;

    async fn bind(&self, transport: Transport, local_addr: &str) -> Result<Self::Manager>;
}
