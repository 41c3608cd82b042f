//! # In-process transaction layer
//!
//! [`LoopbackNetwork`] connects transaction managers living in the same
//! process. Each manager is bound to a `host:port` key; a request sent to
//! that key is handed to the bound manager as a server transaction, and the
//! responses it produces flow back over a tokio channel to the client
//! transaction that sent it.
//!
//! The network applies the transaction timeout of RFC 3261 (64·T1): a client
//! transaction without a final response (Timer B/F) and a server INVITE
//! transaction without an ACK (Timer H) both end in
//! [`TransactionError::Timeout`]. Retransmissions are not modelled since no
//! message is ever lost.
//!
//! Every request, response and ACK is appended to a trace that tests and the
//! CLI inspect after a call.
//!
//! ```rust
//! use minisip_dialog_core::transaction::{LoopbackNetwork, TransactionLayer};
//! use minisip_sip_core::Transport;
//!
//! # tokio_test::block_on(async {
//! let network = LoopbackNetwork::new();
//! let _manager = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
//! assert!(network.bind(Transport::Udp, "127.0.0.1:5060").await.is_err());
//! # });
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, warn};

use minisip_sip_core::{HeaderAccess, Method, Request, Response, Transport};

use super::error::{Result, TransactionError};
use super::key::TransactionKey;
use super::{ClientEvent, ClientTransaction, ServerTransaction, TransactionLayer, TransactionManager};
use crate::config::duration_ms;

/// 64 * T1 (500 ms)
const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_millis(64 * 500);

fn default_transaction_timeout() -> Duration {
    DEFAULT_TRANSACTION_TIMEOUT
}

const DEFAULT_TRACE_CAPACITY: usize = 4096;

fn default_trace_capacity() -> usize {
    DEFAULT_TRACE_CAPACITY
}

/// Settings for a [`LoopbackNetwork`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackSettings {
    /// Timer B/F/H bound
    #[serde(rename = "transaction_timeout_ms", with = "duration_ms", default = "default_transaction_timeout")]
    pub transaction_timeout: Duration,

    /// Most recent messages kept in the trace; older ones are dropped
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
}

impl Default for LoopbackSettings {
    fn default() -> Self {
        Self {
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            trace_capacity: DEFAULT_TRACE_CAPACITY,
        }
    }
}

impl LoopbackSettings {
    pub fn with_transaction_timeout(mut self, transaction_timeout: Duration) -> Self {
        self.transaction_timeout = transaction_timeout;
        self
    }

    pub fn with_trace_capacity(mut self, trace_capacity: usize) -> Self {
        self.trace_capacity = trace_capacity;
        self
    }
}

/// A message as it crossed the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum TracedMessage {
    Request(Request),
    Response(Response),
}

/// One entry of the network's message trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub destination: String,
    pub message: TracedMessage,
}

impl TraceEntry {
    pub fn request(&self) -> Option<&Request> {
        match &self.message {
            TracedMessage::Request(request) => Some(request),
            TracedMessage::Response(_) => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match &self.message {
            TracedMessage::Response(response) => Some(response),
            TracedMessage::Request(_) => None,
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = match &self.message {
            TracedMessage::Request(request) => request.short(),
            TracedMessage::Response(response) => response.short(),
        };
        write!(
            f,
            "{} {} -> {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.source,
            self.destination,
            summary
        )
    }
}

#[derive(Debug)]
struct Listener {
    id: u64,
    transport: Transport,
    requests: mpsc::UnboundedSender<LoopbackServerTransaction>,
}

#[derive(Debug)]
struct NetworkInner {
    settings: LoopbackSettings,
    listeners: DashMap<String, Listener>,
    trace: Mutex<VecDeque<TraceEntry>>,
    next_listener_id: AtomicU64,
}

/// In-process network of transaction managers keyed by `host:port`
#[derive(Debug, Clone)]
pub struct LoopbackNetwork {
    inner: Arc<NetworkInner>,
}

impl Default for LoopbackNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::with_settings(LoopbackSettings::default())
    }

    pub fn with_settings(settings: LoopbackSettings) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                settings,
                listeners: DashMap::new(),
                trace: Mutex::new(VecDeque::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &LoopbackSettings {
        &self.inner.settings
    }

    /// Whether a manager is currently bound to `addr`
    pub fn is_bound(&self, addr: &str) -> bool {
        self.inner.listeners.contains_key(addr)
    }

    /// Drop the binding for `addr`, closing that manager's request stream.
    ///
    /// Returns `false` when nothing was bound there.
    pub fn unbind(&self, addr: &str) -> bool {
        let removed = self.inner.listeners.remove(addr).is_some();
        if removed {
            debug!("Unbound loopback manager at {}", addr);
        }
        removed
    }

    /// Snapshot of the retained messages, oldest first.
    ///
    /// At most `trace_capacity` entries are kept, so a long-running
    /// network only remembers its most recent traffic.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.inner.trace.lock().iter().cloned().collect()
    }

    pub fn trace_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.inner.trace.lock())
    }

    /// Requests of the given method, in the order they were sent
    pub fn requests(&self, method: &Method) -> Vec<Request> {
        self.inner
            .trace
            .lock()
            .iter()
            .filter_map(TraceEntry::request)
            .filter(|request| &request.method == method)
            .cloned()
            .collect()
    }

    /// Responses whose CSeq names the given method, in the order they were sent
    pub fn responses(&self, method: &Method) -> Vec<Response> {
        self.inner
            .trace
            .lock()
            .iter()
            .filter_map(TraceEntry::response)
            .filter(|response| response.cseq().map(|c| c.method() == method).unwrap_or(false))
            .cloned()
            .collect()
    }

    fn record(&self, source: &str, destination: &str, message: TracedMessage) {
        let capacity = self.inner.settings.trace_capacity;
        if capacity == 0 {
            return;
        }
        let mut trace = self.inner.trace.lock();
        while trace.len() >= capacity {
            trace.pop_front();
        }
        trace.push_back(TraceEntry {
            timestamp: Utc::now(),
            source: source.to_string(),
            destination: destination.to_string(),
            message,
        });
    }
}

#[async_trait]
impl TransactionLayer for LoopbackNetwork {
    type Manager = LoopbackManager;

    async fn bind(&self, transport: Transport, local_addr: &str) -> Result<LoopbackManager> {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);

        match self.inner.listeners.entry(local_addr.to_string()) {
            Entry::Occupied(_) => {
                return Err(TransactionError::AddressInUse {
                    address: local_addr.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(Listener {
                    id,
                    transport,
                    requests: requests_tx,
                });
            }
        }

        debug!("Loopback manager bound at {} ({})", local_addr, transport);
        Ok(LoopbackManager {
            network: self.clone(),
            local_addr: local_addr.to_string(),
            transport,
            listener_id: id,
            requests: requests_rx,
        })
    }
}

/// Transaction manager bound to one address of a [`LoopbackNetwork`]
#[derive(Debug)]
pub struct LoopbackManager {
    network: LoopbackNetwork,
    local_addr: String,
    transport: Transport,
    listener_id: u64,
    requests: mpsc::UnboundedReceiver<LoopbackServerTransaction>,
}

impl Drop for LoopbackManager {
    fn drop(&mut self) {
        let id = self.listener_id;
        self.network
            .inner
            .listeners
            .remove_if(self.local_addr.as_str(), |_, listener| listener.id == id);
    }
}

#[async_trait]
impl TransactionManager for LoopbackManager {
    type Client = LoopbackClientTransaction;
    type Server = LoopbackServerTransaction;

    fn local_addr(&self) -> &str {
        &self.local_addr
    }

    async fn send(&self, request: Request, destination: &str) -> Result<LoopbackClientTransaction> {
        let branch = request
            .branch()
            .ok_or_else(|| TransactionError::transport("request has no Via branch"))?
            .to_string();
        let key = TransactionKey::new(branch, request.method.clone(), false);
        let transaction_timeout = self.network.settings().transaction_timeout;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (acks_tx, acks_rx) = if request.method == Method::Invite {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        self.network
            .record(&self.local_addr, destination, TracedMessage::Request(request.clone()));

        let server = LoopbackServerTransaction {
            key: key.counterpart(),
            origin: request.clone(),
            network: self.network.clone(),
            local_addr: destination.to_string(),
            remote_addr: self.local_addr.clone(),
            responses: events_tx.clone(),
            acks: acks_rx,
            ack_timeout: transaction_timeout,
        };

        let delivered = match self.network.inner.listeners.get(destination) {
            Some(listener) if listener.transport == self.transport => listener.requests.send(server).is_ok(),
            _ => false,
        };
        if !delivered {
            warn!("No {} listener at {}, transaction {} fails", self.transport, destination, key);
            let _ = events_tx.send(ClientEvent::Error(TransactionError::unreachable(destination)));
        }
        drop(events_tx);

        Ok(LoopbackClientTransaction {
            key,
            origin: request,
            network: self.network.clone(),
            local_addr: self.local_addr.clone(),
            destination: destination.to_string(),
            events: events_rx,
            acks: acks_tx,
            deadline: Instant::now() + transaction_timeout,
            final_received: false,
        })
    }

    async fn next_request(&mut self) -> Option<LoopbackServerTransaction> {
        self.requests.recv().await
    }
}

/// Client side of a loopback transaction
#[derive(Debug)]
pub struct LoopbackClientTransaction {
    key: TransactionKey,
    origin: Request,
    network: LoopbackNetwork,
    local_addr: String,
    destination: String,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    acks: Option<mpsc::UnboundedSender<Request>>,
    deadline: Instant,
    final_received: bool,
}

#[async_trait]
impl ClientTransaction for LoopbackClientTransaction {
    fn key(&self) -> &TransactionKey {
        &self.key
    }

    fn origin(&self) -> &Request {
        &self.origin
    }

    async fn next_event(&mut self) -> ClientEvent {
        let received = if self.final_received {
            self.events.recv().await
        } else {
            match timeout_at(self.deadline, self.events.recv()).await {
                Ok(event) => event,
                Err(_) => {
                    warn!("Transaction {} got no final response in time", self.key);
                    return ClientEvent::Error(TransactionError::Timeout { key: self.key.clone() });
                }
            }
        };

        match received {
            Some(ClientEvent::Response(response)) => {
                if response.status().is_final() {
                    self.final_received = true;
                }
                ClientEvent::Response(response)
            }
            Some(other) => other,
            None => ClientEvent::Closed,
        }
    }

    async fn ack(&mut self, request: Request) -> Result<()> {
        if request.method != Method::Ack {
            return Err(TransactionError::transport(format!("expected ACK, got {}", request.method)));
        }
        let Some(acks) = &self.acks else {
            return Err(TransactionError::transport(format!(
                "ACK is only sent on INVITE transactions, not {}",
                self.key.method
            )));
        };

        self.network
            .record(&self.local_addr, &self.destination, TracedMessage::Request(request.clone()));
        if acks.send(request).is_err() {
            // The 2xx ACK is end-to-end; a peer that stopped listening just never sees it.
            debug!("Peer of {} no longer waits for the ACK", self.key);
        }
        Ok(())
    }
}

/// Server side of a loopback transaction
#[derive(Debug)]
pub struct LoopbackServerTransaction {
    key: TransactionKey,
    origin: Request,
    network: LoopbackNetwork,
    local_addr: String,
    remote_addr: String,
    responses: mpsc::UnboundedSender<ClientEvent>,
    acks: Option<mpsc::UnboundedReceiver<Request>>,
    ack_timeout: Duration,
}

impl LoopbackServerTransaction {
    /// Address of the manager that sent the request
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }
}

#[async_trait]
impl ServerTransaction for LoopbackServerTransaction {
    fn key(&self) -> &TransactionKey {
        &self.key
    }

    fn origin(&self) -> &Request {
        &self.origin
    }

    async fn respond(&mut self, response: Response) -> Result<()> {
        self.network
            .record(&self.local_addr, &self.remote_addr, TracedMessage::Response(response.clone()));
        self.responses
            .send(ClientEvent::Response(response))
            .map_err(|_| TransactionError::Closed)
    }

    async fn wait_ack(&mut self) -> Result<Request> {
        let Some(acks) = self.acks.as_mut() else {
            return Err(TransactionError::transport(format!(
                "no ACK is expected on a {} transaction",
                self.key.method
            )));
        };

        match timeout(self.ack_timeout, acks.recv()).await {
            Ok(Some(ack)) => Ok(ack),
            Ok(None) => Err(TransactionError::Closed),
            Err(_) => {
                warn!("Transaction {} got no ACK in time", self.key);
                Err(TransactionError::Timeout { key: self.key.clone() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minisip_sip_core::prelude::*;

    fn request(method: Method, branch: &str) -> Request {
        Request::new(method.clone(), Uri::sip("bob", "127.0.0.1").with_port(5070))
            .with_header(TypedHeader::Via(Via::new("SIP", "2.0", Transport::Udp, "127.0.0.1", Some(5060), vec![Param::branch(branch)])))
            .with_header(TypedHeader::CallId(CallId::new("loopback-test")))
            .with_header(TypedHeader::CSeq(CSeq::new(1, method)))
    }

    #[tokio::test]
    async fn test_bind_rejects_taken_address() {
        let network = LoopbackNetwork::new();
        let _first = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();

        let err = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap_err();
        assert!(matches!(err, TransactionError::AddressInUse { .. }));
    }

    #[tokio::test]
    async fn test_drop_releases_address() {
        let network = LoopbackNetwork::new();
        let manager = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        drop(manager);
        assert!(!network.is_bound("127.0.0.1:5060"));
        assert!(network.bind(Transport::Udp, "127.0.0.1:5060").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_destination_is_unreachable() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();

        let mut tx = alice.send(request(Method::Options, "z9hG4bK-o1"), "127.0.0.1:9999").await.unwrap();
        match tx.next_event().await {
            ClientEvent::Error(TransactionError::Unreachable { destination }) => {
                assert_eq!(destination, "127.0.0.1:9999");
            }
            other => panic!("expected unreachable, got {:?}", other),
        }
        assert_eq!(tx.next_event().await, ClientEvent::Closed);
    }

    #[tokio::test]
    async fn test_transport_mismatch_is_unreachable() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Tcp, "127.0.0.1:5060").await.unwrap();
        let _bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut tx = alice.send(request(Method::Options, "z9hG4bK-o2"), "127.0.0.1:5070").await.unwrap();
        assert!(matches!(tx.next_event().await, ClientEvent::Error(TransactionError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_request_without_branch_is_rejected() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let bare = Request::new(Method::Options, Uri::sip("bob", "127.0.0.1"));

        let err = alice.send(bare, "127.0.0.1:5070").await.unwrap_err();
        assert!(matches!(err, TransactionError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_invite_round_trip_with_ack() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut client = alice.send(request(Method::Invite, "z9hG4bK-i1"), "127.0.0.1:5070").await.unwrap();
        let mut server = bob.next_request().await.unwrap();
        assert!(server.key().is_server);
        assert_eq!(server.key().branch(), client.key().branch());
        assert_eq!(server.remote_addr(), "127.0.0.1:5060");

        server.respond(Response::new(StatusCode::RINGING)).await.unwrap();
        server.respond(Response::new(StatusCode::OK)).await.unwrap();

        match client.next_event().await {
            ClientEvent::Response(r) => assert_eq!(r.status(), StatusCode::RINGING),
            other => panic!("unexpected {:?}", other),
        }
        match client.next_event().await {
            ClientEvent::Response(r) => assert_eq!(r.status(), StatusCode::OK),
            other => panic!("unexpected {:?}", other),
        }

        client.ack(request(Method::Ack, "z9hG4bK-i1")).await.unwrap();
        let ack = server.wait_ack().await.unwrap();
        assert_eq!(ack.method, Method::Ack);

        let trace = network.trace();
        assert_eq!(trace.len(), 4);
        assert_eq!(network.requests(&Method::Ack).len(), 1);
        assert_eq!(network.responses(&Method::Invite).len(), 0); // responses above carry no CSeq
        assert!(network.trace_json().unwrap().contains("\"kind\": \"request\""));
    }

    #[tokio::test]
    async fn test_trace_keeps_most_recent_messages() {
        let network = LoopbackNetwork::with_settings(LoopbackSettings::default().with_trace_capacity(2));
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut client = alice.send(request(Method::Invite, "z9hG4bK-c1"), "127.0.0.1:5070").await.unwrap();
        let mut server = bob.next_request().await.unwrap();
        server.respond(Response::new(StatusCode::RINGING)).await.unwrap();
        server.respond(Response::new(StatusCode::OK)).await.unwrap();
        client.ack(request(Method::Ack, "z9hG4bK-c1")).await.unwrap();

        let trace = network.trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].response().map(|r| r.status()), Some(StatusCode::OK));
        assert_eq!(trace[1].request().map(|r| r.method.clone()), Some(Method::Ack));
        assert!(network.requests(&Method::Invite).is_empty());

        let silent = LoopbackNetwork::with_settings(LoopbackSettings::default().with_trace_capacity(0));
        let carol = silent.bind(Transport::Udp, "127.0.0.1:5080").await.unwrap();
        let _ = carol.send(request(Method::Options, "z9hG4bK-c2"), "127.0.0.1:5090").await.unwrap();
        assert!(silent.trace().is_empty());
    }

    #[tokio::test]
    async fn test_ack_rejected_on_non_invite() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut client = alice.send(request(Method::Bye, "z9hG4bK-b1"), "127.0.0.1:5070").await.unwrap();
        let mut server = bob.next_request().await.unwrap();

        assert!(client.ack(request(Method::Ack, "z9hG4bK-b1")).await.is_err());
        assert!(server.wait_ack().await.is_err());
    }

    #[tokio::test]
    async fn test_client_times_out_without_final_response() {
        let settings = LoopbackSettings::default().with_transaction_timeout(Duration::from_millis(50));
        let network = LoopbackNetwork::with_settings(settings);
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut client = alice.send(request(Method::Invite, "z9hG4bK-t1"), "127.0.0.1:5070").await.unwrap();
        let mut server = bob.next_request().await.unwrap();
        server.respond(Response::new(StatusCode::TRYING)).await.unwrap();

        assert!(matches!(client.next_event().await, ClientEvent::Response(_)));
        match client.next_event().await {
            ClientEvent::Error(TransactionError::Timeout { key }) => assert_eq!(&key, client.key()),
            other => panic!("expected timeout, got {:?}", other),
        }

        // Timer H on the server side
        assert!(matches!(server.wait_ack().await, Err(TransactionError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_dropped_server_closes_client_stream() {
        let network = LoopbackNetwork::new();
        let alice = network.bind(Transport::Udp, "127.0.0.1:5060").await.unwrap();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        let mut client = alice.send(request(Method::Options, "z9hG4bK-d1"), "127.0.0.1:5070").await.unwrap();
        drop(bob.next_request().await.unwrap());

        assert_eq!(client.next_event().await, ClientEvent::Closed);
    }

    #[tokio::test]
    async fn test_unbind_closes_request_stream() {
        let network = LoopbackNetwork::new();
        let mut bob = network.bind(Transport::Udp, "127.0.0.1:5070").await.unwrap();

        assert!(network.unbind("127.0.0.1:5070"));
        assert!(!network.unbind("127.0.0.1:5070"));
        assert!(bob.next_request().await.is_none());
    }

    #[test]
    fn test_settings_from_json() {
        let settings: LoopbackSettings = serde_json::from_str(r#"{"transaction_timeout_ms": 250}"#).unwrap();
        assert_eq!(settings.transaction_timeout, Duration::from_millis(250));

        let defaults: LoopbackSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, LoopbackSettings::default());

        let bounded: LoopbackSettings = serde_json::from_str(r#"{"trace_capacity": 8}"#).unwrap();
        assert_eq!(bounded.trace_capacity, 8);
    }
}
