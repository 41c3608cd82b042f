//! UAC Transaction Driver
//!
//! Drives one outbound transaction from request to final outcome according
//! to RFC 3261 Section 13.2 (INVITE) and Section 8.1 (other methods).
//!
//! ## Per-transaction state machine
//!
//! ```text
//!        ┌──── 1xx ────┐
//!        ▼             │
//! Sent ──1xx──▶ ProvisionalReceived ──2xx──▶ Success   (ACK if INVITE)
//!   │                  │
//!   ├──────── ≥300 ────┴──────────────────▶ Failure   (no ACK)
//!   └──── error / stream closed ──────────▶ Errored
//! ```
//!
//! Every response, provisional or final, can teach the dialog its To tag;
//! the first non-empty tag wins and is never replaced.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use minisip_sip_core::{CSeq, HeaderAccess, Method, Request, Response, TypedHeader};

use crate::config::{EndpointConfig, Identity};
use crate::dialog::{Dialog, TransactionInfo, generate_branch, generate_call_id, generate_tag, to_tag};
use crate::errors::{DialogError, DialogResult};
use crate::headers;
use crate::transaction::{ClientEvent, ClientTransaction, TransactionError, TransactionManager};

/// Progress of one client transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UacState {
    /// Request handed to the transaction layer
    Sent,
    /// At least one 1xx seen
    ProvisionalReceived,
    /// 2xx received
    Success,
    /// Final response of 300 or above
    Failure,
    /// Transaction-layer error or closed event stream
    Errored,
}

impl UacState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UacState::Success | UacState::Failure | UacState::Errored)
    }
}

impl fmt::Display for UacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Builds and sends requests of one endpoint's dialog
pub struct UacDriver<'a, M: TransactionManager> {
    manager: &'a M,
    config: &'a EndpointConfig,
    dialog: &'a mut Dialog,
}

impl<'a, M: TransactionManager> UacDriver<'a, M> {
    pub fn new(manager: &'a M, config: &'a EndpointConfig, dialog: &'a mut Dialog) -> Self {
        Self { manager, config, dialog }
    }

    /// Start a new call to `peer`.
    ///
    /// Fails with [`DialogError::DialogInProgress`] if a dialog is already
    /// recorded. On a 2xx the ACK has been sent when this returns.
    pub async fn send_invite(&mut self, peer: &Identity) -> DialogResult<Response> {
        if !self.dialog.is_empty() {
            return Err(DialogError::DialogInProgress {
                call_id: self.dialog.call_id.clone(),
            });
        }

        let identity = &self.config.identity;
        self.dialog
            .begin(generate_call_id(&identity.host), generate_tag(), self.config.initial_cseq);

        let request = self.prepare(peer, Method::Invite);
        self.execute(request, peer).await
    }

    /// Send `method` inside the existing dialog
    pub async fn send_non_invite(&mut self, peer: &Identity, method: Method) -> DialogResult<Response> {
        if matches!(method, Method::Invite | Method::Ack) {
            return Err(DialogError::protocol_error(format!(
                "{} cannot be sent as a non-INVITE request",
                method
            )));
        }
        if self.dialog.is_empty() {
            return Err(DialogError::NoDialog);
        }
        if self.dialog.from_tag.is_empty() {
            return Err(DialogError::protocol_error(format!(
                "dialog {} has no From tag to send {} with",
                self.dialog.call_id, method
            )));
        }
        if !self.dialog.state.is_established() {
            debug!("Sending {} in dialog {} while it is {}", method, self.dialog.call_id, self.dialog.state);
        }

        let request = self.prepare(peer, method);
        self.execute(request, peer).await
    }

    /// Fresh branch, next CSeq, and the request built from the dialog
    fn prepare(&mut self, peer: &Identity, method: Method) -> Request {
        let branch = generate_branch(&method);
        let seq = self.dialog.advance_cseq();
        self.dialog
            .set_current_transaction(TransactionInfo::new(branch.clone(), method.clone(), seq));
        build_request(&self.config.identity, peer, self.dialog, method, &branch, seq)
    }

    async fn execute(&mut self, request: Request, peer: &Identity) -> DialogResult<Response> {
        let destination = peer.address();
        info!("Sending: {}", request.short());

        let mut transaction = self.manager.send(request, &destination).await?;
        self.dialog.bind_transaction_key(transaction.key().clone());

        drive_transaction(&mut transaction, self.dialog, self.config.ack_delay).await
    }
}

/// Request of `method` from `identity` to `peer` carrying the dialog's identifiers
pub fn build_request(
    identity: &Identity,
    peer: &Identity,
    dialog: &Dialog,
    method: Method,
    branch: &str,
    seq: u32,
) -> Request {
    Request::new(method.clone(), peer.uri())
        .with_header(TypedHeader::Via(headers::via(identity, branch)))
        .with_header(TypedHeader::To(headers::to(peer, &dialog.to_tag)))
        .with_header(TypedHeader::From(headers::from(identity, &dialog.from_tag)))
        .with_header(TypedHeader::Contact(headers::contact(identity)))
        .with_header(TypedHeader::CSeq(headers::cseq(seq, method)))
        .with_header(TypedHeader::CallId(headers::call_id(&dialog.call_id)))
        .with_header(TypedHeader::ContentLength(headers::content_length(0)))
}

/// ACK for a 2xx to `invite`: same Via branch and CSeq number, method ACK,
/// and the learned To tag.
pub fn build_ack(invite: &Request, to_tag: &str) -> Request {
    let mut ack = Request::new(Method::Ack, invite.uri.clone());
    ack.version = invite.version;
    ack.headers = invite.headers.clone();
    if let Some(cseq) = invite.cseq() {
        ack.set_header(TypedHeader::CSeq(CSeq::new(cseq.sequence(), Method::Ack)));
    }
    if let Some(to) = invite.to().filter(|_| !to_tag.is_empty()) {
        ack.set_header(TypedHeader::To(to.clone().with_tag(to_tag)));
    }
    ack
}

/// Wait for the outcome of `transaction`, updating `dialog` on the way.
///
/// Returns the final 2xx response, or the error that ended the
/// transaction. For INVITE the ACK is sent `ack_delay` after the 2xx.
pub async fn drive_transaction<C: ClientTransaction>(
    transaction: &mut C,
    dialog: &mut Dialog,
    ack_delay: Duration,
) -> DialogResult<Response> {
    let method = transaction.origin().method.clone();
    let mut state = UacState::Sent;

    loop {
        let response = match transaction.next_event().await {
            ClientEvent::Response(response) => response,
            ClientEvent::Error(err) => {
                warn!("{} transaction {} failed: {}", method, transaction.key(), err);
                advance(&mut state, UacState::Errored, transaction.key());
                return Err(err.into());
            }
            ClientEvent::Closed => {
                warn!("{} transaction {} closed without a final response", method, transaction.key());
                advance(&mut state, UacState::Errored, transaction.key());
                return Err(TransactionError::Closed.into());
            }
        };

        debug!("Received: {}", response.short());
        learn_to_tag(dialog, &response, &method);

        let status = response.status();
        if status.is_failure() {
            advance(&mut state, UacState::Failure, transaction.key());
            if method == Method::Invite {
                dialog.terminate();
            }
            info!("{} rejected with {}", method, status);
            return Err(DialogError::negative_response(&response));
        }

        if status.is_success() {
            advance(&mut state, UacState::Success, transaction.key());
            if method.requires_ack() {
                if !ack_delay.is_zero() {
                    tokio::time::sleep(ack_delay).await;
                }
                let ack = build_ack(transaction.origin(), &dialog.to_tag);
                info!("Sending ACK for {}", transaction.key());
                transaction.ack(ack).await?;
                dialog.confirm();
                info!("Call {} established", dialog.call_id);
            } else if method == Method::Bye {
                dialog.terminate();
                info!("Call {} terminated", dialog.call_id);
            } else {
                info!("Successful {} transaction", method);
            }
            return Ok(response);
        }

        advance(&mut state, UacState::ProvisionalReceived, transaction.key());
    }
}

fn learn_to_tag(dialog: &mut Dialog, response: &Response, method: &Method) {
    if response.to().is_none() {
        debug!("Response {} has no To header, no tag to learn", response.short());
        return;
    }
    if let Some(tag) = to_tag(response) {
        if dialog.learn_to_tag(tag) && *method == Method::Invite && response.status().is_provisional() {
            dialog.mark_early();
        }
    }
}

fn advance(state: &mut UacState, next: UacState, key: &impl fmt::Display) {
    if *state != next {
        debug!("Transaction {}: {} -> {}", key, state, next);
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use minisip_sip_core::prelude::*;

    use super::*;
    use crate::dialog::DialogState;
    use crate::transaction::{Result as TxResult, TransactionKey};

    /// Client transaction replaying a fixed list of events
    struct ScriptedClient {
        key: TransactionKey,
        origin: Request,
        events: VecDeque<ClientEvent>,
        acks: Vec<Request>,
    }

    impl ScriptedClient {
        fn new(origin: Request, events: Vec<ClientEvent>) -> Self {
            let key = TransactionKey::new(
                origin.branch().unwrap_or_default().to_string(),
                origin.method.clone(),
                false,
            );
            Self {
                key,
                origin,
                events: events.into(),
                acks: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ClientTransaction for ScriptedClient {
        fn key(&self) -> &TransactionKey {
            &self.key
        }

        fn origin(&self) -> &Request {
            &self.origin
        }

        async fn next_event(&mut self) -> ClientEvent {
            self.events.pop_front().unwrap_or(ClientEvent::Closed)
        }

        async fn ack(&mut self, request: Request) -> TxResult<()> {
            self.acks.push(request);
            Ok(())
        }
    }

    fn alice() -> Identity {
        Identity::new("Alice", "alice", "127.0.0.1", 5060)
    }

    fn bob() -> Identity {
        Identity::new("Bob", "bob", "127.0.0.1", 5070)
    }

    fn invite_dialog() -> (Dialog, Request) {
        let mut dialog = Dialog::new();
        dialog.begin("call-1@127.0.0.1", "a1b2c3d4", 1);
        let seq = dialog.advance_cseq();
        let request = build_request(&alice(), &bob(), &dialog, Method::Invite, "z9hG4bK-INVITE-1", seq);
        (dialog, request)
    }

    fn response(status: StatusCode, tag: Option<&str>) -> ClientEvent {
        let mut to = headers::to(&bob(), "");
        if let Some(tag) = tag {
            to.set_tag(tag);
        }
        ClientEvent::Response(
            Response::new(status)
                .with_header(TypedHeader::To(to))
                .with_header(TypedHeader::CSeq(CSeq::new(1, Method::Invite))),
        )
    }

    #[test]
    fn test_request_carries_dialog_identifiers() {
        let (dialog, request) = invite_dialog();

        assert_eq!(request.uri.to_string(), "sip:bob@127.0.0.1:5070");
        assert_eq!(request.branch(), Some("z9hG4bK-INVITE-1"));
        assert_eq!(request.from().and_then(|f| f.tag()), Some("a1b2c3d4"));
        assert_eq!(request.to().and_then(|t| t.tag()), None);
        assert_eq!(request.cseq(), Some(&CSeq::new(1, Method::Invite)));
        assert_eq!(request.call_id().map(|c| c.value()), Some(dialog.call_id.as_str()));
        assert!(request.has_header(&HeaderName::Contact));
        assert!(request.has_header(&HeaderName::ContentLength));
        assert_eq!(dialog.cseq, 2);
    }

    #[test]
    fn test_ack_mirrors_invite() {
        let (_, invite) = invite_dialog();
        let ack = build_ack(&invite, "abc123");

        assert_eq!(ack.method, Method::Ack);
        assert_eq!(ack.uri, invite.uri);
        assert_eq!(ack.branch(), invite.branch());
        assert_eq!(ack.cseq(), Some(&CSeq::new(1, Method::Ack)));
        assert_eq!(ack.to().and_then(|t| t.tag()), Some("abc123"));
        assert_eq!(ack.from(), invite.from());
        assert_eq!(ack.call_id(), invite.call_id());
    }

    #[tokio::test]
    async fn test_success_learns_tag_and_acks_once() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(
            invite,
            vec![
                response(StatusCode::TRYING, None),
                response(StatusCode::OK, Some("abc123")),
            ],
        );

        let final_response = drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();

        assert_eq!(final_response.status(), StatusCode::OK);
        assert_eq!(dialog.to_tag, "abc123");
        assert_eq!(dialog.state, DialogState::Confirmed);
        assert_eq!(client.acks.len(), 1);
        assert_eq!(client.acks[0].to().and_then(|t| t.tag()), Some("abc123"));
    }

    #[tokio::test]
    async fn test_first_tag_wins() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(
            invite,
            vec![
                response(StatusCode::RINGING, Some("early1")),
                response(StatusCode::OK, Some("final2")),
            ],
        );

        drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();
        assert_eq!(dialog.to_tag, "early1");
        assert_eq!(client.acks[0].to().and_then(|t| t.tag()), Some("early1"));
    }

    #[tokio::test]
    async fn test_provisional_tag_marks_dialog_early() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(invite, vec![response(StatusCode::RINGING, Some("t1"))]);

        let err = drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap_err();
        assert_eq!(err, DialogError::Transaction(TransactionError::Closed));
        assert_eq!(dialog.state, DialogState::Early);
        assert_eq!(dialog.to_tag, "t1");
        assert!(client.acks.is_empty());
    }

    #[tokio::test]
    async fn test_failure_sends_no_ack() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(invite, vec![response(StatusCode::BUSY_HERE, Some("busy"))]);

        let err = drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap_err();
        assert_eq!(err.status_code(), Some(486));
        assert!(client.acks.is_empty());
        assert_eq!(dialog.state, DialogState::Terminated);
        assert_eq!(dialog.call_id, "call-1@127.0.0.1");
    }

    #[tokio::test]
    async fn test_transaction_error_is_surfaced() {
        let (mut dialog, invite) = invite_dialog();
        let unreachable = TransactionError::unreachable("127.0.0.1:5070");
        let mut client = ScriptedClient::new(invite, vec![ClientEvent::Error(unreachable.clone())]);

        let err = drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap_err();
        assert_eq!(err, DialogError::Transaction(unreachable));
        assert!(client.acks.is_empty());
    }

    #[tokio::test]
    async fn test_missing_to_header_is_tolerated() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(invite, vec![ClientEvent::Response(Response::new(StatusCode::OK))]);

        drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();
        assert!(dialog.to_tag.is_empty());
        assert_eq!(client.acks.len(), 1);
        assert_eq!(client.acks[0].to().and_then(|t| t.tag()), None);
    }

    #[tokio::test]
    async fn test_bye_success_terminates_without_ack() {
        let mut dialog = Dialog::new();
        dialog.begin("call-1", "f", 5);
        dialog.learn_to_tag("abc123");
        dialog.confirm();
        let seq = dialog.advance_cseq();
        let bye = build_request(&alice(), &bob(), &dialog, Method::Bye, "z9hG4bK-BYE-1", seq);
        assert_eq!(bye.to().and_then(|t| t.tag()), Some("abc123"));

        let mut client = ScriptedClient::new(bye, vec![response(StatusCode::OK, Some("abc123"))]);
        drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();

        assert!(client.acks.is_empty());
        assert_eq!(dialog.state, DialogState::Terminated);
    }

    #[tokio::test]
    async fn test_in_dialog_success_keeps_state_without_ack() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(invite, vec![response(StatusCode::OK, Some("abc123"))]);
        drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();
        assert!(dialog.state.is_established());

        let seq = dialog.advance_cseq();
        let info = build_request(&alice(), &bob(), &dialog, Method::Info, "z9hG4bK-INFO-1", seq);
        let mut client = ScriptedClient::new(info, vec![response(StatusCode::OK, Some("abc123"))]);
        drive_transaction(&mut client, &mut dialog, Duration::ZERO).await.unwrap();

        assert!(client.acks.is_empty());
        assert_eq!(dialog.state, DialogState::Confirmed);
        assert!(dialog.state.is_established());
    }

    #[tokio::test]
    async fn test_request_needs_from_tag() {
        use crate::transaction::{LoopbackNetwork, TransactionLayer};

        let network = LoopbackNetwork::new();
        let manager = network.bind(Transport::Udp, &alice().address()).await.unwrap();
        let config = EndpointConfig::new(alice());
        let mut dialog = Dialog::new();
        dialog.begin("call-1", "", 1);

        let err = UacDriver::new(&manager, &config, &mut dialog)
            .send_non_invite(&bob(), Method::Bye)
            .await
            .unwrap_err();
        assert!(matches!(err, DialogError::ProtocolError { .. }));
        assert_eq!(dialog.cseq, 1);
        assert!(network.trace().is_empty());
    }

    #[test]
    fn test_ack_keeps_header_order() {
        let (_, invite) = invite_dialog();
        let ack = build_ack(&invite, "abc123");
        let names: Vec<_> = ack.headers.iter().map(|h| h.name()).collect();
        let expected: Vec<_> = invite.headers.iter().map(|h| h.name()).collect();
        assert_eq!(names, expected);

        let untagged = build_ack(&invite, "");
        assert_eq!(untagged.to(), invite.to());
    }

    #[tokio::test]
    async fn test_ack_waits_for_delay() {
        let (mut dialog, invite) = invite_dialog();
        let mut client = ScriptedClient::new(invite, vec![response(StatusCode::OK, Some("x"))]);

        let started = tokio::time::Instant::now();
        drive_transaction(&mut client, &mut dialog, Duration::from_millis(30)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(client.acks.len(), 1);
    }

    #[test]
    fn test_uac_state_terminality() {
        assert!(!UacState::Sent.is_terminal());
        assert!(!UacState::ProvisionalReceived.is_terminal());
        assert!(UacState::Success.is_terminal());
        assert!(UacState::Failure.is_terminal());
        assert!(UacState::Errored.is_terminal());
        assert_eq!(UacState::ProvisionalReceived.to_string(), "ProvisionalReceived");
    }
}
