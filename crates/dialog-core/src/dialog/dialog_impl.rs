//! The dialog record owned by an endpoint
//!
//! A [`Dialog`] holds the identifiers that tie the requests and responses
//! of one call together. It starts empty, is filled when the caller sends
//! an INVITE ([`Dialog::begin`]) or the callee receives the first request
//! ([`Dialog::adopt_call_id`]), and is emptied again by [`Dialog::reset`].
//!
//! The mutators keep the identifier invariants: the Call-ID and the From
//! tag never change inside a dialog, the To tag is written at most once,
//! and the local CSeq only ever grows by one per request.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use minisip_sip_core::Method;

use super::dialog_state::DialogState;
use crate::transaction::TransactionKey;

/// The transaction a dialog currently has in flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Assigned once the transaction layer accepted the request
    pub key: Option<TransactionKey>,
    pub branch: String,
    pub method: Method,
    pub cseq: u32,
}

impl TransactionInfo {
    pub fn new(branch: impl Into<String>, method: Method, cseq: u32) -> Self {
        Self {
            key: None,
            branch: branch.into(),
            method,
            cseq,
        }
    }
}

/// State of the single call an endpoint is part of
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Empty while no dialog exists
    pub call_id: String,
    /// Tag of the party that sent the first request
    pub from_tag: String,
    /// Tag of the answering party; empty until learned
    pub to_tag: String,
    /// Sequence number the next locally originated request will carry
    pub cseq: u32,
    /// Last CSeq seen on an inbound request
    pub remote_cseq: Option<u32>,
    pub current_transaction: Option<TransactionInfo>,
    pub state: DialogState,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// No call recorded
    pub fn is_empty(&self) -> bool {
        self.call_id.is_empty()
    }

    /// Forget everything about the current call
    pub fn reset(&mut self) {
        if !self.is_empty() {
            debug!("Clearing dialog {}", self.call_id);
        }
        *self = Self::default();
    }

    /// Start a new dialog as the caller
    pub fn begin(&mut self, call_id: impl Into<String>, from_tag: impl Into<String>, initial_cseq: u32) {
        *self = Self {
            call_id: call_id.into(),
            from_tag: from_tag.into(),
            cseq: initial_cseq,
            ..Self::default()
        };
        debug!("Dialog {} started with CSeq {}", self.call_id, self.cseq);
    }

    /// Take over the Call-ID of an inbound request.
    ///
    /// A Call-ID other than the recorded one starts a fresh dialog; returns
    /// whether that happened.
    pub fn adopt_call_id(&mut self, call_id: &str) -> bool {
        if self.call_id == call_id {
            return false;
        }
        self.reset();
        self.call_id = call_id.to_string();
        debug!("Dialog {} adopted from inbound request", self.call_id);
        true
    }

    /// Record the From tag of an inbound dialog; kept once set
    pub fn adopt_from_tag(&mut self, tag: &str) {
        if self.from_tag.is_empty() {
            self.from_tag = tag.to_string();
        }
    }

    /// Record the peer's To tag unless one is already known.
    ///
    /// Returns `true` when the tag was stored.
    pub fn learn_to_tag(&mut self, tag: &str) -> bool {
        if tag.is_empty() {
            return false;
        }
        if self.to_tag.is_empty() {
            self.to_tag = tag.to_string();
            debug!("Dialog {} learned To tag {}", self.call_id, self.to_tag);
            return true;
        }
        if self.to_tag != tag {
            debug!(
                "Dialog {} ignores To tag {}, keeping {}",
                self.call_id, tag, self.to_tag
            );
        }
        false
    }

    /// Hand out the current CSeq for a new request and move past it
    pub fn advance_cseq(&mut self) -> u32 {
        let seq = self.cseq;
        self.cseq += 1;
        seq
    }

    /// Record the CSeq of an inbound request.
    ///
    /// Returns `false` if it does not exceed the last one seen, which is
    /// logged but tolerated.
    pub fn observe_remote_cseq(&mut self, seq: u32) -> bool {
        let increasing = self.remote_cseq.map_or(true, |last| seq > last);
        if !increasing {
            warn!(
                "Dialog {}: inbound CSeq {} does not exceed {:?}",
                self.call_id, seq, self.remote_cseq
            );
        }
        self.remote_cseq = Some(self.remote_cseq.map_or(seq, |last| last.max(seq)));
        increasing
    }

    pub fn set_current_transaction(&mut self, info: TransactionInfo) {
        self.current_transaction = Some(info);
    }

    /// Attach the transaction layer's key to the in-flight transaction
    pub fn bind_transaction_key(&mut self, key: TransactionKey) {
        if let Some(info) = self.current_transaction.as_mut() {
            info.key = Some(key);
        }
    }

    pub fn current_transaction(&self) -> Option<&TransactionInfo> {
        self.current_transaction.as_ref()
    }

    pub fn mark_early(&mut self) {
        if self.state == DialogState::Initial {
            self.set_state(DialogState::Early);
        }
    }

    pub fn confirm(&mut self) {
        self.set_state(DialogState::Confirmed);
    }

    pub fn terminate(&mut self) {
        self.set_state(DialogState::Terminated);
    }

    fn set_state(&mut self, state: DialogState) {
        if self.state != state {
            debug!("Dialog {} {} -> {}", self.call_id, self.state, state);
            self.state = state;
        }
    }
}
