//! # Header Builder
//!
//! Pure functions turning endpoint identities and dialog values into typed
//! headers. Nothing here keeps state; every input is passed in.
//!
//! ```rust
//! use minisip_dialog_core::config::Identity;
//! use minisip_dialog_core::headers;
//!
//! let alice = Identity::new("Alice", "alice", "127.0.0.1", 5060);
//! let via = headers::via(&alice, "z9hG4bK-INVITE-1");
//! assert_eq!(via.to_string(), "SIP/2.0/UDP 127.0.0.1:5060;branch=z9hG4bK-INVITE-1");
//!
//! let from = headers::from(&alice, "1a2b3c4d");
//! assert_eq!(from.tag(), Some("1a2b3c4d"));
//! ```

use minisip_sip_core::{Address, CSeq, CallId, Contact, ContentLength, Method, Param, To, Via};

use crate::config::Identity;

fn address(identity: &Identity, uri_with_transport: bool) -> Address {
    let uri = if uri_with_transport {
        identity.uri_with_transport()
    } else {
        identity.uri()
    };
    Address::new_with_display_name(identity.display_name.clone(), uri)
}

/// `SIP/2.0/<transport> host:port;branch=<branch>`
pub fn via(identity: &Identity, branch: &str) -> Via {
    Via::new(
        "SIP",
        "2.0",
        identity.transport,
        identity.host.clone(),
        Some(identity.port),
        vec![Param::branch(branch)],
    )
}

/// To header addressed at `peer`, tagged only when `tag` is non-empty
pub fn to(peer: &Identity, tag: &str) -> To {
    let to = To::new(address(peer, false));
    if tag.is_empty() { to } else { to.with_tag(tag) }
}

/// From header for `identity`, with a `transport` URI parameter and the tag.
///
/// Every From carries the sender's tag, so `tag` must not be empty.
pub fn from(identity: &Identity, tag: &str) -> minisip_sip_core::From {
    debug_assert!(!tag.is_empty(), "From header needs a tag");
    minisip_sip_core::From::new(address(identity, true)).with_tag(tag)
}

pub fn contact(identity: &Identity) -> Contact {
    Contact::new(address(identity, false))
}

pub fn cseq(seq: u32, method: Method) -> CSeq {
    CSeq::new(seq, method)
}

pub fn call_id(id: &str) -> CallId {
    CallId::new(id)
}

pub fn content_length(length: u32) -> ContentLength {
    ContentLength::new(length)
}
