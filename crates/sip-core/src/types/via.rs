//! # SIP Via Header
//!
//! Implementation of the Via header as defined in
//! [RFC 3261 Section 20.42](https://datatracker.ietf.org/doc/html/rfc3261#section-20.42).
//!
//! The Via header records the path a request has taken so responses can be
//! routed back, and its `branch` parameter identifies the transaction.
//!
//! ```text
//! Via: SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds
//! ```
//!
//! ## Examples
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let via = Via::new("SIP", "2.0", Transport::Udp, "pc33.atlanta.com", Some(5060),
//!     vec![Param::branch("z9hG4bK776asdhds")]);
//! assert_eq!(via.branch(), Some("z9hG4bK776asdhds"));
//! assert_eq!(via.to_string(), "SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::param::Param;
use super::uri::Transport;

/// Magic cookie that starts every RFC 3261 branch value
pub const BRANCH_MAGIC_COOKIE: &str = "z9hG4bK";

/// `SIP/2.0/UDP` style protocol triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentProtocol {
    pub name: String,
    pub version: String,
    pub transport: Transport,
}

/// One hop of a Via header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaHeader {
    pub sent_protocol: SentProtocol,
    pub sent_by_host: String,
    pub sent_by_port: Option<u16>,
    pub params: Vec<Param>,
}

impl ViaHeader {
    pub fn branch(&self) -> Option<&str> {
        self.params.iter().find_map(|p| match p {
            Param::Branch(val) => Some(val.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for ViaHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}",
            self.sent_protocol.name, self.sent_protocol.version, self.sent_protocol.transport, self.sent_by_host
        )?;
        if let Some(port) = self.sent_by_port {
            write!(f, ":{}", port)?;
        }
        for param in &self.params {
            write!(f, ";{}", param)?;
        }
        Ok(())
    }
}

/// The Via header: one or more hops, topmost first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via(pub Vec<ViaHeader>);

impl Via {
    /// Create a single-hop Via header
    pub fn new(
        protocol_name: impl Into<String>,
        protocol_version: impl Into<String>,
        transport: Transport,
        host: impl Into<String>,
        port: Option<u16>,
        params: Vec<Param>,
    ) -> Self {
        Self(vec![ViaHeader {
            sent_protocol: SentProtocol {
                name: protocol_name.into(),
                version: protocol_version.into(),
                transport,
            },
            sent_by_host: host.into(),
            sent_by_port: port,
            params,
        }])
    }

    pub fn headers(&self) -> &[ViaHeader] {
        &self.0
    }

    /// Branch of the topmost hop
    pub fn branch(&self) -> Option<&str> {
        self.0.first().and_then(ViaHeader::branch)
    }
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            hop.fmt(f)?;
        }
        Ok(())
    }
}
