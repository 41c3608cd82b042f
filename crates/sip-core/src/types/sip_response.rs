//! # SIP Response Message
//!
//! A status line, typed headers and a body. A UAS builds its response by
//! echoing the correlation headers of the request with
//! [`Response::copy_headers_from`].
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let request = Request::new(Method::Options, Uri::sip("bob", "biloxi.com"))
//!     .with_header(TypedHeader::CallId(CallId::new("1234@host")));
//!
//! let mut response = Response::new(StatusCode::OK);
//! response.copy_headers_from(&request, &HeaderName::CallId);
//! assert_eq!(response.call_id(), request.call_id());
//! assert_eq!(response.reason, "OK");
//! ```

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::headers::{HeaderAccess, HeaderName, TypedHeader};
use crate::types::status::StatusCode;
use crate::types::version::Version;

/// A SIP response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Vec<TypedHeader>,
    pub body: Bytes,
}

impl Response {
    /// Response with the default reason phrase for `status`
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: Version::sip_2_0(),
            status,
            reason: status.reason_phrase().to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_header(mut self, header: TypedHeader) -> Self {
        self.headers.push(header);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// Append every `name` header of `source`, unchanged and in order
    pub fn copy_headers_from<M: HeaderAccess>(&mut self, source: &M, name: &HeaderName) {
        let copied: Vec<TypedHeader> = source.headers_named(name).cloned().collect();
        self.headers.extend(copied);
    }

    /// One-line summary for logs
    pub fn short(&self) -> String {
        let call_id = self.call_id().map(|c| c.value()).unwrap_or("-");
        match self.cseq() {
            Some(cseq) => format!("{} {} (Call-ID: {}, CSeq: {})", self.status_code(), self.reason, call_id, cseq),
            None => format!("{} {} (Call-ID: {})", self.status_code(), self.reason, call_id),
        }
    }
}

impl HeaderAccess for Response {
    fn headers(&self) -> &[TypedHeader] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader> {
        &mut self.headers
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.version, self.status_code(), self.reason)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        f.write_str("\r\n")?;
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::address::Address;
    use crate::types::method::Method;
    use crate::types::param::Param;
    use crate::types::sip_request::Request;
    use crate::types::to::To;
    use crate::types::uri::{Transport, Uri};
    use crate::types::via::Via;

    #[test]
    fn test_copy_headers_preserves_every_hop() {
        let request = Request::new(Method::Invite, Uri::sip("bob", "biloxi.com"))
            .with_header(TypedHeader::Via(Via::new("SIP", "2.0", Transport::Udp, "proxy", None, vec![Param::branch("z9hG4bK1")])))
            .with_header(TypedHeader::Via(Via::new("SIP", "2.0", Transport::Udp, "client", None, vec![Param::branch("z9hG4bK2")])));

        let mut response = Response::new(StatusCode::OK);
        response.copy_headers_from(&request, &HeaderName::Via);

        let branches: Vec<_> = response
            .headers_named(&HeaderName::Via)
            .filter_map(|h| match h {
                TypedHeader::Via(via) => via.branch(),
                _ => None,
            })
            .collect();
        assert_eq!(branches, vec!["z9hG4bK1", "z9hG4bK2"]);
    }

    #[test]
    fn test_to_tag_is_readable_without_inspection() {
        let response = Response::new(StatusCode::RINGING)
            .with_header(TypedHeader::To(To::new(Address::new(Uri::sip("bob", "biloxi.com"))).with_tag("abc123")));
        assert_eq!(response.to().and_then(|to| to.tag()), Some("abc123"));
        assert_eq!(response.short(), "180 Ringing (Call-ID: -)");
    }

    #[test]
    fn test_custom_reason_and_serde() {
        let response = Response::new(StatusCode::BUSY_HERE).with_reason("Busy");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("486"));
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
