//! # SIP Request Message
//!
//! A request line (method, request URI, version), typed headers and a body.
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let request = Request::new(Method::Invite, Uri::sip("bob", "biloxi.com"))
//!     .with_header(TypedHeader::CallId(CallId::new("a84b4c76e66710@pc33.atlanta.com")))
//!     .with_header(TypedHeader::CSeq(CSeq::new(314159, Method::Invite)));
//!
//! assert_eq!(request.call_id().unwrap().value(), "a84b4c76e66710@pc33.atlanta.com");
//! assert_eq!(request.cseq().unwrap().sequence(), 314159);
//! ```

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::headers::{HeaderAccess, TypedHeader};
use crate::types::method::Method;
use crate::types::uri::Uri;
use crate::types::version::Version;

/// A SIP request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The method of the request
    pub method: Method,
    /// The request URI
    pub uri: Uri,
    /// The SIP version
    pub version: Version,
    /// The headers of the request
    pub headers: Vec<TypedHeader>,
    /// The body of the request
    pub body: Bytes,
}

impl Request {
    /// SIP/2.0 request with no headers and an empty body
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::sip_2_0(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, header: TypedHeader) -> Self {
        self.headers.push(header);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Top Via branch, the transaction identifier
    pub fn branch(&self) -> Option<&str> {
        self.via().and_then(|via| via.branch())
    }

    /// One-line summary for logs
    pub fn short(&self) -> String {
        let call_id = self.call_id().map(|c| c.value()).unwrap_or("-");
        match self.cseq() {
            Some(cseq) => format!("{} {} (Call-ID: {}, CSeq: {})", self.method, self.uri, call_id, cseq),
            None => format!("{} {} (Call-ID: {})", self.method, self.uri, call_id),
        }
    }
}

impl HeaderAccess for Request {
    fn headers(&self) -> &[TypedHeader] {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader> {
        &mut self.headers
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.uri, self.version)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        f.write_str("\r\n")?;
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}
