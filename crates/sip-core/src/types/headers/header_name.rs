use std::fmt;

use serde::{Deserialize, Serialize};

/// SIP header names known to the message model
///
/// ```rust
/// use minisip_sip_core::prelude::*;
///
/// assert_eq!(HeaderName::CallId.as_str(), "Call-ID");
/// assert_eq!(HeaderName::Other("X-Trace".into()).as_str(), "X-Trace");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderName {
    /// Via: Path taken by the request so far
    Via,
    /// From: Initiator of the request
    From,
    /// To: Logical recipient of the request
    To,
    /// Contact: Where subsequent requests should be sent
    Contact,
    /// CSeq: Command sequence number
    CSeq,
    /// Call-ID: Unique identifier for this call
    CallId,
    /// Content-Length: Size of the message body
    ContentLength,
    /// Extension header
    Other(String),
}

impl HeaderName {
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::Via => "Via",
            HeaderName::From => "From",
            HeaderName::To => "To",
            HeaderName::Contact => "Contact",
            HeaderName::CSeq => "CSeq",
            HeaderName::CallId => "Call-ID",
            HeaderName::ContentLength => "Content-Length",
            HeaderName::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
