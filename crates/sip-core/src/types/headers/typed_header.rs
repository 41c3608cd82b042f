use std::fmt;

use serde::{Deserialize, Serialize};

use super::header_name::HeaderName;
use crate::types::call_id::{CallId, ContentLength};
use crate::types::contact::Contact;
use crate::types::cseq::CSeq;
use crate::types::from::From;
use crate::types::to::To;
use crate::types::via::Via;

/// A header with a structured value
///
/// Each kind the dialog layer reads or writes is its own variant; anything
/// else is carried as [`TypedHeader::Other`] with its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypedHeader {
    Via(Via),
    From(From),
    To(To),
    Contact(Contact),
    CSeq(CSeq),
    CallId(CallId),
    ContentLength(ContentLength),
    /// Represents an extension header
    Other(HeaderName, String),
}

impl TypedHeader {
    /// Returns the name of the header
    pub fn name(&self) -> HeaderName {
        match self {
            TypedHeader::Via(_) => HeaderName::Via,
            TypedHeader::From(_) => HeaderName::From,
            TypedHeader::To(_) => HeaderName::To,
            TypedHeader::Contact(_) => HeaderName::Contact,
            TypedHeader::CSeq(_) => HeaderName::CSeq,
            TypedHeader::CallId(_) => HeaderName::CallId,
            TypedHeader::ContentLength(_) => HeaderName::ContentLength,
            TypedHeader::Other(name, _) => name.clone(),
        }
    }
}

impl fmt::Display for TypedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedHeader::Via(via) => write!(f, "{}: {}", HeaderName::Via, via),
            TypedHeader::From(from) => write!(f, "{}: {}", HeaderName::From, from),
            TypedHeader::To(to) => write!(f, "{}: {}", HeaderName::To, to),
            TypedHeader::Contact(contact) => write!(f, "{}: {}", HeaderName::Contact, contact),
            TypedHeader::CSeq(cseq) => write!(f, "{}: {}", HeaderName::CSeq, cseq),
            TypedHeader::CallId(call_id) => write!(f, "{}: {}", HeaderName::CallId, call_id),
            TypedHeader::ContentLength(length) => write!(f, "{}: {}", HeaderName::ContentLength, length),
            TypedHeader::Other(name, value) => write!(f, "{}: {}", name, value),
        }
    }
}
