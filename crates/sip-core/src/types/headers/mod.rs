//! Header collection and typed accessors shared by requests and responses

pub mod header_name;
pub mod typed_header;

pub use header_name::HeaderName;
pub use typed_header::TypedHeader;

use crate::types::call_id::CallId;
use crate::types::contact::Contact;
use crate::types::cseq::CSeq;
use crate::types::from::From;
use crate::types::to::To;
use crate::types::via::Via;

/// Read and write access to a message's header list
///
/// Headers keep their insertion order. Lookups by name return the first
/// match, which for Via is the topmost hop.
pub trait HeaderAccess {
    fn headers(&self) -> &[TypedHeader];

    fn headers_mut(&mut self) -> &mut Vec<TypedHeader>;

    /// First header with the given name
    fn header(&self, name: &HeaderName) -> Option<&TypedHeader> {
        self.headers().iter().find(|h| &h.name() == name)
    }

    /// All headers with the given name, in order
    fn headers_named<'a>(&'a self, name: &'a HeaderName) -> Box<dyn Iterator<Item = &'a TypedHeader> + 'a> {
        Box::new(self.headers().iter().filter(move |h| &h.name() == name))
    }

    fn has_header(&self, name: &HeaderName) -> bool {
        self.header(name).is_some()
    }

    /// Replace every header with this header's name by `header`
    fn set_header(&mut self, header: TypedHeader) {
        let name = header.name();
        let headers = self.headers_mut();
        match headers.iter().position(|h| h.name() == name) {
            Some(pos) => {
                headers[pos] = header;
                let mut index = 0;
                headers.retain(|h| {
                    let keep = index <= pos || h.name() != name;
                    index += 1;
                    keep
                });
            }
            None => headers.push(header),
        }
    }

    fn via(&self) -> Option<&Via> {
        match self.header(&HeaderName::Via) {
            Some(TypedHeader::Via(via)) => Some(via),
            _ => None,
        }
    }

    fn from(&self) -> Option<&From> {
        match self.header(&HeaderName::From) {
            Some(TypedHeader::From(from)) => Some(from),
            _ => None,
        }
    }

    fn to(&self) -> Option<&To> {
        match self.header(&HeaderName::To) {
            Some(TypedHeader::To(to)) => Some(to),
            _ => None,
        }
    }

    fn contact(&self) -> Option<&Contact> {
        match self.header(&HeaderName::Contact) {
            Some(TypedHeader::Contact(contact)) => Some(contact),
            _ => None,
        }
    }

    fn cseq(&self) -> Option<&CSeq> {
        match self.header(&HeaderName::CSeq) {
            Some(TypedHeader::CSeq(cseq)) => Some(cseq),
            _ => None,
        }
    }

    fn call_id(&self) -> Option<&CallId> {
        match self.header(&HeaderName::CallId) {
            Some(TypedHeader::CallId(call_id)) => Some(call_id),
            _ => None,
        }
    }
}
