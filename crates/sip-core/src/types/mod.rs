//! SIP value types: methods, status codes, URIs, parameters, headers and messages

pub mod address;
pub mod call_id;
pub mod contact;
pub mod cseq;
pub mod from;
pub mod headers;
pub mod method;
pub mod param;
pub mod sip_request;
pub mod sip_response;
pub mod status;
pub mod to;
pub mod uri;
pub mod version;
pub mod via;

pub use address::Address;
pub use call_id::{CallId, ContentLength};
pub use contact::Contact;
pub use cseq::CSeq;
pub use from::From;
pub use headers::{HeaderAccess, HeaderName, TypedHeader};
pub use method::Method;
pub use param::Param;
pub use sip_request::Request;
pub use sip_response::Response;
pub use status::StatusCode;
pub use to::To;
pub use uri::{Scheme, Transport, Uri};
pub use version::Version;
pub use via::{SentProtocol, Via, ViaHeader, BRANCH_MAGIC_COOKIE};
