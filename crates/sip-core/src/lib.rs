//! # minisip-sip-core
//!
//! Strongly typed SIP message model used by the minisip dialog driver.
//!
//! Every header the dialog layer reads or writes (Via, From, To, Contact,
//! CSeq, Call-ID, Content-Length) is a distinct structured value with named
//! parameters, so reading a To tag or a Via branch is a plain method call.
//! Messages are composed and inspected here; turning them into bytes on a
//! wire is the job of whatever transport sits underneath.
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let to = To::new(Address::new_with_display_name("Bob", Uri::sip("bob", "biloxi.com")))
//!     .with_tag("a6c85cf");
//! let response = Response::new(StatusCode::OK).with_header(TypedHeader::To(to));
//!
//! assert_eq!(response.to().and_then(|t| t.tag()), Some("a6c85cf"));
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        Address, CSeq, CallId, Contact, ContentLength, From, HeaderAccess, HeaderName, Method, Param,
        Request, Response, Scheme, SentProtocol, StatusCode, To, Transport, TypedHeader, Uri, Version,
        Via, ViaHeader, BRANCH_MAGIC_COOKIE,
    };
}
