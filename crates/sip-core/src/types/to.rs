//! # SIP To Header
//!
//! The logical recipient of a request
//! ([RFC 3261 Section 20.39](https://datatracker.ietf.org/doc/html/rfc3261#section-20.39)).
//! The UAS adds a `tag` to it when answering; the UAC learns the dialog's
//! remote tag from here.
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let mut to = To::new(Address::new(Uri::sip("bob", "biloxi.com")));
//! assert_eq!(to.tag(), None);
//! to = to.with_tag("a6c85cf");
//! assert_eq!(to.tag(), Some("a6c85cf"));
//! ```

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::address::Address;

/// The To header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct To(pub Address);

impl To {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> &Address {
        &self.0
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.tag()
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.0.set_tag(tag);
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(tag);
        self
    }
}

impl Deref for To {
    type Target = Address;

    fn deref(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for To {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
