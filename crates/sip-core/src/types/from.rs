//! # SIP From Header
//!
//! The initiator of a request
//! ([RFC 3261 Section 20.20](https://datatracker.ietf.org/doc/html/rfc3261#section-20.20)).
//! A dialog-initiating UAC always puts its own `tag` here.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::address::Address;

/// The From header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct From(pub Address);

impl From {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> &Address {
        &self.0
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.tag()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.0.set_tag(tag);
        self
    }
}

impl Deref for From {
    type Target = Address;

    fn deref(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for From {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
