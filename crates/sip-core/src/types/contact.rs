//! # SIP Contact Header
//!
//! Where the sender can be reached for subsequent in-dialog requests
//! ([RFC 3261 Section 20.10](https://datatracker.ietf.org/doc/html/rfc3261#section-20.10)).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::address::Address;

/// A single-address Contact header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact(pub Address);

impl Contact {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
