//! # SIP CSeq Header
//!
//! Sequence number plus method
//! ([RFC 3261 Section 20.16](https://datatracker.ietf.org/doc/html/rfc3261#section-20.16)).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::method::Method;

/// The CSeq header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CSeq {
    pub seq: u32,
    pub method: Method,
}

impl CSeq {
    pub fn new(seq: u32, method: Method) -> Self {
        Self { seq, method }
    }

    pub fn sequence(&self) -> u32 {
        self.seq
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

impl fmt::Display for CSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.seq, self.method)
    }
}
