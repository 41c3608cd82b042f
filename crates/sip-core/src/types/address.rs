//! # SIP Name-Address
//!
//! The `[display-name] <uri>;params` form shared by From, To and Contact
//! ([RFC 3261 Section 20.10](https://datatracker.ietf.org/doc/html/rfc3261#section-20.10)).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::param::{self, Param};
use super::uri::Uri;

/// A name-addr with header parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub display_name: Option<String>,
    pub uri: Uri,
    pub params: Vec<Param>,
}

impl Address {
    pub fn new(uri: Uri) -> Self {
        Self {
            display_name: None,
            uri,
            params: Vec::new(),
        }
    }

    pub fn new_with_display_name(display_name: impl Into<String>, uri: Uri) -> Self {
        let display_name = display_name.into();
        Self {
            display_name: (!display_name.is_empty()).then_some(display_name),
            uri,
            params: Vec::new(),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The `tag` parameter, if present
    pub fn tag(&self) -> Option<&str> {
        param::find_tag(&self.params)
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        param::set_tag(&mut self.params, tag);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.display_name {
            write!(f, "\"{}\" ", name.replace('"', "\\\""))?;
        }
        write!(f, "<{}>", self.uri)?;
        for param in &self.params {
            write!(f, ";{}", param)?;
        }
        Ok(())
    }
}
