//! # SIP Parameters
//!
//! Header and URI parameters as defined in
//! [RFC 3261](https://datatracker.ietf.org/doc/html/rfc3261). The parameters the
//! dialog layer reads (`branch`, `tag`, `transport`) are distinct variants, so
//! no caller has to inspect a generic value to find them.
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! assert_eq!(Param::tag("1928301774").to_string(), "tag=1928301774");
//! assert_eq!(Param::Other("x-custom".into(), Some("abc".into())).to_string(), "x-custom=abc");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `;name[=value]` parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Via `branch` (transaction identifier)
    Branch(String),
    /// From/To `tag` (dialog leg identifier)
    Tag(String),
    /// URI `transport`
    Transport(String),
    /// Any other parameter, with an optional value
    Other(String, Option<String>),
}

impl Param {
    pub fn branch(value: impl Into<String>) -> Self {
        Param::Branch(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Param::Tag(value.into())
    }

    pub fn transport(value: impl Into<String>) -> Self {
        Param::Transport(value.into())
    }

    /// Parameter name as it appears on the wire
    pub fn name(&self) -> &str {
        match self {
            Param::Branch(_) => "branch",
            Param::Tag(_) => "tag",
            Param::Transport(_) => "transport",
            Param::Other(name, _) => name.as_str(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Branch(value) | Param::Tag(value) | Param::Transport(value) => {
                write!(f, "{}={}", self.name(), value)
            }
            Param::Other(name, Some(value)) => write!(f, "{}={}", name, value),
            Param::Other(name, None) => f.write_str(name),
        }
    }
}

/// Find the `tag` value in a parameter list
pub(crate) fn find_tag(params: &[Param]) -> Option<&str> {
    params.iter().find_map(|p| match p {
        Param::Tag(tag) => Some(tag.as_str()),
        _ => None,
    })
}

/// Replace (or append) the `tag` value in a parameter list
pub(crate) fn set_tag(params: &mut Vec<Param>, tag: impl Into<String>) {
    let tag = tag.into();
    match params.iter_mut().find(|p| matches!(p, Param::Tag(_))) {
        Some(existing) => *existing = Param::Tag(tag),
        None => params.push(Param::Tag(tag)),
    }
}
