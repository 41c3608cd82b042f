//! # SIP Methods
//!
//! The request methods a user agent can originate or answer, as listed in
//! [RFC 3261 Section 7.1](https://datatracker.ietf.org/doc/html/rfc3261#section-7.1)
//! and the common extensions. Unknown tokens are kept as [`Method::Extension`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A SIP request method
///
/// # Examples
///
/// ```rust
/// use minisip_sip_core::prelude::*;
/// use std::str::FromStr;
///
/// assert_eq!(Method::from_str("INVITE").unwrap(), Method::Invite);
/// assert_eq!(Method::Bye.to_string(), "BYE");
/// assert_eq!(Method::from_str("PUBLISH").unwrap(), Method::Extension("PUBLISH".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Invite,
    Ack,
    Bye,
    Cancel,
    Options,
    Register,
    Info,
    Message,
    Update,
    Notify,
    Subscribe,
    Refer,
    Prack,
    /// Any other token
    Extension(String),
}

impl Method {
    /// Canonical upper-case token for this method
    pub fn as_str(&self) -> &str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Options => "OPTIONS",
            Method::Register => "REGISTER",
            Method::Info => "INFO",
            Method::Message => "MESSAGE",
            Method::Update => "UPDATE",
            Method::Notify => "NOTIFY",
            Method::Subscribe => "SUBSCRIBE",
            Method::Refer => "REFER",
            Method::Prack => "PRACK",
            Method::Extension(token) => token.as_str(),
        }
    }

    /// Whether a 2xx to this method has to be acknowledged by the UAC
    pub fn requires_ack(&self) -> bool {
        matches!(self, Method::Invite)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let method = match s {
            "INVITE" => Method::Invite,
            "ACK" => Method::Ack,
            "BYE" => Method::Bye,
            "CANCEL" => Method::Cancel,
            "OPTIONS" => Method::Options,
            "REGISTER" => Method::Register,
            "INFO" => Method::Info,
            "MESSAGE" => Method::Message,
            "UPDATE" => Method::Update,
            "NOTIFY" => Method::Notify,
            "SUBSCRIBE" => Method::Subscribe,
            "REFER" => Method::Refer,
            "PRACK" => Method::Prack,
            other => {
                // RFC 3261 token characters
                let valid = !other.is_empty()
                    && other
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || "-.!%*_+`'~".contains(c));
                if !valid {
                    return Err(Error::InvalidMethod(other.to_string()));
                }
                Method::Extension(other.to_string())
            }
        };
        Ok(method)
    }
}
