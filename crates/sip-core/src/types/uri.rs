//! # SIP URIs and transports
//!
//! `sip:`/`sips:` URIs ([RFC 3261 Section 19.1](https://datatracker.ietf.org/doc/html/rfc3261#section-19.1))
//! built from their components, and the transport protocols a Via can name.
//!
//! ```rust
//! use minisip_sip_core::prelude::*;
//!
//! let uri = Uri::sip("bob", "biloxi.example.com").with_port(5060);
//! assert_eq!(uri.to_string(), "sip:bob@biloxi.example.com:5060");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::param::Param;
use crate::error::{Error, Result};

/// URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    Sip,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Sip => f.write_str("sip"),
        }
    }
}

/// A SIP URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    pub scheme: Scheme,
    pub user: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub params: Vec<Param>,
}

impl Uri {
    /// `sip:` URI without user part
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Sip,
            user: None,
            host: host.into(),
            port: None,
            params: Vec::new(),
        }
    }

    /// `sip:user@host`
    pub fn sip(user: impl Into<String>, host: impl Into<String>) -> Self {
        let mut uri = Self::new(host);
        uri.user = Some(user.into());
        uri
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_parameter(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// `host[:port]` part of the URI
    pub fn host_port(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        f.write_str(&self.host_port())?;
        for param in &self.params {
            write!(f, ";{}", param)?;
        }
        Ok(())
    }
}

/// Transport protocol carried in Via headers and URI parameters
///
/// Serialized upper case; deserialized in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Transport {
    #[default]
    Udp,
    Tcp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Udp => "UDP",
            Transport::Tcp => "TCP",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("udp") {
            Ok(Transport::Udp)
        } else if s.eq_ignore_ascii_case("tcp") {
            Ok(Transport::Tcp)
        } else {
            Err(Error::InvalidTransport(s.to_string()))
        }
    }
}

impl TryFrom<String> for Transport {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_display() {
        let uri = Uri::sip("alice", "atlanta.example.com")
            .with_parameter(Param::transport("TCP"));
        assert_eq!(uri.to_string(), "sip:alice@atlanta.example.com;transport=TCP");

        let bare = Uri::new("127.0.0.1").with_port(5070);
        assert_eq!(bare.to_string(), "sip:127.0.0.1:5070");
        assert_eq!(bare.host_port(), "127.0.0.1:5070");
    }

    #[test]
    fn test_transport_parse() {
        assert_eq!("udp".parse::<Transport>().unwrap(), Transport::Udp);
        assert_eq!("TCP".parse::<Transport>().unwrap(), Transport::Tcp);
        assert!("sctp".parse::<Transport>().is_err());
    }

    #[test]
    fn test_transport_serde_ignores_case() {
        assert_eq!(serde_json::to_string(&Transport::Tcp).unwrap(), "\"TCP\"");
        assert_eq!(serde_json::from_str::<Transport>("\"udp\"").unwrap(), Transport::Udp);
        assert_eq!(serde_json::from_str::<Transport>("\"Tcp\"").unwrap(), Transport::Tcp);
        assert!(serde_json::from_str::<Transport>("\"sctp\"").is_err());
    }
}
