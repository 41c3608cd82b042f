//! Endpoint identity and behaviour
//!
//! ## Examples
//!
//! ```rust
//! use std::time::Duration;
//! use minisip_dialog_core::config::{EndpointConfig, Identity};
//!
//! let config = EndpointConfig::new(Identity::new("Alice", "alice", "127.0.0.1", 5060))
//!     .with_initial_cseq(100)
//!     .with_ack_delay(Duration::from_millis(10));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.identity.address(), "127.0.0.1:5060");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use minisip_sip_core::{Param, Transport, Uri};

use super::duration_ms;
use crate::errors::{DialogError, DialogResult};

/// Largest CSeq a request may start from (RFC 3261 Section 8.1.1.5)
const MAX_INITIAL_CSEQ: u32 = 1 << 31;

/// Who an endpoint is and where it listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name for From/To/Contact
    #[serde(default)]
    pub display_name: String,
    pub username: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub transport: Transport,
}

impl Identity {
    /// UDP identity
    pub fn new(
        display_name: impl Into<String>,
        username: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            username: username.into(),
            host: host.into(),
            port,
            transport: Transport::Udp,
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// `host:port`, the key transaction managers bind and send to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `sip:username@host:port`
    pub fn uri(&self) -> Uri {
        Uri::sip(self.username.clone(), self.host.clone()).with_port(self.port)
    }

    /// Same as [`uri`](Self::uri) with a `transport` parameter
    pub fn uri_with_transport(&self) -> Uri {
        self.uri()
            .with_parameter(Param::transport(self.transport.as_str().to_ascii_lowercase()))
    }

    pub fn validate(&self) -> DialogResult<()> {
        if self.username.trim().is_empty() {
            return Err(DialogError::config_error("username must not be empty"));
        }
        if self.host.trim().is_empty() {
            return Err(DialogError::config_error("host must not be empty"));
        }
        if self.port == 0 {
            return Err(DialogError::config_error(format!("{}: port must not be 0", self.username)));
        }
        Ok(())
    }
}

fn default_initial_cseq() -> u32 {
    1
}

fn default_tag_answers() -> bool {
    true
}

/// Configuration of one [`Endpoint`](crate::endpoint::Endpoint)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub identity: Identity,

    /// CSeq of the first request of every dialog this endpoint starts
    #[serde(default = "default_initial_cseq")]
    pub initial_cseq: u32,

    /// Pause before a UAS sends its final response
    #[serde(rename = "answer_delay_ms", with = "duration_ms", default)]
    pub answer_delay: Duration,

    /// Pause between receiving a 2xx to INVITE and sending the ACK
    #[serde(rename = "ack_delay_ms", with = "duration_ms", default)]
    pub ack_delay: Duration,

    /// Add a local To tag to answers whose request had none
    #[serde(default = "default_tag_answers")]
    pub tag_answers: bool,

    /// Stop serving once a BYE has ended the dialog
    #[serde(default)]
    pub single_call: bool,
}

impl EndpointConfig {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            initial_cseq: default_initial_cseq(),
            answer_delay: Duration::ZERO,
            ack_delay: Duration::ZERO,
            tag_answers: default_tag_answers(),
            single_call: false,
        }
    }

    pub fn with_initial_cseq(mut self, initial_cseq: u32) -> Self {
        self.initial_cseq = initial_cseq;
        self
    }

    pub fn with_answer_delay(mut self, delay: Duration) -> Self {
        self.answer_delay = delay;
        self
    }

    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    pub fn with_tag_answers(mut self, tag_answers: bool) -> Self {
        self.tag_answers = tag_answers;
        self
    }

    pub fn with_single_call(mut self, single_call: bool) -> Self {
        self.single_call = single_call;
        self
    }

    pub fn validate(&self) -> DialogResult<()> {
        self.identity.validate()?;
        if self.initial_cseq >= MAX_INITIAL_CSEQ {
            return Err(DialogError::config_error(format!(
                "initial_cseq {} must be below 2^31",
                self.initial_cseq
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_uris() {
        let identity = Identity::new("Bob", "bob", "127.0.0.1", 5070);
        assert_eq!(identity.uri().to_string(), "sip:bob@127.0.0.1:5070");
        assert_eq!(identity.uri_with_transport().to_string(), "sip:bob@127.0.0.1:5070;transport=udp");

        let tcp = identity.with_transport(Transport::Tcp);
        assert_eq!(tcp.uri_with_transport().to_string(), "sip:bob@127.0.0.1:5070;transport=tcp");
    }

    #[test]
    fn test_validation() {
        assert!(Identity::new("", "alice", "host", 5060).validate().is_ok());
        assert!(Identity::new("Alice", "", "host", 5060).validate().is_err());
        assert!(Identity::new("Alice", "alice", " ", 5060).validate().is_err());
        assert!(matches!(
            Identity::new("Alice", "alice", "host", 0).validate(),
            Err(DialogError::ConfigError { .. })
        ));

        let config = EndpointConfig::new(Identity::new("Alice", "alice", "host", 5060));
        assert!(config.clone().with_initial_cseq(u32::MAX).validate().is_err());
        assert!(config.with_initial_cseq(0).validate().is_ok());
    }

    #[test]
    fn test_defaults_when_deserializing() {
        let json = r#"{"identity": {"username": "alice", "host": "127.0.0.1", "port": 5060}}"#;
        let config: EndpointConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config, EndpointConfig::new(Identity::new("", "alice", "127.0.0.1", 5060)));
        assert_eq!(config.initial_cseq, 1);
        assert!(config.tag_answers);
        assert!(!config.single_call);
        assert_eq!(config.ack_delay, Duration::ZERO);
    }

    #[test]
    fn test_delays_are_milliseconds() {
        let json = r#"{
            "identity": {"username": "bob", "host": "h", "port": 1, "transport": "TCP"},
            "answer_delay_ms": 1000,
            "ack_delay_ms": 250,
            "tag_answers": false
        }"#;
        let config: EndpointConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.answer_delay, Duration::from_secs(1));
        assert_eq!(config.ack_delay, Duration::from_millis(250));
        assert_eq!(config.identity.transport, Transport::Tcp);
        assert!(!config.tag_answers);

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["answer_delay_ms"], 1000);
    }
}
