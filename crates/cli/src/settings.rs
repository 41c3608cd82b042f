//! Call-flow settings: defaults, an optional TOML file, then flag overrides
//!
//! ```toml
//! [caller.identity]
//! display_name = "Ryan"
//! username = "ryan"
//! host = "localhost"
//! port = 5070
//!
//! [callee]
//! answer_delay_ms = 1000
//!
//! [callee.identity]
//! username = "stefan"
//! host = "localhost"
//! port = 5060
//!
//! [hold]
//! duration_ms = 2000
//!
//! [loopback]
//! transaction_timeout_ms = 32000
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use minisip_dialog_core::{EndpointConfig, Identity, LoopbackSettings};

const DEFAULT_HOLD_MS: u64 = 2000;

fn default_hold_ms() -> u64 {
    DEFAULT_HOLD_MS
}

/// How long the caller keeps the call up before hanging up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldSettings {
    #[serde(default = "default_hold_ms")]
    pub duration_ms: u64,
}

impl Default for HoldSettings {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl HoldSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_caller")]
    pub caller: EndpointConfig,
    #[serde(default = "default_callee")]
    pub callee: EndpointConfig,
    #[serde(default)]
    pub hold: HoldSettings,
    #[serde(default)]
    pub loopback: LoopbackSettings,
}

fn default_caller() -> EndpointConfig {
    EndpointConfig::new(Identity::new("Ryan", "ryan", "localhost", 5070))
}

fn default_callee() -> EndpointConfig {
    EndpointConfig::new(Identity::new("Ryan's PC", "stefan", "localhost", 5060))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            caller: default_caller(),
            callee: default_callee(),
            hold: HoldSettings::default(),
            loopback: LoopbackSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults, or the contents of `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_hold_ms(mut self, hold_ms: Option<u64>) -> Self {
        if let Some(hold_ms) = hold_ms {
            self.hold.duration_ms = hold_ms;
        }
        self
    }

    /// Delay both the callee's final responses and the caller's ACK
    pub fn with_delay_ms(mut self, delay_ms: Option<u64>) -> Self {
        if let Some(delay_ms) = delay_ms {
            let delay = Duration::from_millis(delay_ms);
            self.callee.answer_delay = delay;
            self.caller.ack_delay = delay;
        }
        self
    }

    /// Validate both endpoints; the callee always serves exactly one call
    pub fn finish(mut self) -> Result<Self> {
        self.callee.single_call = true;
        self.caller.validate().context("caller")?;
        self.callee.validate().context("callee")?;
        if self.caller.identity.address() == self.callee.identity.address() {
            bail!(
                "caller and callee must listen on different addresses, both use {}",
                self.caller.identity.address()
            );
        }
        if self.loopback.transaction_timeout.is_zero() {
            bail!("loopback transaction timeout must be greater than zero");
        }
        Ok(self)
    }
}
