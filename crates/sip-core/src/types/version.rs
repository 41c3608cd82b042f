use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol version of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn sip_2_0() -> Self {
        Self { major: 2, minor: 0 }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::sip_2_0()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/{}.{}", self.major, self.minor)
    }
}
