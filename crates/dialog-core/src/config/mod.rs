//! Configuration for dialog-core
//!
//! [`Identity`] describes who an endpoint is and where it listens;
//! [`EndpointConfig`] adds the dialog behaviour knobs. Both deserialize
//! from any serde format, durations being written in milliseconds.

pub mod endpoint;

pub use endpoint::{EndpointConfig, Identity};

/// Serde adapter storing a [`Duration`](std::time::Duration) as whole milliseconds
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
