//! Identifier generation and small helpers shared by the UAC and UAS sides

use minisip_sip_core::{HeaderAccess, Method};

/// Globally unique Call-ID: `<uuid>-<unix millis>@<host>`
pub fn generate_call_id(host: &str) -> String {
    format!(
        "{}-{}@{}",
        uuid::Uuid::new_v4().simple(),
        chrono::Utc::now().timestamp_millis(),
        host
    )
}

/// Random 32-bit tag rendered as 8 hex digits
pub fn generate_tag() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// RFC 3261 branch naming the method it was created for: `z9hG4bK-<METHOD>-<uuid>`
pub fn generate_branch(method: &Method) -> String {
    format!(
        "{}-{}-{}",
        minisip_sip_core::BRANCH_MAGIC_COOKIE,
        method,
        uuid::Uuid::new_v4().simple()
    )
}

/// To tag of a message, if it has a To header with a non-empty tag
pub fn to_tag<M: HeaderAccess>(message: &M) -> Option<&str> {
    message
        .to()
        .and_then(|to| to.tag())
        .filter(|tag| !tag.is_empty())
}
