use std::fmt;

use serde::{Deserialize, Serialize};

use minisip_sip_core::Method;

/// Identifies a transaction: the top Via branch, the method and the side
///
/// A client and a server transaction for the same request share branch and
/// method, so the side is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionKey {
    pub branch: String,
    pub method: Method,
    pub is_server: bool,
}

impl TransactionKey {
    pub fn new(branch: String, method: Method, is_server: bool) -> Self {
        Self { branch, method, is_server }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Same transaction seen from the other side
    pub fn counterpart(&self) -> Self {
        Self {
            branch: self.branch.clone(),
            method: self.method.clone(),
            is_server: !self.is_server,
        }
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.is_server { "server" } else { "client" };
        write!(f, "{}:{}:{}", self.branch, self.method, side)
    }
}
