//! Dialog state and identifier generation
//!
//! - [`Dialog`]: the call record an endpoint owns
//! - [`DialogState`]: lifecycle (Initial, Early, Confirmed, Terminated)
//! - [`dialog_utils`]: Call-ID, tag and branch generation
//!
//! ## Dialog Lifecycle
//!
//! ```text
//! Initial → Early → Confirmed → Terminated
//!    ↓        ↓        ↓          ↓
//!  INVITE   18x      2xx       BYE
//!  sent     recv'd   ACKed     sent/recv'd
//! ```

pub mod dialog_impl;
pub mod dialog_state;
pub mod dialog_utils;

pub use dialog_impl::{Dialog, TransactionInfo};
pub use dialog_state::DialogState;
pub use dialog_utils::{generate_branch, generate_call_id, generate_tag, to_tag};
