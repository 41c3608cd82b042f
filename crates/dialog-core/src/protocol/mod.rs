//! Per-transaction protocol drivers
//!
//! - [`uac_driver`]: sends INVITE and in-dialog requests and follows them to
//!   a final outcome, acknowledging 2xx answers to INVITE
//! - [`uas_responder`]: answers inbound requests and waits for the ACK of an
//!   INVITE

pub mod uac_driver;
pub mod uas_responder;

pub use uac_driver::{UacDriver, UacState, build_ack, build_request, drive_transaction};
pub use uas_responder::{CompletedTransaction, UasResponder, answer, build_answer};
