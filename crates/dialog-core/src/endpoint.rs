//! # Endpoint
//!
//! A SIP user agent with one identity and at most one dialog. The same
//! endpoint can act as caller ([`invite`](Endpoint::invite),
//! [`bye`](Endpoint::bye), [`send_request`](Endpoint::send_request)) or as
//! callee ([`accept`](Endpoint::accept), [`serve`](Endpoint::serve)).
//! Every operation takes `&mut self`, so only one transaction of the dialog
//! is ever in flight.
//!
//! ## Example
//!
//! ```rust
//! use minisip_dialog_core::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let network = LoopbackNetwork::new();
//!
//! let bob_identity = Identity::new("Bob", "bob", "127.0.0.1", 5070);
//! let mut bob = Endpoint::new(EndpointConfig::new(bob_identity.clone()).with_single_call(true))?;
//! bob.start(&network).await?;
//! let callee = tokio::spawn(async move { bob.serve().await });
//!
//! let mut alice = Endpoint::new(EndpointConfig::new(Identity::new("Alice", "alice", "127.0.0.1", 5060)))?;
//! alice.start(&network).await?;
//!
//! alice.invite(&bob_identity).await?;
//! assert_eq!(alice.dialog().state, DialogState::Confirmed);
//!
//! alice.bye(&bob_identity).await?;
//! assert_eq!(alice.dialog().state, DialogState::Terminated);
//! assert_eq!(callee.await.unwrap()?, 2);
//! # Ok::<(), DialogError>(())
//! # }).unwrap();
//! ```

use tracing::info;

use minisip_sip_core::{Method, Response};

use crate::config::{EndpointConfig, Identity};
use crate::dialog::Dialog;
use crate::errors::{DialogError, DialogResult};
use crate::protocol::{CompletedTransaction, UacDriver, UasResponder};
use crate::transaction::{TransactionLayer, TransactionManager};

/// A user agent owning one identity, one dialog and one transaction manager
pub struct Endpoint<M: TransactionManager> {
    config: EndpointConfig,
    dialog: Dialog,
    manager: Option<M>,
}

impl<M: TransactionManager> Endpoint<M> {
    /// Create an endpoint; fails if `config` does not validate
    pub fn new(config: EndpointConfig) -> DialogResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dialog: Dialog::new(),
            manager: None,
        })
    }

    /// Bind a transaction manager on the identity's transport and `host:port`
    pub async fn start<L>(&mut self, layer: &L) -> DialogResult<()>
    where
        L: TransactionLayer<Manager = M>,
    {
        if self.manager.is_some() {
            return Err(DialogError::protocol_error(format!(
                "endpoint {} is already started",
                self.config.identity.address()
            )));
        }

        let identity = &self.config.identity;
        let manager = layer.bind(identity.transport, &identity.address()).await?;
        info!(
            "Endpoint {} listening on {} ({})",
            identity.username,
            manager.local_addr(),
            identity.transport
        );
        self.manager = Some(manager);
        Ok(())
    }

    /// Release the transaction manager; the dialog is kept
    pub fn stop(&mut self) {
        if self.manager.take().is_some() {
            info!("Endpoint {} stopped", self.config.identity.username);
        }
    }

    pub fn is_started(&self) -> bool {
        self.manager.is_some()
    }

    /// Call `peer`; returns the 2xx answer after it was acknowledged
    pub async fn invite(&mut self, peer: &Identity) -> DialogResult<Response> {
        let manager = self.manager.as_ref().ok_or(DialogError::NotStarted)?;
        UacDriver::new(manager, &self.config, &mut self.dialog)
            .send_invite(peer)
            .await
    }

    /// Hang up the current call
    pub async fn bye(&mut self, peer: &Identity) -> DialogResult<Response> {
        self.send_request(peer, Method::Bye).await
    }

    /// Send a non-INVITE request inside the current dialog
    pub async fn send_request(&mut self, peer: &Identity, method: Method) -> DialogResult<Response> {
        let manager = self.manager.as_ref().ok_or(DialogError::NotStarted)?;
        UacDriver::new(manager, &self.config, &mut self.dialog)
            .send_non_invite(peer, method)
            .await
    }

    /// Answer the next inbound request; `Ok(None)` once the request stream closed
    pub async fn accept(&mut self) -> DialogResult<Option<CompletedTransaction>> {
        let manager = self.manager.as_mut().ok_or(DialogError::NotStarted)?;
        UasResponder::new(manager, &self.config, &mut self.dialog)
            .accept()
            .await
    }

    /// Answer inbound requests until the stream closes (or the call ends in
    /// single-call mode); returns how many transactions completed
    pub async fn serve(&mut self) -> DialogResult<usize> {
        let manager = self.manager.as_mut().ok_or(DialogError::NotStarted)?;
        Ok(UasResponder::new(manager, &self.config, &mut self.dialog)
            .serve()
            .await)
    }

    /// Forget the current dialog so the next [`invite`](Self::invite) starts a new call
    pub fn clear_dialog(&mut self) {
        self.dialog.reset();
    }

    pub fn identity(&self) -> &Identity {
        &self.config.identity
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{LoopbackManager, LoopbackNetwork, TransactionError};

    fn endpoint(username: &str, port: u16) -> Endpoint<LoopbackManager> {
        Endpoint::new(EndpointConfig::new(Identity::new("", username, "127.0.0.1", port))).unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let result = Endpoint::<LoopbackManager>::new(EndpointConfig::new(Identity::new("", "", "h", 1)));
        assert!(matches!(result, Err(DialogError::ConfigError { .. })));
    }

    #[tokio::test]
    async fn test_operations_require_start() {
        let mut alice = endpoint("alice", 5060);
        let bob = Identity::new("", "bob", "127.0.0.1", 5070);

        assert_eq!(alice.invite(&bob).await.unwrap_err(), DialogError::NotStarted);
        assert_eq!(alice.bye(&bob).await.unwrap_err(), DialogError::NotStarted);
        assert_eq!(alice.accept().await.unwrap_err(), DialogError::NotStarted);
        assert_eq!(alice.serve().await.unwrap_err(), DialogError::NotStarted);
        assert!(alice.dialog().is_empty());
    }

    #[tokio::test]
    async fn test_start_binds_identity_address() {
        let network = LoopbackNetwork::new();
        let mut alice = endpoint("alice", 5060);
        alice.start(&network).await.unwrap();

        assert!(alice.is_started());
        assert!(network.is_bound("127.0.0.1:5060"));
        assert!(matches!(alice.start(&network).await, Err(DialogError::ProtocolError { .. })));

        let mut twin = endpoint("alice2", 5060);
        assert_eq!(
            twin.start(&network).await.unwrap_err(),
            DialogError::Transaction(TransactionError::AddressInUse {
                address: "127.0.0.1:5060".to_string()
            })
        );

        alice.stop();
        assert!(!network.is_bound("127.0.0.1:5060"));
    }

    #[tokio::test]
    async fn test_bye_without_dialog() {
        let network = LoopbackNetwork::new();
        let mut alice = endpoint("alice", 5060);
        alice.start(&network).await.unwrap();

        let bob = Identity::new("", "bob", "127.0.0.1", 5070);
        assert_eq!(alice.bye(&bob).await.unwrap_err(), DialogError::NoDialog);
        assert!(matches!(
            alice.send_request(&bob, Method::Invite).await,
            Err(DialogError::ProtocolError { .. })
        ));
        assert!(network.trace().is_empty());
    }
}
