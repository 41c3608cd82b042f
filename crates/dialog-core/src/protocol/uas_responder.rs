//! UAS Responder
//!
//! Answers inbound requests one transaction at a time. Every request gets a
//! `200 OK` that echoes its Via, From, To, Call-ID and CSeq headers, adds the
//! endpoint's Contact and `Content-Length: 0`, and (with `tag_answers`) a To
//! tag that stays the same for the whole dialog. An INVITE transaction is
//! only complete once the caller's ACK arrived; a BYE ends the dialog.
//!
//! A request without Call-ID cannot belong to any dialog and is answered
//! with `400 Bad Request`.

use tracing::{debug, info, warn};

use minisip_sip_core::{HeaderAccess, HeaderName, Method, Request, Response, StatusCode, TypedHeader};

use crate::config::{EndpointConfig, Identity};
use crate::dialog::{Dialog, TransactionInfo, generate_tag, to_tag};
use crate::errors::{DialogError, DialogResult};
use crate::headers;
use crate::transaction::{ServerTransaction, TransactionManager};

/// Headers copied verbatim from a request into its answer, in this order
const ECHOED_HEADERS: [HeaderName; 5] = [
    HeaderName::Via,
    HeaderName::From,
    HeaderName::To,
    HeaderName::CallId,
    HeaderName::CSeq,
];

/// What happened on one inbound transaction
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTransaction {
    pub request: Request,
    pub response: Response,
    /// The ACK that completed an INVITE transaction
    pub ack: Option<Request>,
}

/// Answers the inbound requests of one endpoint
pub struct UasResponder<'a, M: TransactionManager> {
    manager: &'a mut M,
    config: &'a EndpointConfig,
    dialog: &'a mut Dialog,
}

impl<'a, M: TransactionManager> UasResponder<'a, M> {
    pub fn new(manager: &'a mut M, config: &'a EndpointConfig, dialog: &'a mut Dialog) -> Self {
        Self { manager, config, dialog }
    }

    /// Answer the next inbound request.
    ///
    /// `Ok(None)` means the request stream has closed.
    pub async fn accept(&mut self) -> DialogResult<Option<CompletedTransaction>> {
        let Some(mut transaction) = self.manager.next_request().await else {
            debug!("Request stream of {} closed", self.manager.local_addr());
            return Ok(None);
        };
        answer(&mut transaction, self.dialog, self.config).await.map(Some)
    }

    /// Answer requests until the stream closes, or until a BYE ended the
    /// dialog when `single_call` is set. Failed transactions are logged and
    /// skipped. Returns the number of transactions completed.
    pub async fn serve(&mut self) -> usize {
        info!("Listening for incoming requests on {}", self.manager.local_addr());
        let mut completed = 0;

        loop {
            match self.accept().await {
                Ok(Some(done)) => {
                    completed += 1;
                    if self.config.single_call && done.request.method == Method::Bye && self.dialog.state.is_terminated() {
                        info!("Call {} ended, no longer serving", self.dialog.call_id);
                        break;
                    }
                }
                Ok(None) => {
                    info!("Stopped serving: request stream closed");
                    break;
                }
                Err(err) => warn!("Inbound transaction failed: {}", err),
            }
        }

        completed
    }
}

/// Answer `transaction`, updating `dialog`
pub async fn answer<S: ServerTransaction>(
    transaction: &mut S,
    dialog: &mut Dialog,
    config: &EndpointConfig,
) -> DialogResult<CompletedTransaction> {
    let request = transaction.origin().clone();
    info!("Received: {}", request.short());

    let Some(call_id) = request.call_id().map(|c| c.value().to_string()) else {
        warn!("{} without Call-ID, answering 400", request.method);
        let rejection = build_answer(&request, StatusCode::BAD_REQUEST, None, &config.identity);
        transaction.respond(rejection).await?;
        return Err(DialogError::protocol_error(format!("{} request has no Call-ID", request.method)));
    };

    if dialog.adopt_call_id(&call_id) {
        info!("New dialog {} from {}", call_id, request.method);
    }
    if let Some(tag) = request.from().and_then(|from| from.tag()) {
        dialog.adopt_from_tag(tag);
    }
    let seq = request.cseq().map(|cseq| cseq.sequence()).unwrap_or_default();
    if request.cseq().is_some() {
        dialog.observe_remote_cseq(seq);
    }
    let mut info = TransactionInfo::new(request.branch().unwrap_or_default(), request.method.clone(), seq);
    info.key = Some(transaction.key().clone());
    dialog.set_current_transaction(info);

    let local_tag = answer_tag(&request, dialog, config.tag_answers);
    let response = build_answer(&request, StatusCode::OK, local_tag.as_deref(), &config.identity);

    if !config.answer_delay.is_zero() {
        tokio::time::sleep(config.answer_delay).await;
    }
    info!("Sending 200 OK to {}", request.method);
    transaction.respond(response.clone()).await?;

    let ack = match request.method {
        Method::Invite => {
            debug!("Awaiting ACK on {}", transaction.key());
            let ack = transaction.wait_ack().await?;
            debug!("Received ACK {}", ack.short());
            dialog.confirm();
            info!("Call {} established", dialog.call_id);
            Some(ack)
        }
        Method::Bye => {
            dialog.terminate();
            info!("Call {} terminated by peer", dialog.call_id);
            None
        }
        _ => None,
    };

    Ok(CompletedTransaction { request, response, ack })
}

/// To tag the answer must add, if any.
///
/// A request that already carries a To tag is echoed as is; otherwise, with
/// tagging on, the dialog's local tag is used, created on first need.
fn answer_tag(request: &Request, dialog: &mut Dialog, tag_answers: bool) -> Option<String> {
    if let Some(tag) = to_tag(request) {
        dialog.learn_to_tag(tag);
        return None;
    }
    if !tag_answers {
        return None;
    }
    if dialog.to_tag.is_empty() {
        dialog.learn_to_tag(&generate_tag());
    }
    Some(dialog.to_tag.clone())
}

/// Answer with `status`, echoing the request's correlation headers
pub fn build_answer(request: &Request, status: StatusCode, to_tag: Option<&str>, identity: &Identity) -> Response {
    let mut response = Response::new(status);
    for name in &ECHOED_HEADERS {
        response.copy_headers_from(request, name);
    }

    if let Some(tag) = to_tag {
        for header in response.headers.iter_mut() {
            if let TypedHeader::To(to) = header {
                to.set_tag(tag);
            }
        }
    }

    response
        .with_header(TypedHeader::Contact(headers::contact(identity)))
        .with_header(TypedHeader::ContentLength(headers::content_length(0)))
}
