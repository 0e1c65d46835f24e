//! Payment service traits.
//!
//! A payment service executes one operation for the networks it supports and
//! reports back through a [`ResultSink`]. Services are created per dispatch
//! by a [`PaymentServiceFactory`] looked up in the
//! [`PaymentServiceRegistry`](super::PaymentServiceRegistry).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::connection::PaymentConnection;
use crate::model::{CheckoutResult, ExtraElements, ProviderParameters};
use crate::redirect::RedirectCoordinator;
use crate::request::{BrowserData, RequestData};

/// Receiving end of a [`ResultSink`].
pub type ResultReceiver = oneshot::Receiver<CheckoutResult>;

/// Single-use completion channel handed to a payment service.
///
/// Delivering consumes the sink, so a service reports at most once per
/// operation. A sink dropped without delivering closes the receiver.
#[derive(Debug)]
pub struct ResultSink {
    sender: oneshot::Sender<CheckoutResult>,
}

impl ResultSink {
    pub fn channel() -> (Self, ResultReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Delivers the result. Returns false if nobody is listening any more.
    pub fn deliver(self, result: CheckoutResult) -> bool {
        self.sender.send(result).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Session collaborators a service needs for one operation.
#[derive(Clone)]
pub struct ServiceContext {
    pub connection: Arc<dyn PaymentConnection>,
    pub redirects: Arc<RedirectCoordinator>,
    /// Extra elements of the session's list, for checkbox defaults.
    pub extra_elements: Option<ExtraElements>,
    /// Risk data collected right before the operation was dispatched.
    pub risk_requests: Vec<ProviderParameters>,
    pub browser_data: Option<BrowserData>,
}

impl ServiceContext {
    pub fn new(connection: Arc<dyn PaymentConnection>, redirects: Arc<RedirectCoordinator>) -> Self {
        Self {
            connection,
            redirects,
            extra_elements: None,
            risk_requests: Vec::new(),
            browser_data: None,
        }
    }

    pub fn with_extra_elements(mut self, extra_elements: Option<ExtraElements>) -> Self {
        self.extra_elements = extra_elements;
        self
    }

    pub fn with_risk_requests(mut self, risk_requests: Vec<ProviderParameters>) -> Self {
        self.risk_requests = risk_requests;
        self
    }

    pub fn with_browser_data(mut self, browser_data: Option<BrowserData>) -> Self {
        self.browser_data = browser_data;
        self
    }
}

/// Executes operations for a family of networks.
///
/// Every started operation ends in exactly one delivery on its sink, unless
/// [`stop`](PaymentService::stop) is called first. A service that parked an
/// operation behind a redirect delivers it from
/// [`resume`](PaymentService::resume).
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Submits a charge, payout, preset or update operation.
    async fn process_payment(&self, request: RequestData, context: ServiceContext, sink: ResultSink);

    /// Deletes the registered account addressed by the request's self link.
    async fn delete_account(&self, request: RequestData, context: ServiceContext, sink: ResultSink);

    /// Completes a redirect-parked operation. Returns true only if this
    /// service was waiting on a redirect and has now delivered its result.
    fn resume(&self) -> bool;

    /// Whether an operation is parked behind a redirect.
    fn is_awaiting_redirect(&self) -> bool {
        false
    }

    /// Cancels in-flight work. Idempotent. A parked redirect survives so it
    /// can still be resumed.
    fn stop(&self);
}

/// Creates [`PaymentService`]s for the networks it supports.
pub trait PaymentServiceFactory: Send + Sync {
    /// Whether this factory handles the network. `providers` are the provider
    /// codes backing the network.
    fn supports(&self, network_code: &str, payment_method: &str, providers: &[String]) -> bool;

    /// Creates a fresh service instance.
    fn create(&self) -> Arc<dyn PaymentService>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interaction, OperationResult};

    #[test]
    fn test_sink_delivers_once() {
        let (sink, mut receiver) = ResultSink::channel();
        assert!(!sink.is_closed());
        assert!(sink.deliver(CheckoutResult::from_operation(OperationResult::new(
            "ok",
            Interaction::proceed_ok()
        ))));
        let result = receiver.try_recv().unwrap();
        assert_eq!(result.interaction(), &Interaction::proceed_ok());
    }

    #[test]
    fn test_sink_reports_dropped_receiver() {
        let (sink, receiver) = ResultSink::channel();
        drop(receiver);
        assert!(sink.is_closed());
        assert!(!sink.deliver(CheckoutResult::client_side("late")));
    }
}
