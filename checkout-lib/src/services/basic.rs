//! Generic payment service.
//!
//! Posts the operation built from the request data and hands the API's
//! answer back unchanged, except for PROCEED answers that carry a redirect:
//! those are parked until the host resumes after the external flow returns.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use super::traits::{PaymentService, PaymentServiceFactory, ResultSink, ServiceContext};
use crate::model::{
    CheckoutResult, ErrorInfo, FlowType, Interaction, InteractionCode, InteractionReason,
    OperationResult, OperationType,
};
use crate::redirect::{RedirectCoordinator, RedirectRequest};
use crate::request::{OperationRequest, RequestData};
use crate::Result;

/// Factory for [`BasicPaymentService`].
#[derive(Clone, Debug, Default)]
pub struct BasicPaymentServiceFactory {
    methods: Option<Vec<String>>,
}

impl BasicPaymentServiceFactory {
    /// Serves every network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves only networks of the given payment methods.
    pub fn for_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: Some(methods.into_iter().map(Into::into).collect()),
        }
    }
}

impl PaymentServiceFactory for BasicPaymentServiceFactory {
    fn supports(&self, _network_code: &str, payment_method: &str, _providers: &[String]) -> bool {
        match &self.methods {
            Some(methods) => methods.iter().any(|m| m == payment_method),
            None => true,
        }
    }

    fn create(&self) -> Arc<dyn PaymentService> {
        Arc::new(BasicPaymentService::new())
    }
}

struct PendingRedirect {
    sink: ResultSink,
    redirects: Arc<RedirectCoordinator>,
}

/// Payment service for networks that need nothing beyond the Operation API
/// and, optionally, a browser redirect.
pub struct BasicPaymentService {
    cancel: CancellationToken,
    pending: Mutex<Option<PendingRedirect>>,
}

impl BasicPaymentService {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            pending: Mutex::new(None),
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<PendingRedirect>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `call` unless stopped first. `None` means the work was cancelled
    /// and nothing must be delivered.
    async fn run<F>(&self, call: F) -> Option<Result<OperationResult>>
    where
        F: std::future::Future<Output = Result<OperationResult>>,
    {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = call => (!self.cancel.is_cancelled()).then_some(result),
        }
    }

    fn handle_result(&self, result: OperationResult, flow: FlowType, context: &ServiceContext, sink: ResultSink) {
        let redirect = match (&result.redirect, result.interaction.code == InteractionCode::Proceed) {
            (Some(redirect), true) => redirect.clone(),
            _ => {
                sink.deliver(result.into());
                return;
            }
        };

        let request = match RedirectRequest::new(redirect) {
            Ok(request) => request,
            Err(err) => {
                sink.deliver(CheckoutResult::from_error(&err, flow));
                return;
            }
        };

        // Parked before opening so a fast return finds the sink in place.
        // Checked under the lock that stop() takes, so a stop either lands
        // first or finds the redirect parked.
        {
            let mut pending = self.lock_pending();
            if self.cancel.is_cancelled() {
                tracing::debug!("stopped before redirect, dropping result");
                return;
            }
            *pending = Some(PendingRedirect {
                sink,
                redirects: context.redirects.clone(),
            });
        }

        if let Err(err) = context.redirects.redirect(&request) {
            tracing::warn!(error = %err, "redirect could not be opened");
            if let Some(pending) = self.lock_pending().take() {
                pending.sink.deliver(CheckoutResult::from_error(&err, flow));
            }
        }
    }
}

impl Default for BasicPaymentService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentService for BasicPaymentService {
    async fn process_payment(&self, request: RequestData, context: ServiceContext, sink: ResultSink) {
        let flow = if request.list_operation_type == OperationType::Update {
            FlowType::Update
        } else {
            FlowType::Process
        };

        let operation = match OperationRequest::build(
            &request,
            context.extra_elements.as_ref(),
            context.risk_requests.clone(),
            context.browser_data.clone(),
        ) {
            Ok(operation) => operation,
            Err(err) => {
                sink.deliver(CheckoutResult::from_error(&err, flow));
                return;
            }
        };

        tracing::debug!(network = %operation.network_code, operation = %operation.operation_type, "posting operation");
        let Some(response) = self.run(context.connection.post_operation(&operation)).await else {
            tracing::debug!(network = %operation.network_code, "operation stopped");
            return;
        };

        match response {
            Ok(result) => self.handle_result(result, flow, &context, sink),
            Err(err) => {
                sink.deliver(CheckoutResult::from_error(&err, flow));
            }
        }
    }

    async fn delete_account(&self, request: RequestData, context: ServiceContext, sink: ResultSink) {
        let url = match request.self_link() {
            Ok(url) => url.to_string(),
            Err(err) => {
                sink.deliver(CheckoutResult::from_error(&err, FlowType::Delete));
                return;
            }
        };

        let Some(response) = self.run(context.connection.delete_account(&url)).await else {
            return;
        };

        let result = match response {
            Ok(result) => CheckoutResult::from_operation(result),
            Err(err) => CheckoutResult::from_error(&err, FlowType::Delete),
        };
        sink.deliver(result);
    }

    fn resume(&self) -> bool {
        let Some(pending) = self.lock_pending().take() else {
            return false;
        };

        let result = match pending.redirects.take_result() {
            Some(result) => CheckoutResult::from_operation(result),
            None => {
                tracing::warn!("resumed without redirect result");
                CheckoutResult::from_error_info(ErrorInfo::new(
                    "missing operation result after redirect",
                    Interaction::new(InteractionCode::Verify, InteractionReason::ClientsideError),
                ))
            }
        };
        pending.sink.deliver(result);
        true
    }

    fn is_awaiting_redirect(&self) -> bool {
        self.lock_pending().is_some()
    }

    fn stop(&self) {
        let _pending = self.lock_pending();
        self.cancel.cancel();
    }
}
