//! Session/operation state machine.
//!
//! The orchestrator runs as a single task that owns the session, the active
//! payment service and the pending-retry state. Hosts drive it through a
//! cloneable [`OrchestratorHandle`]; the task reports back through
//! [`CheckoutHost`]. Loads and operations run in their own tasks and report
//! to the orchestrator task over channels, so all state changes happen on one
//! logical thread.
//!
//! ```text
//! STOPPED ──load/resume──▶ STARTED ──select/delete──▶ PROCESS
//!    ▲                        ▲                          │
//!    └──────── pause ─────────┴──── keep/reload ─────────┤
//!                                                        ▼
//!                                                    FINISHED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use checkout_lib::connection::{CheckoutConfig, PaymentConnection};
use checkout_lib::model::{CheckoutResult, FlowType, Interaction};
use checkout_lib::redirect::{RedirectCoordinator, RedirectLauncher};
use checkout_lib::request::BrowserData;
use checkout_lib::risk::{RiskOrchestrator, RiskProviderRegistry};
use checkout_lib::services::{
    PaymentService, PaymentServiceRegistry, ResultReceiver, ResultSink, ServiceContext,
};
use checkout_lib::{CheckoutError, InputValues, RequestData};

use crate::classifier::{classify, Action};
use crate::host::{CheckoutHost, FollowUp};
use crate::session::PaymentSession;
use crate::SessionError;

const COMMAND_BUFFER: usize = 32;

/// Orchestrator state as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Paused or not yet started. Nothing is in flight.
    Stopped,
    /// A session is loaded or loading; cards may be selected once loaded.
    Started,
    /// An operation is in flight or parked behind a redirect.
    Process,
    /// A result was delivered. Terminal.
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "STOPPED",
            Self::Started => "STARTED",
            Self::Process => "PROCESS",
            Self::Finished => "FINISHED",
        };
        f.write_str(label)
    }
}

type Reply<T = ()> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    LoadSession { config: CheckoutConfig, reply: Reply },
    SelectCard { key: String, input: InputValues, reply: Reply },
    DeleteAccount { key: String, reply: Reply },
    Pause { reply: Reply },
    Resume { reply: Reply },
    CompleteRedirect { url: String, reply: Reply },
    Retry { reply: Reply },
    Abort { reply: Reply },
    State { reply: Reply<SessionState> },
}

/// Cloneable entry point for the host.
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Command>,
}

impl OrchestratorHandle {
    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    /// Loads the list at `config.list_url` and starts the session.
    pub async fn load_session(&self, config: CheckoutConfig) -> Result<(), SessionError> {
        self.request(|reply| Command::LoadSession { config, reply }).await
    }

    /// Dispatches the card with `key`. Refused while an operation or load is
    /// in flight.
    pub async fn select_card(&self, key: &str, input: InputValues) -> Result<(), SessionError> {
        let key = key.to_string();
        self.request(|reply| Command::SelectCard { key, input, reply })
            .await
    }

    /// Deletes the registered account with `key`.
    pub async fn delete_account(&self, key: &str) -> Result<(), SessionError> {
        let key = key.to_string();
        self.request(|reply| Command::DeleteAccount { key, reply }).await
    }

    /// Host went to the background. Cancels loads and in-flight operations.
    pub async fn pause(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Host is back in the foreground.
    pub async fn resume(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Hands over the URL an external redirect returned to. Call before
    /// [`resume`](Self::resume).
    pub async fn complete_redirect(&self, url: &str) -> Result<(), SessionError> {
        let url = url.to_string();
        self.request(|reply| Command::CompleteRedirect { url, reply })
            .await
    }

    /// Re-issues the request that failed with a network failure.
    pub async fn retry(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Retry { reply }).await
    }

    /// Gives up after a network failure and finalizes.
    pub async fn abort(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Abort { reply }).await
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        self.request(|reply| Command::State { reply }).await
    }
}

/// Builder for the orchestrator task.
pub struct CheckoutOrchestrator {
    connection: Arc<dyn PaymentConnection>,
    host: Arc<dyn CheckoutHost>,
    launcher: Arc<dyn RedirectLauncher>,
    services: Arc<PaymentServiceRegistry>,
    risk_providers: Arc<RiskProviderRegistry>,
    browser_data: Option<BrowserData>,
}

impl CheckoutOrchestrator {
    pub fn new(
        connection: Arc<dyn PaymentConnection>,
        host: Arc<dyn CheckoutHost>,
        launcher: Arc<dyn RedirectLauncher>,
    ) -> Self {
        Self {
            connection,
            host,
            launcher,
            services: Arc::new(PaymentServiceRegistry::with_defaults()),
            risk_providers: Arc::new(RiskProviderRegistry::new()),
            browser_data: None,
        }
    }

    pub fn with_services(mut self, services: Arc<PaymentServiceRegistry>) -> Self {
        self.services = services;
        self
    }

    pub fn with_risk_providers(mut self, risk_providers: Arc<RiskProviderRegistry>) -> Self {
        self.risk_providers = risk_providers;
        self
    }

    pub fn with_browser_data(mut self, browser_data: BrowserData) -> Self {
        self.browser_data = Some(browser_data);
        self
    }

    /// Starts the orchestrator task. It ends when every handle is dropped.
    pub fn spawn(self) -> OrchestratorHandle {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (load_events, load_receiver) = mpsc::unbounded_channel();
        let redirects = Arc::new(RedirectCoordinator::new(self.launcher.clone()));

        let actor = Actor {
            connection: self.connection,
            host: self.host,
            launcher: self.launcher,
            services: self.services,
            risk_providers: self.risk_providers,
            browser_data: self.browser_data,
            commands: receiver,
            load_events,
            load_receiver,
            state: SessionState::Stopped,
            config: None,
            redirects,
            session: None,
            service: None,
            operation: None,
            load: None,
            load_ticket: 0,
            load_reissued: false,
            pending_retry: None,
        };
        tokio::spawn(actor.run());

        OrchestratorHandle { commands }
    }
}

/// A loaded session and its risk providers. Replaced wholesale on reload.
struct ActiveSession {
    session: PaymentSession,
    risk: Arc<RiskOrchestrator>,
}

struct LoadEvent {
    ticket: u64,
    outcome: Result<ActiveSession, CheckoutError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OperationKind {
    Process,
    Delete,
}

/// Everything needed to re-issue an operation.
#[derive(Clone)]
struct Dispatch {
    card_key: String,
    code: String,
    payment_method: String,
    providers: Vec<String>,
    request: RequestData,
    kind: OperationKind,
    flow: FlowType,
    /// Session the request was built from; a retry reuses it.
    session: Arc<ActiveSession>,
}

struct ActiveOperation {
    dispatch: Dispatch,
    receiver: ResultReceiver,
}

enum PendingRetry {
    Load { url: String, result: CheckoutResult },
    Operation { dispatch: Dispatch, result: CheckoutResult },
}

impl PendingRetry {
    fn result(self) -> CheckoutResult {
        match self {
            Self::Load { result, .. } | Self::Operation { result, .. } => result,
        }
    }
}

struct Actor {
    connection: Arc<dyn PaymentConnection>,
    host: Arc<dyn CheckoutHost>,
    launcher: Arc<dyn RedirectLauncher>,
    services: Arc<PaymentServiceRegistry>,
    risk_providers: Arc<RiskProviderRegistry>,
    browser_data: Option<BrowserData>,

    commands: mpsc::Receiver<Command>,
    load_events: mpsc::UnboundedSender<LoadEvent>,
    load_receiver: mpsc::UnboundedReceiver<LoadEvent>,

    state: SessionState,
    config: Option<CheckoutConfig>,
    redirects: Arc<RedirectCoordinator>,
    session: Option<Arc<ActiveSession>>,
    service: Option<Arc<dyn PaymentService>>,
    operation: Option<ActiveOperation>,
    load: Option<JoinHandle<()>>,
    load_ticket: u64,
    /// A load that ended in RELOAD/RETRY is re-issued once, not in a loop.
    load_reissued: bool,
    pending_retry: Option<PendingRetry>,
}

async fn next_result(operation: &mut Option<ActiveOperation>) -> Option<CheckoutResult> {
    match operation {
        Some(active) => (&mut active.receiver).await.ok(),
        None => std::future::pending().await,
    }
}

impl Actor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.load_receiver.recv() => self.handle_load(event),
                result = next_result(&mut self.operation) => self.handle_operation(result),
            }
        }
        self.cancel_load();
        if let Some(service) = self.service.take() {
            service.stop();
        }
        tracing::debug!("orchestrator closed");
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(from = %self.state, to = %state, "state transition");
            self.state = state;
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::State { reply } => {
                let _ = reply.send(Ok(self.state));
            }
            Command::LoadSession { config, reply } => {
                let _ = reply.send(self.load_session(config));
            }
            Command::SelectCard { key, input, reply } => {
                let _ = reply.send(self.dispatch_card(&key, input, OperationKind::Process));
            }
            Command::DeleteAccount { key, reply } => {
                let _ = reply.send(self.dispatch_card(&key, InputValues::new(), OperationKind::Delete));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::CompleteRedirect { url, reply } => {
                let _ = reply.send(self.complete_redirect(&url));
            }
            Command::Retry { reply } => {
                let _ = reply.send(self.retry());
            }
            Command::Abort { reply } => {
                let _ = reply.send(self.abort());
            }
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Finished => Err(SessionError::Finished),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Session loading
    // ------------------------------------------------------------------

    fn load_session(&mut self, config: CheckoutConfig) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.state == SessionState::Process {
            return Err(SessionError::ProcessInFlight);
        }
        // Replacing the coordinator would strand the parked result.
        if self.service.as_ref().is_some_and(|s| s.is_awaiting_redirect()) {
            return Err(SessionError::RedirectPending);
        }
        tracing::info!(list_url = %config.list_url, "starting checkout session");

        self.redirects = Arc::new(
            RedirectCoordinator::new(self.launcher.clone())
                .with_return_prefix(config.redirect_return_prefix.clone()),
        );
        self.config = Some(config);
        self.pending_retry = None;
        self.load_reissued = false;
        self.set_state(SessionState::Started);
        self.start_load();
        Ok(())
    }

    fn start_load(&mut self) {
        let Some((url, max_error_len)) = self
            .config
            .as_ref()
            .map(|c| (c.list_url.clone(), c.max_risk_error_len))
        else {
            return;
        };
        self.cancel_load();
        self.session = None;
        self.load_ticket += 1;

        let ticket = self.load_ticket;
        let connection = self.connection.clone();
        let services = self.services.clone();
        let risk_providers = self.risk_providers.clone();
        let events = self.load_events.clone();

        tracing::info!(%url, "loading payment session");
        self.load = Some(tokio::spawn(async move {
            let outcome = load_session(connection, services, risk_providers, &url, max_error_len).await;
            let _ = events.send(LoadEvent { ticket, outcome });
        }));
    }

    fn cancel_load(&mut self) {
        if let Some(load) = self.load.take() {
            load.abort();
            // Outcomes already queued by the aborted task carry the old ticket.
            self.load_ticket += 1;
        }
    }

    fn is_loading(&self) -> bool {
        self.load.is_some()
    }

    fn handle_load(&mut self, event: LoadEvent) {
        if event.ticket != self.load_ticket || self.state != SessionState::Started {
            tracing::debug!(ticket = event.ticket, "discarding stale session load");
            return;
        }
        self.load = None;

        match event.outcome {
            Ok(active) => {
                tracing::info!(cards = active.session.cards().len(), "payment session ready");
                self.load_reissued = false;
                let active = Arc::new(active);
                self.host.on_session_ready(&active.session);
                self.session = Some(active);
            }
            Err(err) => {
                let result = CheckoutResult::from_error(&err, FlowType::Load);
                let action = classify(result.interaction(), err.is_network_failure(), FlowType::Load);
                tracing::debug!(%action, error = %err, "session load failed");

                match action {
                    Action::RetryableConnectionError => {
                        let url = self.config.as_ref().map(|c| c.list_url.clone()).unwrap_or_default();
                        self.pending_retry = Some(PendingRetry::Load { url, result });
                        self.host.on_connection_error(FlowType::Load);
                    }
                    action if action.reloads() && !self.load_reissued => {
                        self.load_reissued = true;
                        if action == Action::ShowMessageThenReloadSession {
                            self.host.on_message(result.interaction(), FollowUp::ReloadSession);
                        }
                        self.start_load();
                    }
                    _ => self.finalize(result),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn dispatch_card(&mut self, key: &str, input: InputValues, kind: OperationKind) -> Result<(), SessionError> {
        self.ensure_open()?;
        match self.state {
            SessionState::Stopped => return Err(SessionError::NotStarted),
            SessionState::Process => return Err(SessionError::ProcessInFlight),
            _ => {}
        }
        if self.pending_retry.is_some() {
            return Err(SessionError::RetryPending);
        }
        if self.is_loading() {
            return Err(SessionError::LoadInFlight);
        }
        let active = self.session.clone().ok_or(SessionError::NoSession)?;
        let card = active
            .session
            .card(key)
            .ok_or_else(|| SessionError::UnknownCard(key.to_string()))?;
        if kind == OperationKind::Delete && !card.is_deletable() {
            return Err(SessionError::NotDeletable(key.to_string()));
        }

        let flow = match kind {
            OperationKind::Delete => FlowType::Delete,
            OperationKind::Process if active.session.is_update() => FlowType::Update,
            OperationKind::Process => FlowType::Process,
        };

        let request = match card.request_data(active.session.list(), input) {
            Ok(request) => request,
            Err(err) => {
                self.finalize(CheckoutResult::from_error(&err, flow));
                return Ok(());
            }
        };

        let dispatch = Dispatch {
            card_key: key.to_string(),
            code: card.code().to_string(),
            payment_method: card.payment_method().to_string(),
            providers: card.providers().to_vec(),
            request,
            kind,
            flow,
            session: active.clone(),
        };
        self.start_operation(dispatch);
        Ok(())
    }

    fn start_operation(&mut self, dispatch: Dispatch) {
        let service = match self
            .services
            .create_service(&dispatch.code, &dispatch.payment_method, &dispatch.providers)
        {
            Ok(service) => service,
            Err(err) => {
                tracing::warn!(error = %err, "no payment service");
                self.finalize(CheckoutResult::from_error(&err, dispatch.flow));
                return;
            }
        };

        if let Some(previous) = self.service.take() {
            previous.stop();
        }
        self.service = Some(service.clone());

        let (sink, receiver) = ResultSink::channel();
        let context = ServiceContext::new(self.connection.clone(), self.redirects.clone())
            .with_extra_elements(dispatch.session.session.list().extra_elements.clone())
            .with_browser_data(self.browser_data.clone());
        let request = dispatch.request.clone();
        let kind = dispatch.kind;
        let risk = dispatch.session.risk.clone();

        tracing::debug!(card = %dispatch.card_key, flow = %dispatch.flow, "dispatching operation");
        tokio::spawn(async move {
            match kind {
                OperationKind::Process => {
                    let risk_requests = risk.collect().await;
                    service
                        .process_payment(request, context.with_risk_requests(risk_requests), sink)
                        .await;
                }
                OperationKind::Delete => service.delete_account(request, context, sink).await,
            }
        });

        self.host.on_processing(&dispatch.card_key);
        self.operation = Some(ActiveOperation { dispatch, receiver });
        self.set_state(SessionState::Process);
    }

    fn handle_operation(&mut self, result: Option<CheckoutResult>) {
        let Some(operation) = self.operation.take() else {
            return;
        };
        if self.state != SessionState::Process {
            tracing::debug!(card = %operation.dispatch.card_key, "discarding late operation result");
            return;
        }
        let dispatch = operation.dispatch;
        let result = result.unwrap_or_else(|| CheckoutResult::client_side("payment service ended without a result"));
        if let Some(service) = self.service.take() {
            service.stop();
        }

        let action = classify(result.interaction(), result.is_network_failure(), dispatch.flow);
        tracing::debug!(interaction = %result.interaction(), flow = %dispatch.flow, %action, "operation classified");
        self.set_state(SessionState::Started);

        match action {
            Action::RetryableConnectionError => {
                let flow = dispatch.flow;
                self.pending_retry = Some(PendingRetry::Operation { dispatch, result });
                self.host.on_connection_error(flow);
            }
            Action::ShowMessageThenKeepSession if self.session.is_some() => {
                self.host.on_message(result.interaction(), FollowUp::KeepSession);
            }
            // Session was dropped by a pause during the operation.
            Action::ShowMessageThenKeepSession | Action::ShowMessageThenReloadSession => {
                self.host.on_message(result.interaction(), FollowUp::ReloadSession);
                self.start_load();
            }
            Action::ReloadSession => self.start_load(),
            Action::FinalizeSuccess | Action::FinalizeError => self.finalize(result),
        }
    }

    // ------------------------------------------------------------------
    // Retry / abort
    // ------------------------------------------------------------------

    fn retry(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.state == SessionState::Stopped {
            return Err(SessionError::NotStarted);
        }
        let pending = self.pending_retry.take().ok_or(SessionError::NoPendingRetry)?;
        match pending {
            PendingRetry::Load { url, .. } => {
                tracing::info!(%url, "retrying session load");
                self.start_load();
            }
            PendingRetry::Operation { dispatch, .. } => {
                tracing::info!(card = %dispatch.card_key, "retrying operation");
                self.start_operation(dispatch);
            }
        }
        Ok(())
    }

    fn abort(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        let pending = self.pending_retry.take().ok_or(SessionError::NoPendingRetry)?;
        self.finalize(pending.result());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn pause(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.state == SessionState::Stopped {
            return Ok(());
        }
        let was_processing = self.state == SessionState::Process;

        self.cancel_load();
        if let Some(service) = &self.service {
            service.stop();
        }
        // The operation may have changed the session server-side.
        if was_processing {
            self.session = None;
        }
        self.set_state(SessionState::Stopped);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        match self.state {
            SessionState::Started => return Ok(()),
            // Redirect returned without the host going through pause.
            SessionState::Process => {
                if let Some(service) = &self.service {
                    service.resume();
                }
                return Ok(());
            }
            _ => {}
        }
        if self.config.is_none() {
            return Err(SessionError::NotStarted);
        }

        if let Some(service) = &self.service {
            if service.resume() {
                tracing::debug!("payment service resumed after redirect");
                self.set_state(SessionState::Process);
                return Ok(());
            }
        }
        self.operation = None;
        self.set_state(SessionState::Started);

        if let Some(pending) = &self.pending_retry {
            let flow = match pending {
                PendingRetry::Load { .. } => FlowType::Load,
                PendingRetry::Operation { dispatch, .. } => dispatch.flow,
            };
            self.host.on_connection_error(flow);
        } else if let Some(active) = &self.session {
            self.host.on_session_ready(&active.session);
        } else {
            self.start_load();
        }
        Ok(())
    }

    fn complete_redirect(&mut self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.redirects
            .complete(url)
            .map(|_| ())
            .map_err(|err| SessionError::InvalidReturnUrl(err.to_string()))
    }

    fn finalize(&mut self, result: CheckoutResult) {
        tracing::info!(interaction = %result.interaction(), "checkout finished");
        self.cancel_load();
        if let Some(service) = self.service.take() {
            service.stop();
        }
        self.operation = None;
        self.pending_retry = None;
        self.set_state(SessionState::Finished);
        self.host.on_checkout_result(result);
    }
}

async fn load_session(
    connection: Arc<dyn PaymentConnection>,
    services: Arc<PaymentServiceRegistry>,
    risk_providers: Arc<RiskProviderRegistry>,
    url: &str,
    max_error_len: usize,
) -> Result<ActiveSession, CheckoutError> {
    let list = connection.load_list(url).await?;
    let risk_params = list.risk_providers.clone();
    let session = PaymentSession::build(list, &services)?;

    let mut risk = RiskOrchestrator::new(max_error_len);
    risk.initialize(&risk_providers, &risk_params).await;

    Ok(ActiveSession {
        session,
        risk: Arc::new(risk),
    })
}

/// Interaction reported to the host for a pending connection error.
pub fn connection_error_interaction(flow: FlowType) -> Interaction {
    CheckoutError::Network(String::new()).to_error_info(flow).interaction
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_lib::model::{InteractionCode, InteractionReason};

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Process.to_string(), "PROCESS");
        assert_eq!(
            serde_json::to_string(&SessionState::Finished).unwrap(),
            "\"FINISHED\""
        );
    }

    #[test]
    fn test_connection_error_interaction_by_flow() {
        assert_eq!(
            connection_error_interaction(FlowType::Load),
            Interaction::new(InteractionCode::Abort, InteractionReason::CommunicationFailure)
        );
        assert_eq!(
            connection_error_interaction(FlowType::Delete).code,
            InteractionCode::Verify
        );
    }

    #[test]
    fn test_pending_retry_yields_stored_result() {
        let result = CheckoutResult::from_error(&CheckoutError::Network("reset".into()), FlowType::Load);
        let pending = PendingRetry::Load {
            url: "https://api.example.com/lists/L1".into(),
            result: result.clone(),
        };
        assert_eq!(pending.result(), result);
    }
}
