//! Scripted in-memory Payment API.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::connection::PaymentConnection;
use crate::model::{ErrorInfo, ListResult, OperationResult};
use crate::redirect::{RedirectLauncher, RedirectRequest};
use crate::request::OperationRequest;
use crate::{CheckoutError, Result};

/// One scripted answer.
#[derive(Clone, Debug)]
pub enum MockResponse<T> {
    Ok(T),
    /// Fails as if the API could not be reached.
    NetworkFailure,
    /// Fails with an error status carrying this description.
    Api(ErrorInfo),
}

impl<T> MockResponse<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::NetworkFailure => Err(CheckoutError::Network("simulated network failure".into())),
            Self::Api(info) => Err(CheckoutError::Api(info)),
        }
    }
}

/// Answers in order; the last answer repeats once the queue runs dry.
struct Script<T> {
    queue: VecDeque<MockResponse<T>>,
    last: Option<MockResponse<T>>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            last: None,
        }
    }

    fn push(&mut self, response: MockResponse<T>) {
        self.queue.push_back(response);
    }

    fn next(&mut self, what: &str) -> Result<T> {
        if let Some(response) = self.queue.pop_front() {
            self.last = Some(response.clone());
            return response.into_result();
        }
        match &self.last {
            Some(response) => response.clone().into_result(),
            None => Err(CheckoutError::client_side(format!("no scripted {} response", what))),
        }
    }
}

/// A call received by [`MockConnection`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedRequest {
    LoadList(String),
    PostOperation(OperationRequest),
    DeleteAccount(String),
}

/// In-memory [`PaymentConnection`] with scripted answers.
///
/// An optional gate holds operation and deletion calls until the test calls
/// `notify_one`, which makes cancellation and in-flight states deterministic.
pub struct MockConnection {
    lists: Mutex<Script<ListResult>>,
    operations: Mutex<Script<OperationResult>>,
    deletions: Mutex<Script<OperationResult>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Option<Arc<Notify>>,
    list_gate: Option<Arc<Notify>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            lists: Mutex::new(Script::new()),
            operations: Mutex::new(Script::new()),
            deletions: Mutex::new(Script::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
            list_gate: None,
        }
    }

    pub fn with_list(self, list: ListResult) -> Self {
        self.with_list_response(MockResponse::Ok(list))
    }

    pub fn with_list_response(self, response: MockResponse<ListResult>) -> Self {
        lock(&self.lists).push(response);
        self
    }

    pub fn with_operation(self, result: OperationResult) -> Self {
        self.with_operation_response(MockResponse::Ok(result))
    }

    pub fn with_operation_response(self, response: MockResponse<OperationResult>) -> Self {
        lock(&self.operations).push(response);
        self
    }

    pub fn with_deletion(self, result: OperationResult) -> Self {
        lock(&self.deletions).push(MockResponse::Ok(result));
        self
    }

    /// Holds operation and deletion calls until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Holds list loads until `gate` is notified.
    pub fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    /// Appends answers after construction, e.g. once a session is running.
    pub fn push_list(&self, response: MockResponse<ListResult>) {
        lock(&self.lists).push(response);
    }

    pub fn push_operation(&self, response: MockResponse<OperationResult>) {
        lock(&self.operations).push(response);
    }

    /// All calls received, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn list_loads(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, RecordedRequest::LoadList(_)))
            .count()
    }

    pub fn operation_requests(&self) -> Vec<OperationRequest> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                RecordedRequest::PostOperation(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                RecordedRequest::DeleteAccount(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

async fn wait(gate: &Option<Arc<Notify>>) {
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

#[async_trait]
impl PaymentConnection for MockConnection {
    async fn load_list(&self, url: &str) -> Result<ListResult> {
        self.record(RecordedRequest::LoadList(url.to_string()));
        wait(&self.list_gate).await;
        lock(&self.lists).next("list")
    }

    async fn post_operation(&self, request: &OperationRequest) -> Result<OperationResult> {
        self.record(RecordedRequest::PostOperation(request.clone()));
        wait(&self.gate).await;
        lock(&self.operations).next("operation")
    }

    async fn delete_account(&self, url: &str) -> Result<OperationResult> {
        self.record(RecordedRequest::DeleteAccount(url.to_string()));
        wait(&self.gate).await;
        lock(&self.deletions).next("deletion")
    }
}

/// [`RedirectLauncher`] that records what it was asked to open.
pub struct MockRedirectLauncher {
    available: bool,
    opened: Mutex<Vec<RedirectRequest>>,
}

impl MockRedirectLauncher {
    pub fn new() -> Self {
        Self {
            available: true,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// A launcher for an environment without a browser.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> Vec<RedirectRequest> {
        lock(&self.opened).clone()
    }
}

impl Default for MockRedirectLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectLauncher for MockRedirectLauncher {
    fn can_open(&self, _request: &RedirectRequest) -> bool {
        self.available
    }

    fn open(&self, request: &RedirectRequest) -> Result<()> {
        lock(&self.opened).push(request.clone());
        Ok(())
    }
}
