//! Out-of-band redirects (3-D Secure challenges, external wallets).
//!
//! A payment service hands a [`RedirectRequest`] to the
//! [`RedirectCoordinator`], which asks the host's [`RedirectLauncher`] to open
//! it and then returns. The external flow may outlive the process, so there is
//! no completion callback: the host later passes the return URL to
//! [`RedirectCoordinator::complete`] and resumes the orchestration, at which
//! point the waiting service picks the result up with
//! [`RedirectCoordinator::take_result`].

use std::sync::{Arc, Mutex};
use url::Url;

use crate::model::{HttpMethod, Interaction, InteractionCode, InteractionReason, OperationResult, Parameter, Redirect};
use crate::{CheckoutError, Result};

/// Redirect to a provider page (wallets, bank transfers).
pub const REDIRECT_TYPE_PROVIDER: &str = "PROVIDER";
/// Redirect handled by a 3-D Secure 2 handler page.
pub const REDIRECT_TYPE_3DS2_HANDLER: &str = "3DS2-HANDLER";
/// Generic handler page.
pub const REDIRECT_TYPE_HANDLER: &str = "HANDLER";

const SUPPORTED_TYPES: [&str; 3] = [REDIRECT_TYPE_PROVIDER, REDIRECT_TYPE_3DS2_HANDLER, REDIRECT_TYPE_HANDLER];

/// Query parameters carried back on the return URL.
pub const PARAM_INTERACTION_CODE: &str = "interactionCode";
pub const PARAM_INTERACTION_REASON: &str = "interactionReason";
pub const PARAM_RESULT_INFO: &str = "resultInfo";

/// A redirect ready to be opened by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct RedirectRequest {
    redirect: Redirect,
    url: Url,
}

impl RedirectRequest {
    /// Resolves the browser URL. For `GET` the redirect parameters are
    /// appended to the query; for `POST` they stay as form parameters.
    pub fn new(redirect: Redirect) -> Result<Self> {
        let mut url = Url::parse(&redirect.url)?;
        if redirect.method == HttpMethod::Get && !redirect.parameters.is_empty() {
            let mut query = url.query_pairs_mut();
            for parameter in &redirect.parameters {
                query.append_pair(&parameter.name, parameter.value.as_deref().unwrap_or_default());
            }
        }
        Ok(Self { redirect, url })
    }

    /// URL to open.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &HttpMethod {
        &self.redirect.method
    }

    /// Redirects without an explicit type are provider redirects.
    pub fn redirect_type(&self) -> &str {
        self.redirect
            .redirect_type
            .as_deref()
            .unwrap_or(REDIRECT_TYPE_PROVIDER)
    }

    /// Parameters to submit as a form body, empty for `GET`.
    pub fn form_parameters(&self) -> &[Parameter] {
        match self.redirect.method {
            HttpMethod::Post => &self.redirect.parameters,
            _ => &[],
        }
    }

    pub fn suppress_iframe(&self) -> bool {
        self.redirect.suppress_iframe
    }
}

/// Host capability that opens an external browser tab or app.
pub trait RedirectLauncher: Send + Sync {
    /// Whether the environment can open this redirect at all.
    fn can_open(&self, request: &RedirectRequest) -> bool;

    /// Opens the redirect and returns immediately.
    fn open(&self, request: &RedirectRequest) -> Result<()>;
}

/// Hands redirects to the host and holds the result carried back by the
/// return URL until a payment service claims it.
pub struct RedirectCoordinator {
    launcher: Arc<dyn RedirectLauncher>,
    return_prefix: String,
    result: Mutex<Option<OperationResult>>,
}

impl RedirectCoordinator {
    pub fn new(launcher: Arc<dyn RedirectLauncher>) -> Self {
        Self {
            launcher,
            return_prefix: String::new(),
            result: Mutex::new(None),
        }
    }

    /// Only return URLs starting with `prefix` are accepted.
    pub fn with_return_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.return_prefix = prefix.into();
        self
    }

    /// Whether the redirect type is known and the host can open it.
    pub fn supports(&self, request: &RedirectRequest) -> bool {
        SUPPORTED_TYPES.contains(&request.redirect_type()) && self.launcher.can_open(request)
    }

    /// Opens the redirect. Any result left over from an earlier redirect is
    /// discarded first.
    #[tracing::instrument(skip(self, request), fields(url = %request.url(), kind = %request.redirect_type()))]
    pub fn redirect(&self, request: &RedirectRequest) -> Result<()> {
        if !self.supports(request) {
            return Err(CheckoutError::RedirectUnsupported(format!(
                "cannot open {} redirect",
                request.redirect_type()
            )));
        }
        self.lock().take();
        self.launcher.open(request)
    }

    /// Records the outcome carried by the URL the external flow returned to.
    pub fn complete(&self, return_url: &str) -> Result<OperationResult> {
        if !return_url.starts_with(&self.return_prefix) {
            return Err(CheckoutError::invalid_data(
                "returnUrl",
                format!("expected prefix {}", self.return_prefix),
            ));
        }
        let result = parse_return_url(return_url)?;
        tracing::debug!(interaction = %result.interaction, "redirect returned");
        *self.lock() = Some(result.clone());
        Ok(result)
    }

    /// Takes the returned result, if the host delivered one.
    pub fn take_result(&self) -> Option<OperationResult> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<OperationResult>> {
        self.result.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builds an [`OperationResult`] from the query of a return URL.
pub fn parse_return_url(return_url: &str) -> Result<OperationResult> {
    let url = Url::parse(return_url)?;
    let mut code = None;
    let mut reason = None;
    let mut result_info = String::new();

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            PARAM_INTERACTION_CODE => code = Some(InteractionCode::from(value.as_ref())),
            PARAM_INTERACTION_REASON => reason = Some(InteractionReason::from(value.as_ref())),
            PARAM_RESULT_INFO => result_info = value.into_owned(),
            _ => {}
        }
    }

    match (code, reason) {
        (Some(code), Some(reason)) => Ok(OperationResult::new(result_info, Interaction::new(code, reason))),
        _ => Err(CheckoutError::client_side(
            "return URL is missing interactionCode or interactionReason",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLauncher {
        available: bool,
        opened: AtomicUsize,
    }

    impl RedirectLauncher for CountingLauncher {
        fn can_open(&self, _request: &RedirectRequest) -> bool {
            self.available
        }

        fn open(&self, _request: &RedirectRequest) -> Result<()> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn launcher(available: bool) -> Arc<CountingLauncher> {
        Arc::new(CountingLauncher {
            available,
            opened: AtomicUsize::new(0),
        })
    }

    fn redirect(method: HttpMethod, redirect_type: Option<&str>) -> Redirect {
        Redirect {
            url: "https://psp.example.com/pay".into(),
            method,
            parameters: vec![Parameter::new("token", "t 1"), Parameter::new("lang", "en")],
            suppress_iframe: false,
            redirect_type: redirect_type.map(str::to_string),
        }
    }

    #[test]
    fn test_get_redirect_appends_parameters() {
        let request = RedirectRequest::new(redirect(HttpMethod::Get, None)).unwrap();
        assert_eq!(request.url().as_str(), "https://psp.example.com/pay?token=t+1&lang=en");
        assert!(request.form_parameters().is_empty());
        assert_eq!(request.redirect_type(), REDIRECT_TYPE_PROVIDER);
    }

    #[test]
    fn test_post_redirect_keeps_form_parameters() {
        let request = RedirectRequest::new(redirect(HttpMethod::Post, Some("3DS2-HANDLER"))).unwrap();
        assert_eq!(request.url().query(), None);
        assert_eq!(request.form_parameters().len(), 2);
    }

    #[test]
    fn test_unsupported_environment_is_rejected() {
        let launcher = launcher(false);
        let coordinator = RedirectCoordinator::new(launcher.clone());
        let request = RedirectRequest::new(redirect(HttpMethod::Get, None)).unwrap();

        assert!(!coordinator.supports(&request));
        assert!(matches!(
            coordinator.redirect(&request),
            Err(CheckoutError::RedirectUnsupported(_))
        ));
        assert_eq!(launcher.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_redirect_type_is_rejected() {
        let coordinator = RedirectCoordinator::new(launcher(true));
        let request = RedirectRequest::new(redirect(HttpMethod::Get, Some("POPUP"))).unwrap();
        assert!(!coordinator.supports(&request));
    }

    #[test]
    fn test_complete_then_take_once() {
        let coordinator =
            RedirectCoordinator::new(launcher(true)).with_return_prefix("shop://checkout");
        let request = RedirectRequest::new(redirect(HttpMethod::Get, None)).unwrap();
        coordinator.redirect(&request).unwrap();

        coordinator
            .complete("shop://checkout/return?interactionCode=PROCEED&interactionReason=OK&resultInfo=done")
            .unwrap();

        let result = coordinator.take_result().unwrap();
        assert_eq!(result.interaction, Interaction::proceed_ok());
        assert_eq!(result.result_info, "done");
        assert!(coordinator.take_result().is_none());
    }

    #[test]
    fn test_new_redirect_discards_stale_result() {
        let coordinator = RedirectCoordinator::new(launcher(true));
        coordinator
            .complete("shop://r?interactionCode=ABORT&interactionReason=CUSTOMER_ABORT")
            .unwrap();

        let request = RedirectRequest::new(redirect(HttpMethod::Get, None)).unwrap();
        coordinator.redirect(&request).unwrap();
        assert!(coordinator.take_result().is_none());
    }

    #[test]
    fn test_return_url_validation() {
        let coordinator = RedirectCoordinator::new(launcher(true)).with_return_prefix("shop://");
        assert!(coordinator
            .complete("https://evil.example.com/?interactionCode=PROCEED&interactionReason=OK")
            .is_err());
        assert!(matches!(
            parse_return_url("shop://r?interactionCode=PROCEED"),
            Err(CheckoutError::ClientSide(_))
        ));
    }
}
