//! Checkout Interactive Layer
//!
//! Drives a checkout session: loads the list, dispatches the card the
//! customer picked to a payment service, classifies each outcome and decides
//! whether to finalize, reload, keep the session or offer a retry.
//!
//! # Example
//!
//! ```ignore
//! use checkout_interactive::{CheckoutHost, CheckoutOrchestrator};
//! use checkout_lib::{CheckoutConfig, HttpConnection};
//!
//! let config = CheckoutConfig::new(list_url);
//! let connection = Arc::new(HttpConnection::new(config.connection.clone())?);
//! let handle = CheckoutOrchestrator::new(connection, host, launcher).spawn();
//!
//! handle.load_session(config).await?;
//! // ... host.on_session_ready() shows the cards ...
//! handle.select_card("network:VISA", input_values).await?;
//! ```

pub mod classifier;
pub mod host;
pub mod orchestrator;
pub mod session;

pub use classifier::{classify, Action};
pub use host::{CheckoutHost, FollowUp};
pub use orchestrator::{CheckoutOrchestrator, OrchestratorHandle, SessionState};
pub use session::{PaymentCard, PaymentSession};

use thiserror::Error;

/// Why the orchestrator refused a host request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("an operation is already in progress")]
    ProcessInFlight,

    #[error("the payment session is still loading")]
    LoadInFlight,

    #[error("no payment session loaded")]
    NoSession,

    #[error("unknown payment card {0}")]
    UnknownCard(String),

    #[error("payment card {0} cannot be deleted")]
    NotDeletable(String),

    #[error("checkout is not started")]
    NotStarted,

    #[error("waiting for a retry or abort decision")]
    RetryPending,

    #[error("nothing to retry")]
    NoPendingRetry,

    #[error("waiting for a redirect to return")]
    RedirectPending,

    #[error("invalid redirect return URL: {0}")]
    InvalidReturnUrl(String),

    #[error("checkout already finished")]
    Finished,

    #[error("orchestrator closed")]
    Closed,
}
