//! Checkout library.
//!
//! Result model, request building and the pluggable pieces a checkout session
//! is assembled from. The session state machine itself lives in
//! `checkout-interactive`.
//!
//! # Features
//!
//! - **Result Model**: lists, operation results and the single
//!   [`CheckoutResult`] delivered to the host
//! - **Payment Services**: strategy trait plus first-match-wins registry
//! - **Risk Orchestration**: best-effort collection from third-party providers
//! - **Redirects**: hand-off to external browser flows and their resumption
//! - **Transport Abstraction**: [`PaymentConnection`] with an optional
//!   reqwest implementation (`http-connection` feature)
//!
//! # Example
//!
//! ```ignore
//! use checkout_lib::prelude::*;
//!
//! let registry = PaymentServiceRegistry::with_defaults();
//! let service = registry.create_service("VISA", "CREDIT_CARD", &[])?;
//!
//! let (sink, receiver) = ResultSink::channel();
//! service.process_payment(request, context, sink).await;
//! let result: CheckoutResult = receiver.await?;
//! println!("{}", result.interaction());
//! ```

pub mod connection;
pub mod errors;
pub mod model;
pub mod prelude;
pub mod redirect;
pub mod registry;
pub mod request;
pub mod risk;
pub mod services;

/// Test utilities: scripted connection, redirect launcher, fixtures.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use connection::{CheckoutConfig, ConnectionConfig, PaymentConnection};
pub use errors::CheckoutError;
pub use model::{CheckoutResult, ErrorInfo, FlowType, Interaction, ListResult, OperationResult};
pub use request::{InputCategory, InputValues, RequestData};

#[cfg(feature = "http-connection")]
pub use connection::HttpConnection;

/// Common result alias for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
