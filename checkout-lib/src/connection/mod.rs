//! Transport seam to the Payment API.
//!
//! The checkout core only needs three calls: load a list, post an operation
//! and delete a registered account. Each either yields the parsed response or
//! fails with a [`CheckoutError`](crate::CheckoutError) that tells a network
//! failure apart from an error signalled by the API.
//!
//! ## Feature Flags
//!
//! The reqwest-backed [`HttpConnection`] requires the `http-connection`
//! feature:
//!
//! ```toml
//! [dependencies]
//! checkout-lib = { version = "0.1", features = ["http-connection"] }
//! ```

mod config;
#[cfg(feature = "http-connection")]
mod http;

pub use config::{CheckoutConfig, ConnectionConfig, PAYMENT_MEDIA_TYPE};
#[cfg(feature = "http-connection")]
pub use http::HttpConnection;

use async_trait::async_trait;

use crate::model::{ListResult, OperationResult};
use crate::request::OperationRequest;
use crate::Result;

/// Asynchronous access to the List and Operation APIs.
#[async_trait]
pub trait PaymentConnection: Send + Sync {
    /// `GET <listURL>`.
    async fn load_list(&self, url: &str) -> Result<ListResult>;

    /// `POST <operationLink>` with the operation body.
    async fn post_operation(&self, request: &OperationRequest) -> Result<OperationResult>;

    /// `DELETE <selfLink>` of a registered account.
    async fn delete_account(&self, url: &str) -> Result<OperationResult>;
}
