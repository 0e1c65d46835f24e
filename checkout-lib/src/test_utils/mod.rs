//! Test utilities for checkout-lib.
//!
//! Provides a scripted in-memory Payment API, a recording redirect launcher
//! and fixtures for common lists and results.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_lib::test_utils::{fixtures, MockConnection, MockResponse};
//!
//! let connection = MockConnection::new()
//!     .with_list(fixtures::card_list())
//!     .with_operation_response(MockResponse::NetworkFailure);
//! ```

pub mod fixtures;
mod mock_connection;

pub use mock_connection::{MockConnection, MockRedirectLauncher, MockResponse, RecordedRequest};
