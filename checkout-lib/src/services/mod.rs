//! Payment Service Strategies
//!
//! Each applicable network is served by a [`PaymentService`] created from the
//! first matching [`PaymentServiceFactory`] in a [`PaymentServiceRegistry`].
//! Networks no factory supports are hidden from the customer.
//!
//! # Architecture
//!
//! - **Traits**: [`PaymentService`], [`PaymentServiceFactory`] and the
//!   single-use [`ResultSink`]
//! - **Registry**: ordered, first-match-wins lookup
//! - **Built-in service**: [`BasicPaymentService`], which posts operations and
//!   follows browser redirects
//!
//! # Creating Custom Services
//!
//! ```ignore
//! struct WalletFactory;
//!
//! impl PaymentServiceFactory for WalletFactory {
//!     fn supports(&self, code: &str, _method: &str, _providers: &[String]) -> bool {
//!         code == "MYWALLET"
//!     }
//!
//!     fn create(&self) -> Arc<dyn PaymentService> {
//!         Arc::new(WalletService::new())
//!     }
//! }
//! ```

mod basic;
mod registry;
mod traits;

pub use basic::{BasicPaymentService, BasicPaymentServiceFactory};
pub use registry::PaymentServiceRegistry;
pub use traits::{
    PaymentService, PaymentServiceFactory, ResultReceiver, ResultSink, ServiceContext,
};
