//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use checkout_lib::prelude::*;
//! ```

// Result model
pub use crate::model::{
    CheckoutResult, ErrorInfo, FlowType, Interaction, InteractionCode, InteractionReason,
    ListResult, OperationResult,
};

// Error handling
pub use crate::errors::CheckoutError;
pub use crate::Result;

// Requests
pub use crate::request::{InputCategory, InputValues, RequestData};

// Transport and configuration
pub use crate::connection::{CheckoutConfig, ConnectionConfig, PaymentConnection};

#[cfg(feature = "http-connection")]
pub use crate::connection::HttpConnection;

// Payment services
pub use crate::services::{
    PaymentService, PaymentServiceFactory, PaymentServiceRegistry, ResultSink, ServiceContext,
};

// Risk and redirects
pub use crate::redirect::{RedirectCoordinator, RedirectLauncher, RedirectRequest};
pub use crate::risk::{RiskOrchestrator, RiskProvider, RiskProviderFactory, RiskProviderRegistry};
