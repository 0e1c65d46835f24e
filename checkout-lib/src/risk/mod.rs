//! Risk provider orchestration.
//!
//! Sessions may list third-party risk providers. Each is resolved through a
//! [`RiskProviderRegistry`], initialized on session load and asked for its
//! data right before an operation is submitted. Collection is best-effort:
//! a failing provider contributes an error block instead of risk data and
//! never blocks the checkout.

mod orchestrator;
mod traits;

pub use orchestrator::{
    RiskOrchestrator, DEFAULT_MAX_ERROR_LEN, EXTERNAL_ERROR_PARAM, INTERNAL_ERROR_PARAM,
};
pub use traits::{RiskError, RiskProvider, RiskProviderFactory, RiskProviderInfo, RiskProviderRegistry};
