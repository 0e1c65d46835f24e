use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Parameter, ProviderParameters};
use crate::registry::StrategyRegistry;

/// Failure of a single risk provider. Never fatal to the checkout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RiskError {
    /// Failure on our side: no implementation, bad configuration.
    #[error("{0}")]
    Internal(String),

    /// Failure reported by the third-party provider.
    #[error("{0}")]
    External(String),
}

impl RiskError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }
}

/// Identity and initialization parameters of one risk provider, as listed by
/// the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskProviderInfo {
    pub code: String,
    pub provider_type: Option<String>,
    pub parameters: Vec<Parameter>,
}

impl RiskProviderInfo {
    /// Key used to detect duplicate providers within one session.
    pub fn key(&self) -> (&str, Option<&str>) {
        (&self.code, self.provider_type.as_deref())
    }
}

impl From<&ProviderParameters> for RiskProviderInfo {
    fn from(params: &ProviderParameters) -> Self {
        Self {
            code: params.provider_code.clone(),
            provider_type: params.provider_type.clone(),
            parameters: params.parameters.clone(),
        }
    }
}

/// A third-party fraud-risk integration.
#[async_trait]
pub trait RiskProvider: Send + Sync {
    /// Prepares the provider for this session.
    async fn initialize(&mut self, info: &RiskProviderInfo) -> Result<(), RiskError>;

    /// Produces the risk data to attach to the next operation.
    async fn result(&self) -> Result<Vec<Parameter>, RiskError>;
}

/// Creates [`RiskProvider`]s for the `(code, type)` pairs it supports.
pub trait RiskProviderFactory: Send + Sync {
    fn supports(&self, code: &str, provider_type: Option<&str>) -> bool;

    fn create(&self) -> Box<dyn RiskProvider>;
}

/// Ordered risk provider factories, first match wins.
pub type RiskProviderRegistry = StrategyRegistry<dyn RiskProviderFactory>;

impl StrategyRegistry<dyn RiskProviderFactory> {
    /// Creates a provider from the first factory supporting `(code, type)`.
    pub fn create_provider(&self, code: &str, provider_type: Option<&str>) -> Option<Box<dyn RiskProvider>> {
        self.find(|f| f.supports(code, provider_type))
            .map(|factory| factory.create())
    }
}
