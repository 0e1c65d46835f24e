//! Payment service registry.

use std::sync::Arc;

use super::basic::BasicPaymentServiceFactory;
use super::traits::{PaymentService, PaymentServiceFactory};
use crate::registry::StrategyRegistry;
use crate::{CheckoutError, Result};

/// Ordered list of payment service factories. The first factory that
/// supports a network serves it.
///
/// # Example
///
/// ```ignore
/// use checkout_lib::services::{BasicPaymentServiceFactory, PaymentServiceRegistry};
/// use std::sync::Arc;
///
/// let registry = PaymentServiceRegistry::new();
/// registry.register(Arc::new(MyWalletFactory::new()));
/// registry.register(Arc::new(BasicPaymentServiceFactory::new()));
///
/// let service = registry.create_service("VISA", "CREDIT_CARD", &[])?;
/// ```
pub type PaymentServiceRegistry = StrategyRegistry<dyn PaymentServiceFactory>;

impl StrategyRegistry<dyn PaymentServiceFactory> {
    /// Creates a registry that serves every network with the basic service.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(BasicPaymentServiceFactory::new()));
        registry
    }

    /// Whether any registered factory handles the network.
    pub fn supports(&self, network_code: &str, payment_method: &str, providers: &[String]) -> bool {
        self.find(|f| f.supports(network_code, payment_method, providers))
            .is_some()
    }

    /// Creates a service from the first factory that handles the network.
    pub fn create_service(
        &self,
        network_code: &str,
        payment_method: &str,
        providers: &[String],
    ) -> Result<Arc<dyn PaymentService>> {
        let factory = self
            .find(|f| f.supports(network_code, payment_method, providers))
            .ok_or_else(|| CheckoutError::ServiceNotFound {
                network_code: network_code.to_string(),
                payment_method: payment_method.to_string(),
            })?;
        tracing::debug!(network = network_code, method = payment_method, "payment service resolved");
        Ok(factory.create())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_service_not_found() {
        let registry = PaymentServiceRegistry::new();
        assert!(!registry.supports("VISA", "CREDIT_CARD", &[]));

        let err = match registry.create_service("VISA", "CREDIT_CARD", &[]) {
            Err(err) => err,
            Ok(_) => panic!("expected ServiceNotFound"),
        };
        assert!(matches!(err, CheckoutError::ServiceNotFound { ref network_code, .. } if network_code == "VISA"));
    }

    #[test]
    fn test_defaults_serve_cards() {
        let registry = PaymentServiceRegistry::with_defaults();
        assert!(registry.supports("VISA", "CREDIT_CARD", &[]));
        assert!(registry.create_service("VISA", "CREDIT_CARD", &[]).is_ok());
    }

    #[test]
    fn test_method_restricted_factory_falls_through() {
        let registry = PaymentServiceRegistry::new();
        registry.register(Arc::new(BasicPaymentServiceFactory::for_methods([
            "CREDIT_CARD",
        ])));
        assert!(registry.supports("VISA", "CREDIT_CARD", &[]));
        assert!(!registry.supports("PAYPAL", "WALLET", &[]));
    }
}
