use super::traits::{RiskError, RiskProvider, RiskProviderInfo, RiskProviderRegistry};
use crate::model::{Parameter, ProviderParameters};

/// Parameter carrying a truncated [`RiskError::Internal`] message.
pub const INTERNAL_ERROR_PARAM: &str = "internalError";
/// Parameter carrying a truncated [`RiskError::External`] message.
pub const EXTERNAL_ERROR_PARAM: &str = "externalError";

/// Default cap, in characters, for substituted error messages.
pub const DEFAULT_MAX_ERROR_LEN: usize = 2000;

struct Controller {
    info: RiskProviderInfo,
    provider: Option<Box<dyn RiskProvider>>,
    error: Option<RiskError>,
}

/// Risk providers of one session.
///
/// Built on every session load and dropped with the session, so a provider
/// never contributes data to a session it was not initialized for.
pub struct RiskOrchestrator {
    controllers: Vec<Controller>,
    max_error_len: usize,
}

impl RiskOrchestrator {
    pub fn new(max_error_len: usize) -> Self {
        Self {
            controllers: Vec::new(),
            max_error_len,
        }
    }

    /// Number of providers initialized or recorded as failed.
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Resolves and initializes one provider per distinct `(code, type)`.
    ///
    /// A provider that cannot be resolved or fails to initialize is kept with
    /// its error so [`collect`](Self::collect) still reports it.
    pub async fn initialize(&mut self, registry: &RiskProviderRegistry, providers: &[ProviderParameters]) {
        for params in providers {
            let info = RiskProviderInfo::from(params);
            if self.controllers.iter().any(|c| c.info.key() == info.key()) {
                tracing::debug!(provider = %info.code, "duplicate risk provider skipped");
                continue;
            }

            let controller = match registry.create_provider(&info.code, info.provider_type.as_deref()) {
                None => {
                    tracing::warn!(provider = %info.code, "no risk provider implementation");
                    Controller {
                        error: Some(RiskError::internal(format!(
                            "risk provider {} is not supported",
                            info.code
                        ))),
                        provider: None,
                        info,
                    }
                }
                Some(mut provider) => match provider.initialize(&info).await {
                    Ok(()) => Controller {
                        info,
                        provider: Some(provider),
                        error: None,
                    },
                    Err(err) => {
                        tracing::warn!(provider = %info.code, error = %err, "risk provider failed to initialize");
                        Controller {
                            info,
                            provider: None,
                            error: Some(err),
                        }
                    }
                },
            };
            self.controllers.push(controller);
        }
    }

    /// One block per provider, in initialization order. Failures are
    /// substituted as error parameters.
    pub async fn collect(&self) -> Vec<ProviderParameters> {
        let mut blocks = Vec::with_capacity(self.controllers.len());
        for controller in &self.controllers {
            let outcome = match (&controller.provider, &controller.error) {
                (_, Some(err)) => Err(err.clone()),
                (Some(provider), None) => provider.result().await,
                (None, None) => Err(RiskError::internal("risk provider not initialized")),
            };
            let parameters = match outcome {
                Ok(parameters) => parameters,
                Err(err) => {
                    tracing::warn!(provider = %controller.info.code, error = %err, "risk data unavailable");
                    vec![self.error_parameter(&err)]
                }
            };
            blocks.push(
                ProviderParameters::new(
                    controller.info.code.clone(),
                    controller.info.provider_type.clone(),
                )
                .with_parameters(parameters),
            );
        }
        blocks
    }

    fn error_parameter(&self, err: &RiskError) -> Parameter {
        let (name, message) = match err {
            RiskError::Internal(message) => (INTERNAL_ERROR_PARAM, message),
            RiskError::External(message) => (EXTERNAL_ERROR_PARAM, message),
        };
        Parameter::new(name, truncate(message, self.max_error_len))
    }
}

impl Default for RiskOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERROR_LEN)
    }
}

fn truncate(message: &str, max_len: usize) -> String {
    message.chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskProviderFactory;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticProvider {
        fail_init: Option<String>,
        fail_result: bool,
        code: String,
    }

    #[async_trait]
    impl RiskProvider for StaticProvider {
        async fn initialize(&mut self, info: &RiskProviderInfo) -> Result<(), RiskError> {
            self.code = info.code.clone();
            match &self.fail_init {
                Some(message) => Err(RiskError::external(message.clone())),
                None => Ok(()),
            }
        }

        async fn result(&self) -> Result<Vec<Parameter>, RiskError> {
            if self.fail_result {
                return Err(RiskError::external("device fingerprint unavailable"));
            }
            Ok(vec![Parameter::new("session", format!("{}-session", self.code))])
        }
    }

    struct StaticFactory {
        code: &'static str,
        fail_init: Option<String>,
        fail_result: bool,
    }

    impl StaticFactory {
        fn ok(code: &'static str) -> Arc<dyn RiskProviderFactory> {
            Arc::new(Self {
                code,
                fail_init: None,
                fail_result: false,
            })
        }

        fn failing(code: &'static str, message: String) -> Arc<dyn RiskProviderFactory> {
            Arc::new(Self {
                code,
                fail_init: Some(message),
                fail_result: false,
            })
        }
    }

    impl RiskProviderFactory for StaticFactory {
        fn supports(&self, code: &str, _provider_type: Option<&str>) -> bool {
            code == self.code
        }

        fn create(&self) -> Box<dyn RiskProvider> {
            Box::new(StaticProvider {
                fail_init: self.fail_init.clone(),
                fail_result: self.fail_result,
                code: String::new(),
            })
        }
    }

    fn params(codes: &[&str]) -> Vec<ProviderParameters> {
        codes
            .iter()
            .map(|code| ProviderParameters::new(*code, Some("RISK".into())))
            .collect()
    }

    #[tokio::test]
    async fn test_failed_provider_still_yields_block() {
        let registry = RiskProviderRegistry::from_factories(vec![
            StaticFactory::ok("ALPHA"),
            StaticFactory::failing("BETA", "sdk crashed".into()),
            StaticFactory::ok("GAMMA"),
        ]);
        let mut risk = RiskOrchestrator::default();
        risk.initialize(&registry, &params(&["ALPHA", "BETA", "GAMMA"])).await;

        let blocks = risk.collect().await;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].value("session"), Some("ALPHA-session"));
        assert_eq!(blocks[1].provider_code, "BETA");
        assert_eq!(blocks[1].value(EXTERNAL_ERROR_PARAM), Some("sdk crashed"));
        assert_eq!(blocks[2].value("session"), Some("GAMMA-session"));
    }

    #[tokio::test]
    async fn test_unresolved_provider_is_internal_error() {
        let registry = RiskProviderRegistry::new();
        let mut risk = RiskOrchestrator::default();
        risk.initialize(&registry, &params(&["UNKNOWN"])).await;

        let blocks = risk.collect().await;
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].value(INTERNAL_ERROR_PARAM).is_some());
        assert_eq!(blocks[0].provider_type.as_deref(), Some("RISK"));
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped() {
        let registry = RiskProviderRegistry::from_factories(vec![StaticFactory::ok("ALPHA")]);
        let mut risk = RiskOrchestrator::default();
        risk.initialize(&registry, &params(&["ALPHA", "ALPHA"])).await;
        risk.initialize(&registry, &params(&["ALPHA"])).await;
        assert_eq!(risk.len(), 1);

        let mut other_type = params(&["ALPHA"]);
        other_type[0].provider_type = None;
        risk.initialize(&registry, &other_type).await;
        assert_eq!(risk.len(), 2);
    }

    #[tokio::test]
    async fn test_error_message_is_capped() {
        let registry = RiskProviderRegistry::from_factories(vec![StaticFactory::failing(
            "BETA",
            "x".repeat(DEFAULT_MAX_ERROR_LEN + 500),
        )]);
        let mut risk = RiskOrchestrator::default();
        risk.initialize(&registry, &params(&["BETA"])).await;

        let blocks = risk.collect().await;
        let message = blocks[0].value(EXTERNAL_ERROR_PARAM).unwrap();
        assert_eq!(message.chars().count(), DEFAULT_MAX_ERROR_LEN);
    }

    #[tokio::test]
    async fn test_result_failure_is_substituted() {
        let registry = RiskProviderRegistry::from_factories(vec![Arc::new(StaticFactory {
            code: "ALPHA",
            fail_init: None,
            fail_result: true,
        }) as Arc<dyn RiskProviderFactory>]);
        let mut risk = RiskOrchestrator::new(10);
        risk.initialize(&registry, &params(&["ALPHA"])).await;

        let blocks = risk.collect().await;
        assert_eq!(blocks[0].value(EXTERNAL_ERROR_PARAM), Some("device fin"));
    }

    #[tokio::test]
    async fn test_no_providers_collects_nothing() {
        let risk = RiskOrchestrator::default();
        assert!(risk.is_empty());
        assert!(risk.collect().await.is_empty());
    }
}
