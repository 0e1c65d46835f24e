//! Error types for checkout operations.
//!
//! Every error folds into a synthetic [`ErrorInfo`] through
//! [`CheckoutError::to_error_info`], so callers handle local failures and API
//! responses on one path.

use thiserror::Error;

use crate::model::{ErrorInfo, FailureKind, FlowType, Interaction, InteractionCode, InteractionReason};

/// Error type for checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The Payment API could not be reached.
    #[error("network failure: {0}")]
    Network(String),

    /// No registered payment service handles the network.
    #[error("no payment service for network {network_code} ({payment_method})")]
    ServiceNotFound {
        network_code: String,
        payment_method: String,
    },

    /// The host environment cannot perform the requested redirect.
    #[error("redirect not supported: {0}")]
    RedirectUnsupported(String),

    /// Local state prevents the request (missing link, missing account, ...).
    #[error("client-side error: {0}")]
    ClientSide(String),

    /// The API answered with an error description.
    #[error("API error {}: {}", .0.interaction, .0.result_info)]
    Api(ErrorInfo),

    /// A response or request body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A value supplied by the caller is invalid.
    #[error("invalid {field}: {reason}")]
    InvalidData { field: String, reason: String },
}

impl CheckoutError {
    /// True for transport-level failures reaching the API.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Only network failures are retried, and only after the host confirms.
    pub fn is_retryable(&self) -> bool {
        self.is_network_failure()
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Api(_) => FailureKind::Api,
            _ => FailureKind::ClientSide,
        }
    }

    /// Folds this error into the [`ErrorInfo`] reported for `flow`.
    pub fn to_error_info(&self, flow: FlowType) -> ErrorInfo {
        match self {
            Self::Api(info) => info.clone(),
            Self::Network(_) => ErrorInfo::new(
                self.to_string(),
                Interaction::new(
                    flow.network_failure_code(),
                    InteractionReason::CommunicationFailure,
                ),
            ),
            _ => ErrorInfo::new(
                self.to_string(),
                Interaction::new(InteractionCode::Abort, InteractionReason::ClientsideError),
            ),
        }
    }

    pub fn client_side(message: impl Into<String>) -> Self {
        Self::ClientSide(message.into())
    }

    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for CheckoutError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_data("url", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_is_retryable() {
        assert!(CheckoutError::Network("timeout".into()).is_retryable());
        assert!(!CheckoutError::client_side("no link").is_retryable());
        assert!(!CheckoutError::Serialization("bad json".into()).is_retryable());
    }

    #[test]
    fn test_service_not_found_maps_to_clientside_abort() {
        let err = CheckoutError::ServiceNotFound {
            network_code: "VISA".into(),
            payment_method: "CREDIT_CARD".into(),
        };
        let info = err.to_error_info(FlowType::Process);
        assert_eq!(info.interaction, Interaction::client_side_error());
        assert!(info.result_info.contains("VISA"));
    }

    #[test]
    fn test_redirect_unsupported_maps_to_clientside_abort() {
        let err = CheckoutError::RedirectUnsupported("no browser".into());
        assert_eq!(
            err.to_error_info(FlowType::Process).interaction,
            Interaction::client_side_error()
        );
    }

    #[test]
    fn test_network_failure_during_process_is_verify() {
        let info = CheckoutError::Network("reset".into()).to_error_info(FlowType::Process);
        assert_eq!(info.interaction.code, InteractionCode::Verify);
        assert_eq!(info.interaction.reason, InteractionReason::CommunicationFailure);
    }

    #[test]
    fn test_display() {
        let err = CheckoutError::invalid_data("listUrl", "relative URL without a base");
        assert_eq!(err.to_string(), "invalid listUrl: relative URL without a base");
    }
}
