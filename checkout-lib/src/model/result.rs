use serde::{Deserialize, Serialize};

use super::{ErrorInfo, FlowType, Interaction, OperationResult};
use crate::CheckoutError;

/// Category of a local failure that led to a [`CheckoutResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The API could not be reached. Retryable.
    Network,
    /// Local state prevented the request. Not retryable.
    ClientSide,
    /// The API answered with an error status.
    Api,
}

/// The error that caused a result, kept as plain data so results stay
/// cloneable and serializable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Outcome {
    OperationResult(OperationResult),
    ErrorInfo(ErrorInfo),
}

/// The only value delivered to the host application.
///
/// Holds exactly one of an [`OperationResult`] or an [`ErrorInfo`], so
/// [`interaction`](CheckoutResult::interaction) always resolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResult {
    #[serde(flatten)]
    outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<FailureCause>,
}

impl CheckoutResult {
    pub fn from_operation(result: OperationResult) -> Self {
        Self {
            outcome: Outcome::OperationResult(result),
            cause: None,
        }
    }

    pub fn from_error_info(info: ErrorInfo) -> Self {
        Self {
            outcome: Outcome::ErrorInfo(info),
            cause: None,
        }
    }

    /// Wraps a local or transport error into a synthetic [`ErrorInfo`] so it
    /// follows the same path as an API response.
    pub fn from_error(error: &CheckoutError, flow: FlowType) -> Self {
        Self {
            outcome: Outcome::ErrorInfo(error.to_error_info(flow)),
            cause: Some(FailureCause {
                kind: error.failure_kind(),
                message: error.to_string(),
            }),
        }
    }

    /// Shorthand for a client-side failure described by `message`.
    pub fn client_side(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            outcome: Outcome::ErrorInfo(ErrorInfo::new(
                message.clone(),
                Interaction::client_side_error(),
            )),
            cause: Some(FailureCause {
                kind: FailureKind::ClientSide,
                message,
            }),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        match &self.outcome {
            Outcome::OperationResult(result) => &result.interaction,
            Outcome::ErrorInfo(info) => &info.interaction,
        }
    }

    pub fn result_info(&self) -> &str {
        match &self.outcome {
            Outcome::OperationResult(result) => &result.result_info,
            Outcome::ErrorInfo(info) => &info.result_info,
        }
    }

    pub fn operation_result(&self) -> Option<&OperationResult> {
        match &self.outcome {
            Outcome::OperationResult(result) => Some(result),
            Outcome::ErrorInfo(_) => None,
        }
    }

    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match &self.outcome {
            Outcome::ErrorInfo(info) => Some(info),
            Outcome::OperationResult(_) => None,
        }
    }

    pub fn cause(&self) -> Option<&FailureCause> {
        self.cause.as_ref()
    }

    /// Whether the API was never reached because of a transport failure.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self.cause,
            Some(FailureCause {
                kind: FailureKind::Network,
                ..
            })
        )
    }
}

impl From<OperationResult> for CheckoutResult {
    fn from(result: OperationResult) -> Self {
        Self::from_operation(result)
    }
}

impl From<ErrorInfo> for CheckoutResult {
    fn from(info: ErrorInfo) -> Self {
        Self::from_error_info(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InteractionCode, InteractionReason};

    #[test]
    fn test_exactly_one_side_is_set() {
        let ok = CheckoutResult::from_operation(OperationResult::new("ok", Interaction::proceed_ok()));
        assert!(ok.operation_result().is_some());
        assert!(ok.error_info().is_none());

        let failed = CheckoutResult::client_side("missing operation link");
        assert!(failed.operation_result().is_none());
        assert!(failed.error_info().is_some());
        assert_eq!(failed.interaction(), &Interaction::client_side_error());
    }

    #[test]
    fn test_network_error_is_flagged() {
        let err = CheckoutError::Network("connection reset".into());
        let result = CheckoutResult::from_error(&err, FlowType::Load);

        assert!(result.is_network_failure());
        assert_eq!(result.interaction().code, InteractionCode::Abort);
        assert_eq!(
            result.interaction().reason,
            InteractionReason::CommunicationFailure
        );
    }

    #[test]
    fn test_api_error_is_verbatim() {
        let info = ErrorInfo::new(
            "declined",
            Interaction::new(InteractionCode::TryOtherAccount, InteractionReason::Declined),
        );
        let result = CheckoutResult::from_error(&CheckoutError::Api(info.clone()), FlowType::Process);

        assert!(!result.is_network_failure());
        assert_eq!(result.error_info(), Some(&info));
    }

    #[test]
    fn test_serialized_shape() {
        let result = CheckoutResult::from_operation(OperationResult::new("ok", Interaction::proceed_ok()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operationResult"]["interaction"]["code"], "PROCEED");
        assert!(json.get("errorInfo").is_none());
        assert!(json.get("cause").is_none());
    }
}
