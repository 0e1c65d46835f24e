//! Interaction decision table.
//!
//! Maps an interaction, the network-failure flag and the flow it came from to
//! the single action the orchestrator takes next. The same table serves list
//! loads, network and preset charges, updates and account deletion.

use serde::{Deserialize, Serialize};
use std::fmt;

use checkout_lib::model::{FlowType, Interaction, InteractionCode, InteractionReason};

/// What the orchestrator does with a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Offer retry or abort to the host.
    RetryableConnectionError,
    /// Tell the customer, keep the current session.
    ShowMessageThenKeepSession,
    /// Tell the customer, then load the session again.
    ShowMessageThenReloadSession,
    /// Load the session again without a message.
    ReloadSession,
    /// Deliver the result as a success.
    FinalizeSuccess,
    /// Deliver the result as a failure.
    FinalizeError,
}

impl Action {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalizeSuccess | Self::FinalizeError)
    }

    pub fn reloads(&self) -> bool {
        matches!(self, Self::ReloadSession | Self::ShowMessageThenReloadSession)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RetryableConnectionError => "retryable connection error",
            Self::ShowMessageThenKeepSession => "message, keep session",
            Self::ShowMessageThenReloadSession => "message, reload session",
            Self::ReloadSession => "reload session",
            Self::FinalizeSuccess => "finalize success",
            Self::FinalizeError => "finalize error",
        };
        f.write_str(label)
    }
}

/// Classifies one result.
pub fn classify(interaction: &Interaction, network_failure: bool, flow: FlowType) -> Action {
    if network_failure {
        return Action::RetryableConnectionError;
    }

    match (&interaction.code, flow) {
        (InteractionCode::Proceed, FlowType::Update) => match interaction.reason {
            InteractionReason::Pending => Action::ShowMessageThenKeepSession,
            _ => Action::ReloadSession,
        },
        (InteractionCode::Proceed, _) => Action::FinalizeSuccess,
        (InteractionCode::Reload, _) => Action::ReloadSession,
        // A list load has no session to keep.
        (InteractionCode::Retry, FlowType::Load) => Action::ShowMessageThenReloadSession,
        (InteractionCode::Retry, _) => Action::ShowMessageThenKeepSession,
        (InteractionCode::TryOtherAccount | InteractionCode::TryOtherNetwork, _) => {
            Action::ShowMessageThenReloadSession
        }
        _ => Action::FinalizeError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(code: InteractionCode, reason: InteractionReason) -> Interaction {
        Interaction::new(code, reason)
    }

    #[test]
    fn test_network_failure_wins() {
        for flow in [FlowType::Load, FlowType::Process, FlowType::Delete, FlowType::Update] {
            assert_eq!(
                classify(&Interaction::proceed_ok(), true, flow),
                Action::RetryableConnectionError
            );
        }
    }

    #[test]
    fn test_proceed() {
        let ok = Interaction::proceed_ok();
        let pending = interaction(InteractionCode::Proceed, InteractionReason::Pending);

        assert_eq!(classify(&ok, false, FlowType::Process), Action::FinalizeSuccess);
        assert_eq!(classify(&ok, false, FlowType::Delete), Action::FinalizeSuccess);
        assert_eq!(classify(&pending, false, FlowType::Process), Action::FinalizeSuccess);
        assert_eq!(classify(&ok, false, FlowType::Update), Action::ReloadSession);
        assert_eq!(
            classify(&pending, false, FlowType::Update),
            Action::ShowMessageThenKeepSession
        );
    }

    #[test]
    fn test_retry_depends_on_flow() {
        let retry = interaction(InteractionCode::Retry, InteractionReason::SystemFailure);
        assert_eq!(classify(&retry, false, FlowType::Process), Action::ShowMessageThenKeepSession);
        assert_eq!(classify(&retry, false, FlowType::Delete), Action::ShowMessageThenKeepSession);
        assert_eq!(classify(&retry, false, FlowType::Load), Action::ShowMessageThenReloadSession);
    }

    #[test]
    fn test_try_other_and_reload() {
        let declined = interaction(InteractionCode::TryOtherAccount, InteractionReason::Declined);
        let network = interaction(InteractionCode::TryOtherNetwork, InteractionReason::Blocked);
        let reload = interaction(InteractionCode::Reload, InteractionReason::Updated);

        assert_eq!(classify(&declined, false, FlowType::Process), Action::ShowMessageThenReloadSession);
        assert_eq!(classify(&network, false, FlowType::Update), Action::ShowMessageThenReloadSession);
        assert_eq!(classify(&reload, false, FlowType::Load), Action::ReloadSession);
        assert!(classify(&reload, false, FlowType::Process).reloads());
    }

    #[test]
    fn test_everything_else_finalizes_error() {
        let cases = [
            interaction(InteractionCode::Abort, InteractionReason::RiskDetected),
            interaction(InteractionCode::Verify, InteractionReason::CommunicationFailure),
            Interaction::client_side_error(),
            interaction(InteractionCode::Unknown("HOLD".into()), InteractionReason::Ok),
        ];
        for case in cases {
            let action = classify(&case, false, FlowType::Process);
            assert_eq!(action, Action::FinalizeError, "{case}");
            assert!(action.is_final());
        }
    }
}
