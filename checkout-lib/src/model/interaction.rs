use serde::{Deserialize, Serialize};

use super::api_enum;

api_enum! {
    /// Recommended next step returned by the Payment API.
    pub enum InteractionCode {
        /// The operation succeeded or the session may continue.
        Proceed => "PROCEED",
        /// Stop the checkout.
        Abort => "ABORT",
        /// Let the customer choose another network.
        TryOtherNetwork => "TRY_OTHER_NETWORK",
        /// Let the customer choose another account of the same network.
        TryOtherAccount => "TRY_OTHER_ACCOUNT",
        /// The same request may be retried.
        Retry => "RETRY",
        /// The session changed and must be loaded again.
        Reload => "RELOAD",
        /// The outcome is unknown and must be verified by the merchant.
        Verify => "VERIFY",
    }
}

api_enum! {
    /// Detail accompanying an [`InteractionCode`].
    pub enum InteractionReason {
        Ok => "OK",
        Pending => "PENDING",
        Trusted => "TRUSTED",
        StrongAuthentication => "STRONG_AUTHENTICATION",
        Declined => "DECLINED",
        Expired => "EXPIRED",
        ExceedsLimit => "EXCEEDS_LIMIT",
        TemporaryFailure => "TEMPORARY_FAILURE",
        UnknownReason => "UNKNOWN",
        NetworkFailure => "NETWORK_FAILURE",
        Blacklisted => "BLACKLISTED",
        Blocked => "BLOCKED",
        SystemFailure => "SYSTEM_FAILURE",
        InvalidAccount => "INVALID_ACCOUNT",
        Fraud => "FRAUD",
        AdditionalNetworks => "ADDITIONAL_NETWORKS",
        InvalidRequest => "INVALID_REQUEST",
        Scheduled => "SCHEDULED",
        NoNetworks => "NO_NETWORKS",
        DuplicateOperation => "DUPLICATE_OPERATION",
        Chargeback => "CHARGEBACK",
        RiskDetected => "RISK_DETECTED",
        CustomerAbort => "CUSTOMER_ABORT",
        ExpiredSession => "EXPIRED_SESSION",
        ExpiredAccount => "EXPIRED_ACCOUNT",
        AccountNotActivated => "ACCOUNT_NOT_ACTIVATED",
        TrustedCustomer => "TRUSTED_CUSTOMER",
        UnknownCustomer => "UNKNOWN_CUSTOMER",
        Activated => "ACTIVATED",
        Updated => "UPDATED",
        TakeAction => "TAKE_ACTION",
        /// Synthesized locally when the API could not be reached.
        CommunicationFailure => "COMMUNICATION_FAILURE",
        /// Synthesized locally when client state prevented the request.
        ClientsideError => "CLIENTSIDE_ERROR",
    }
}

/// A `(code, reason)` pair. Present on every terminal or error response and
/// drives all branching in the checkout flow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interaction {
    pub code: InteractionCode,
    pub reason: InteractionReason,
}

impl Interaction {
    pub fn new(code: InteractionCode, reason: InteractionReason) -> Self {
        Self { code, reason }
    }

    /// `ABORT / CLIENTSIDE_ERROR`, used for every local failure.
    pub fn client_side_error() -> Self {
        Self::new(InteractionCode::Abort, InteractionReason::ClientsideError)
    }

    /// `PROCEED / OK`.
    pub fn proceed_ok() -> Self {
        Self::new(InteractionCode::Proceed, InteractionReason::Ok)
    }

    pub fn is_proceed(&self) -> bool {
        self.code == InteractionCode::Proceed
    }
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.code, self.reason)
    }
}
