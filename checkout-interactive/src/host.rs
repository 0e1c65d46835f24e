use serde::{Deserialize, Serialize};

use crate::session::PaymentSession;
use checkout_lib::model::{CheckoutResult, FlowType, Interaction};

/// What happens to the session after a message is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUp {
    KeepSession,
    ReloadSession,
}

/// Notifications from the orchestrator to the host application.
///
/// Called from the orchestrator task. Implementations must return quickly and
/// answer through the [`OrchestratorHandle`](crate::OrchestratorHandle), never
/// by blocking inside the callback.
pub trait CheckoutHost: Send + Sync {
    /// A session was loaded or re-entered; its cards may be shown.
    fn on_session_ready(&self, session: &PaymentSession);

    /// A card was dispatched.
    fn on_processing(&self, _card_key: &str) {}

    /// The customer should see `interaction`. The orchestrator does not wait.
    fn on_message(&self, interaction: &Interaction, follow_up: FollowUp);

    /// The API could not be reached. Answer with `retry()` or `abort()`.
    fn on_connection_error(&self, flow: FlowType);

    /// Final outcome. Called once per orchestrator.
    fn on_checkout_result(&self, result: CheckoutResult);
}
