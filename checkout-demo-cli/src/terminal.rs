//! Host and redirect launcher backed by the terminal.
//!
//! Both forward to the command loop over a channel; the orchestrator never
//! waits on a prompt.

use checkout_interactive::{CheckoutHost, FollowUp, PaymentCard, PaymentSession};
use checkout_lib::model::{CheckoutResult, FlowType, HttpMethod, Interaction};
use checkout_lib::redirect::{RedirectLauncher, RedirectRequest};
use tokio::sync::mpsc;

const CARD_METHODS: &[&str] = &["CREDIT_CARD", "DEBIT_CARD"];

/// What the command loop reacts to.
#[derive(Debug)]
pub enum UiEvent {
    SessionReady(Vec<CardView>),
    Processing(String),
    Message(Interaction, FollowUp),
    ConnectionError(FlowType),
    Redirect { url: String, form: Vec<(String, String)> },
    Finished(CheckoutResult),
}

/// Card as shown in the picker.
#[derive(Clone, Debug)]
pub struct CardView {
    pub key: String,
    pub label: String,
    pub payment_method: String,
    pub deletable: bool,
    /// A new card number must be entered.
    pub needs_card_details: bool,
    /// A registered card asks for its verification code again.
    pub needs_verification: bool,
}

impl From<&PaymentCard> for CardView {
    fn from(card: &PaymentCard) -> Self {
        let is_card = CARD_METHODS.contains(&card.payment_method());
        Self {
            key: card.key(),
            label: card.label().to_string(),
            payment_method: card.payment_method().to_string(),
            deletable: card.is_deletable(),
            needs_card_details: is_card && matches!(card, PaymentCard::Network(_)),
            needs_verification: is_card && matches!(card, PaymentCard::Account(_)),
        }
    }
}

pub struct TerminalHost {
    events: mpsc::UnboundedSender<UiEvent>,
}

impl TerminalHost {
    pub fn new(events: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { events }
    }

    fn send(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("command loop gone, dropping host event");
        }
    }
}

impl CheckoutHost for TerminalHost {
    fn on_session_ready(&self, session: &PaymentSession) {
        self.send(UiEvent::SessionReady(
            session.cards().iter().map(CardView::from).collect(),
        ));
    }

    fn on_processing(&self, card_key: &str) {
        self.send(UiEvent::Processing(card_key.to_string()));
    }

    fn on_message(&self, interaction: &Interaction, follow_up: FollowUp) {
        self.send(UiEvent::Message(interaction.clone(), follow_up));
    }

    fn on_connection_error(&self, flow: FlowType) {
        self.send(UiEvent::ConnectionError(flow));
    }

    fn on_checkout_result(&self, result: CheckoutResult) {
        self.send(UiEvent::Finished(result));
    }
}

/// Prints the redirect for the user to open in a browser.
pub struct TerminalLauncher {
    events: mpsc::UnboundedSender<UiEvent>,
}

impl TerminalLauncher {
    pub fn new(events: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { events }
    }
}

impl RedirectLauncher for TerminalLauncher {
    fn can_open(&self, request: &RedirectRequest) -> bool {
        matches!(request.url().scheme(), "http" | "https")
    }

    fn open(&self, request: &RedirectRequest) -> checkout_lib::Result<()> {
        let form = match request.method() {
            HttpMethod::Post => request
                .form_parameters()
                .iter()
                .map(|p| (p.name.clone(), p.value.clone().unwrap_or_default()))
                .collect(),
            _ => Vec::new(),
        };
        self.events
            .send(UiEvent::Redirect {
                url: request.url().to_string(),
                form,
            })
            .map_err(|_| checkout_lib::CheckoutError::client_side("terminal closed"))
    }
}
