//! Payment session built from a loaded list.

use checkout_lib::model::{
    AccountRegistration, ApplicableNetwork, ErrorInfo, Interaction, InteractionCode,
    InteractionReason, ListResult, PresetAccount,
};
use checkout_lib::services::PaymentServiceRegistry;
use checkout_lib::{CheckoutError, InputValues, RequestData, Result};

const NETWORK_PREFIX: &str = "network:";
const ACCOUNT_PREFIX: &str = "account:";
const PRESET_KEY: &str = "preset";

/// Something the customer can pay with.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentCard {
    /// A network accepting a newly entered account.
    Network(ApplicableNetwork),
    /// A registered account. Can be deleted.
    Account(AccountRegistration),
    /// The preset account of a PRESET list, charged directly.
    Preset(PresetAccount),
}

impl PaymentCard {
    /// Stable key the host passes back to select or delete this card.
    pub fn key(&self) -> String {
        match self {
            Self::Network(network) => format!("{}{}", NETWORK_PREFIX, network.code),
            Self::Account(account) => format!(
                "{}{}",
                ACCOUNT_PREFIX,
                account.self_link().unwrap_or(&account.code)
            ),
            Self::Preset(_) => PRESET_KEY.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Network(network) => &network.code,
            Self::Account(account) => &account.code,
            Self::Preset(preset) => &preset.code,
        }
    }

    pub fn payment_method(&self) -> &str {
        match self {
            Self::Network(network) => &network.method,
            Self::Account(account) => &account.method,
            Self::Preset(preset) => &preset.method,
        }
    }

    /// Provider codes backing the card, used for service resolution.
    pub fn providers(&self) -> &[String] {
        match self {
            Self::Network(network) => &network.providers,
            _ => &[],
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Network(network) => &network.label,
            Self::Account(account) => account
                .masked_account
                .as_ref()
                .and_then(|masked| masked.display_label.as_deref())
                .unwrap_or(&account.label),
            Self::Preset(preset) => preset
                .masked_account
                .as_ref()
                .and_then(|masked| masked.display_label.as_deref())
                .unwrap_or(&preset.code),
        }
    }

    /// Only registered accounts with a self link can be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Account(account) if account.self_link().is_some())
    }

    /// Builds the request for submitting this card with `input`.
    pub fn request_data(&self, list: &ListResult, input: InputValues) -> Result<RequestData> {
        match self {
            Self::Network(network) => RequestData::for_network(list, network, input),
            Self::Account(account) => RequestData::for_account(list, account, input),
            Self::Preset(preset) => RequestData::for_preset(list, preset, input),
        }
    }
}

/// A validated list and the cards the registry can serve.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentSession {
    list: ListResult,
    cards: Vec<PaymentCard>,
}

impl PaymentSession {
    /// Validates `list` and keeps the cards some payment service supports.
    ///
    /// A list whose interaction is not PROCEED fails with that interaction.
    /// A list left without cards fails with ABORT/NO_NETWORKS.
    pub fn build(list: ListResult, services: &PaymentServiceRegistry) -> Result<Self> {
        if list.interaction.code != InteractionCode::Proceed {
            return Err(CheckoutError::Api(ErrorInfo::new(
                list.result_info.clone(),
                list.interaction.clone(),
            )));
        }
        if list.operation_type.is_none() {
            return Err(CheckoutError::client_side("list has no operationType"));
        }

        let candidates = list
            .preset_account
            .iter()
            .cloned()
            .map(PaymentCard::Preset)
            .chain(list.accounts.iter().cloned().map(PaymentCard::Account))
            .chain(list.applicable_networks().iter().cloned().map(PaymentCard::Network));

        let mut cards = Vec::new();
        for card in candidates {
            if services.supports(card.code(), card.payment_method(), card.providers()) {
                cards.push(card);
            } else {
                tracing::debug!(network = card.code(), "no payment service, card hidden");
            }
        }

        if cards.is_empty() {
            return Err(CheckoutError::Api(ErrorInfo::new(
                "no supported payment networks",
                Interaction::new(InteractionCode::Abort, InteractionReason::NoNetworks),
            )));
        }

        Ok(Self { list, cards })
    }

    pub fn list(&self) -> &ListResult {
        &self.list
    }

    pub fn cards(&self) -> &[PaymentCard] {
        &self.cards
    }

    pub fn card(&self, key: &str) -> Option<&PaymentCard> {
        self.cards.iter().find(|card| card.key() == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.cards.iter().map(PaymentCard::key).collect()
    }

    pub fn is_update(&self) -> bool {
        self.list.is_update()
    }
}
