use serde::{Deserialize, Serialize};

use super::{api_enum, Interaction, Links, ProviderParameters, Redirect, LINK_OPERATION, LINK_SELF};

api_enum! {
    /// Kind of operation a list session was opened for.
    pub enum OperationType {
        Charge => "CHARGE",
        Payout => "PAYOUT",
        Update => "UPDATE",
        Preset => "PRESET",
        Activation => "ACTIVATION",
    }
}

api_enum! {
    /// How an extra-element checkbox is presented and submitted.
    pub enum CheckboxMode {
        Optional => "OPTIONAL",
        OptionalPreselected => "OPTIONAL_PRESELECTED",
        Required => "REQUIRED",
        RequiredPreselected => "REQUIRED_PRESELECTED",
        /// Not shown; always submitted as checked.
        Forced => "FORCED",
        /// Shown read-only; always submitted as checked.
        ForcedDisplayed => "FORCED_DISPLAYED",
    }
}

impl CheckboxMode {
    /// Forced checkboxes are submitted as checked regardless of user input.
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::Forced | Self::ForcedDisplayed)
    }

    /// Initial checked state before the customer interacts with it.
    pub fn preselected(&self) -> bool {
        matches!(
            self,
            Self::OptionalPreselected | Self::RequiredPreselected | Self::Forced | Self::ForcedDisplayed
        )
    }
}

/// Payment session as returned by `GET <listURL>`.
///
/// Created by the session load and superseded, never mutated, by each reload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub result_info: String,
    pub interaction: Interaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<AccountRegistration>,
    #[serde(default)]
    pub networks: Networks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_account: Option<PresetAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_elements: Option<ExtraElements>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_providers: Vec<ProviderParameters>,
}

impl ListResult {
    /// URL of this list resource.
    pub fn self_link(&self) -> Option<&str> {
        self.links.get(LINK_SELF).map(String::as_str)
    }

    pub fn applicable_networks(&self) -> &[ApplicableNetwork] {
        &self.networks.applicable
    }

    pub fn is_update(&self) -> bool {
        self.operation_type == Some(OperationType::Update)
    }
}

/// Container for the networks applicable to a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub applicable: Vec<ApplicableNetwork>,
}

/// A payment network the customer may pick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableNetwork {
    pub code: String,
    #[serde(default)]
    pub label: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    /// Whether the network completes through an out-of-band redirect.
    #[serde(default)]
    pub redirect: bool,
    #[serde(default)]
    pub links: Links,
    /// Provider codes that back this network, used for service resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
}

impl ApplicableNetwork {
    pub fn operation_link(&self) -> Option<&str> {
        self.links.get(LINK_OPERATION).map(String::as_str)
    }
}

/// Masked details of a stored account, for display only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
}

/// A previously registered account of the customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRegistration {
    pub code: String,
    #[serde(default)]
    pub label: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_account: Option<MaskedAccount>,
    #[serde(default)]
    pub links: Links,
}

impl AccountRegistration {
    /// URL used to deregister the account.
    pub fn self_link(&self) -> Option<&str> {
        self.links.get(LINK_SELF).map(String::as_str)
    }

    pub fn operation_link(&self) -> Option<&str> {
        self.links.get(LINK_OPERATION).map(String::as_str)
    }
}

/// An account pre-selected for a direct charge without user selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetAccount {
    pub code: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_account: Option<MaskedAccount>,
    #[serde(default)]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

impl PresetAccount {
    pub fn operation_link(&self) -> Option<&str> {
        self.links.get(LINK_OPERATION).map(String::as_str)
    }
}

/// Merchant-defined labels and checkboxes shown around the payment form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraElements {
    #[serde(default)]
    pub top: Vec<ExtraElement>,
    #[serde(default)]
    pub bottom: Vec<ExtraElement>,
}

impl ExtraElements {
    /// All elements, top first.
    pub fn iter(&self) -> impl Iterator<Item = &ExtraElement> {
        self.top.iter().chain(self.bottom.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtraElement {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<Checkbox>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkbox {
    pub mode: CheckboxMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InteractionCode;
    use serde_json::json;

    #[test]
    fn test_list_result_parses_minimal_payload() {
        let list: ListResult = serde_json::from_value(json!({
            "links": {"self": "https://api.example.com/lists/abc"},
            "resultInfo": "2 applicable networks",
            "interaction": {"code": "PROCEED", "reason": "OK"},
            "operationType": "CHARGE",
            "networks": {"applicable": [
                {"code": "VISA", "label": "Visa", "method": "CREDIT_CARD",
                 "links": {"operation": "https://api.example.com/lists/abc/VISA/charge"}},
                {"code": "PAYPAL", "method": "WALLET", "redirect": true, "providers": ["PAYPAL"]}
            ]}
        }))
        .unwrap();

        assert_eq!(list.self_link(), Some("https://api.example.com/lists/abc"));
        assert_eq!(list.interaction.code, InteractionCode::Proceed);
        assert_eq!(list.operation_type, Some(OperationType::Charge));
        assert_eq!(list.applicable_networks().len(), 2);
        assert!(list.applicable_networks()[1].redirect);
        assert!(list.accounts.is_empty());
        assert!(list.preset_account.is_none());
    }

    #[test]
    fn test_checkbox_modes() {
        assert!(CheckboxMode::Forced.is_forced());
        assert!(CheckboxMode::ForcedDisplayed.preselected());
        assert!(!CheckboxMode::Required.preselected());
        assert!(!CheckboxMode::OptionalPreselected.is_forced());
    }

    #[test]
    fn test_extra_elements_iterate_top_first() {
        let elements: ExtraElements = serde_json::from_value(json!({
            "top": [{"name": "terms", "checkbox": {"mode": "REQUIRED"}}],
            "bottom": [{"name": "newsletter", "checkbox": {"mode": "OPTIONAL"}}]
        }))
        .unwrap();
        let names: Vec<_> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["terms", "newsletter"]);
    }
}
