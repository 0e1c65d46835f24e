//! Per-action request data and the operation body built from it.
//!
//! A [`RequestData`] is built fresh for every user action and is immutable
//! once dispatched. [`OperationRequest::build`] merges its input values, the
//! session's extra elements and the collected risk data into the body posted
//! to the Operation API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{
    AccountRegistration, ApplicableNetwork, ExtraElements, Links, ListResult, OperationType,
    PresetAccount, ProviderParameters, LINK_OPERATION, LINK_SELF,
};
use crate::{CheckoutError, Result};

/// Category that decides where an input value lands in the operation body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputCategory {
    /// Merged into `account{}` (number, expiryMonth, holderName, ...).
    Account,
    /// `autoRegistration` / `allowRecurrence` flags.
    Registration,
    /// Extra-element checkboxes, merged into `checkboxes{}`.
    ExtraElement,
}

/// Registration flag names accepted under [`InputCategory::Registration`].
pub const AUTO_REGISTRATION: &str = "autoRegistration";
pub const ALLOW_RECURRENCE: &str = "allowRecurrence";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputValue {
    pub category: InputCategory,
    pub name: String,
    pub value: Value,
}

/// Values entered by the customer, keyed by `(category, name)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputValues {
    values: Vec<InputValue>,
}

impl InputValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous value with the same key.
    pub fn put(&mut self, category: InputCategory, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self
            .values
            .iter_mut()
            .find(|v| v.category == category && v.name == name)
        {
            Some(existing) => existing.value = value,
            None => self.values.push(InputValue {
                category,
                name,
                value,
            }),
        }
    }

    /// Builder form of [`put`](Self::put).
    pub fn with(mut self, category: InputCategory, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(category, name, value);
        self
    }

    pub fn get(&self, category: InputCategory, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| v.category == category && v.name == name)
            .map(|v| &v.value)
    }

    pub fn category(&self, category: InputCategory) -> impl Iterator<Item = &InputValue> {
        self.values.iter().filter(move |v| v.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything needed to submit one operation for a selected network,
/// registered account or preset account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub list_operation_type: OperationType,
    pub network_code: String,
    pub payment_method: String,
    pub operation_type: OperationType,
    pub links: Links,
    #[serde(default)]
    pub input_values: InputValues,
}

impl RequestData {
    /// Request for a newly entered account of an applicable network.
    pub fn for_network(list: &ListResult, network: &ApplicableNetwork, input_values: InputValues) -> Result<Self> {
        let list_operation_type = list_operation_type(list)?;
        Ok(Self {
            operation_type: list_operation_type.clone(),
            list_operation_type,
            network_code: network.code.clone(),
            payment_method: network.method.clone(),
            links: network.links.clone(),
            input_values,
        })
    }

    /// Request for a registered account, used for charges and deletion.
    pub fn for_account(list: &ListResult, account: &AccountRegistration, input_values: InputValues) -> Result<Self> {
        let list_operation_type = list_operation_type(list)?;
        Ok(Self {
            operation_type: list_operation_type.clone(),
            list_operation_type,
            network_code: account.code.clone(),
            payment_method: account.method.clone(),
            links: account.links.clone(),
            input_values,
        })
    }

    /// Request charging the preset account of a PRESET list.
    pub fn for_preset(list: &ListResult, preset: &PresetAccount, input_values: InputValues) -> Result<Self> {
        Ok(Self {
            list_operation_type: list_operation_type(list)?,
            network_code: preset.code.clone(),
            payment_method: preset.method.clone(),
            operation_type: OperationType::Charge,
            links: preset.links.clone(),
            input_values,
        })
    }

    pub fn link(&self, name: &str) -> Option<&str> {
        self.links.get(name).map(String::as_str)
    }

    pub fn operation_link(&self) -> Result<&str> {
        self.link(LINK_OPERATION).ok_or_else(|| {
            CheckoutError::client_side(format!("missing operation link for {}", self.network_code))
        })
    }

    pub fn self_link(&self) -> Result<&str> {
        self.link(LINK_SELF).ok_or_else(|| {
            CheckoutError::client_side(format!("missing self link for {}", self.network_code))
        })
    }
}

fn list_operation_type(list: &ListResult) -> Result<OperationType> {
    list.operation_type
        .clone()
        .ok_or_else(|| CheckoutError::client_side("list has no operationType"))
}

/// Browser/device characteristics forwarded for 3-D Secure risk scoring.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_width: Option<u32>,
}

/// Body posted to an operation link.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_request: Option<ProviderParameters>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_requests: Vec<ProviderParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkboxes: Option<BTreeMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_registration: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_recurrence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_data: Option<BrowserData>,
}

/// An operation addressed to a URL, together with the identity of what it
/// was built for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub url: String,
    pub network_code: String,
    pub payment_method: String,
    pub operation_type: OperationType,
    pub body: Operation,
}

impl OperationRequest {
    /// Builds the submission for `request`.
    ///
    /// Forced extra-element checkboxes are always sent as checked, other
    /// checkboxes fall back to their preselected state when the customer
    /// left them untouched.
    pub fn build(
        request: &RequestData,
        extra_elements: Option<&ExtraElements>,
        risk_requests: Vec<ProviderParameters>,
        browser_data: Option<BrowserData>,
    ) -> Result<Self> {
        let url = request.operation_link()?.to_string();
        let values = &request.input_values;

        let account: Map<String, Value> = values
            .category(InputCategory::Account)
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();

        let mut body = Operation {
            account: (!account.is_empty()).then_some(account),
            provider_requests: risk_requests,
            auto_registration: registration_flag(values, AUTO_REGISTRATION)?,
            allow_recurrence: registration_flag(values, ALLOW_RECURRENCE)?,
            browser_data,
            ..Operation::default()
        };

        if let Some(elements) = extra_elements {
            let mut checkboxes = BTreeMap::new();
            for element in elements.iter() {
                let Some(checkbox) = &element.checkbox else {
                    continue;
                };
                let checked = if checkbox.mode.is_forced() {
                    true
                } else {
                    match values.get(InputCategory::ExtraElement, &element.name) {
                        Some(value) => as_bool(&element.name, value)?,
                        None => checkbox.mode.preselected(),
                    }
                };
                checkboxes.insert(element.name.clone(), checked);
            }
            if !checkboxes.is_empty() {
                body.checkboxes = Some(checkboxes);
            }
        }

        Ok(Self {
            url,
            network_code: request.network_code.clone(),
            payment_method: request.payment_method.clone(),
            operation_type: request.operation_type.clone(),
            body,
        })
    }
}

fn registration_flag(values: &InputValues, name: &str) -> Result<Option<bool>> {
    values
        .get(InputCategory::Registration, name)
        .map(|value| as_bool(name, value))
        .transpose()
}

fn as_bool(name: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| CheckoutError::invalid_data(name, "expected a boolean"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Checkbox, CheckboxMode, ExtraElement, Interaction, Networks, Parameter};

    fn visa() -> ApplicableNetwork {
        let mut links = Links::new();
        links.insert(LINK_OPERATION.into(), "https://api.example.com/lists/l1/VISA/charge".into());
        ApplicableNetwork {
            code: "VISA".into(),
            label: "Visa".into(),
            method: "CREDIT_CARD".into(),
            grouping: None,
            registration: None,
            recurrence: None,
            redirect: false,
            links,
            providers: Vec::new(),
        }
    }

    fn list() -> ListResult {
        ListResult {
            links: Links::new(),
            result_info: String::new(),
            interaction: Interaction::proceed_ok(),
            operation_type: Some(OperationType::Charge),
            accounts: Vec::new(),
            networks: Networks {
                applicable: vec![visa()],
            },
            preset_account: None,
            extra_elements: None,
            risk_providers: Vec::new(),
        }
    }

    fn checkbox(name: &str, mode: CheckboxMode) -> ExtraElement {
        ExtraElement {
            name: name.into(),
            label: String::new(),
            checkbox: Some(Checkbox {
                mode,
                required_message: None,
            }),
        }
    }

    #[test]
    fn test_input_values_replace_same_key() {
        let mut values = InputValues::new();
        values.put(InputCategory::Account, "number", "4111");
        values.put(InputCategory::Account, "number", "4242");
        values.put(InputCategory::ExtraElement, "number", true);

        assert_eq!(values.get(InputCategory::Account, "number"), Some(&Value::from("4242")));
        assert_eq!(values.category(InputCategory::Account).count(), 1);
        assert_eq!(values.get(InputCategory::ExtraElement, "number"), Some(&Value::from(true)));
    }

    #[test]
    fn test_request_identity_reaches_operation() {
        let request = RequestData::for_network(&list(), &visa(), InputValues::new()).unwrap();
        let operation = OperationRequest::build(&request, None, Vec::new(), None).unwrap();

        assert_eq!(operation.network_code, "VISA");
        assert_eq!(operation.payment_method, "CREDIT_CARD");
        assert_eq!(operation.operation_type, OperationType::Charge);
        assert_eq!(operation.url, "https://api.example.com/lists/l1/VISA/charge");
    }

    #[test]
    fn test_missing_operation_type_is_client_side() {
        let mut list = list();
        list.operation_type = None;
        let err = RequestData::for_network(&list, &visa(), InputValues::new()).unwrap_err();
        assert!(matches!(err, CheckoutError::ClientSide(_)));
    }

    #[test]
    fn test_missing_operation_link_is_client_side() {
        let mut network = visa();
        network.links.clear();
        let request = RequestData::for_network(&list(), &network, InputValues::new()).unwrap();
        let err = OperationRequest::build(&request, None, Vec::new(), None).unwrap_err();
        assert!(matches!(err, CheckoutError::ClientSide(_)));
    }

    #[test]
    fn test_input_values_merge_by_category() {
        let values = InputValues::new()
            .with(InputCategory::Account, "number", "4111111111111111")
            .with(InputCategory::Account, "holderName", "Ada Lovelace")
            .with(InputCategory::Registration, AUTO_REGISTRATION, true)
            .with(InputCategory::ExtraElement, "newsletter", true);
        let request = RequestData::for_network(&list(), &visa(), values).unwrap();

        let elements = ExtraElements {
            top: vec![checkbox("terms", CheckboxMode::Forced)],
            bottom: vec![
                checkbox("newsletter", CheckboxMode::Optional),
                checkbox("offers", CheckboxMode::OptionalPreselected),
            ],
        };
        let risk = vec![ProviderParameters::new("ACME", None)
            .with_parameters(vec![Parameter::new("score", "1")])];

        let operation = OperationRequest::build(&request, Some(&elements), risk, None).unwrap();
        let body = serde_json::to_value(&operation.body).unwrap();

        assert_eq!(body["account"]["number"], "4111111111111111");
        assert_eq!(body["account"]["holderName"], "Ada Lovelace");
        assert_eq!(body["autoRegistration"], true);
        assert!(body.get("allowRecurrence").is_none());
        assert_eq!(body["checkboxes"]["terms"], true);
        assert_eq!(body["checkboxes"]["newsletter"], true);
        assert_eq!(body["checkboxes"]["offers"], true);
        assert_eq!(body["providerRequests"][0]["providerCode"], "ACME");
    }

    #[test]
    fn test_forced_checkbox_ignores_input() {
        let values = InputValues::new().with(InputCategory::ExtraElement, "terms", false);
        let request = RequestData::for_network(&list(), &visa(), values).unwrap();
        let elements = ExtraElements {
            top: vec![checkbox("terms", CheckboxMode::ForcedDisplayed)],
            bottom: Vec::new(),
        };

        let operation = OperationRequest::build(&request, Some(&elements), Vec::new(), None).unwrap();
        assert_eq!(operation.body.checkboxes.unwrap()["terms"], true);
    }

    #[test]
    fn test_non_boolean_registration_flag_is_rejected() {
        let values = InputValues::new().with(InputCategory::Registration, ALLOW_RECURRENCE, "yes");
        let request = RequestData::for_network(&list(), &visa(), values).unwrap();
        let err = OperationRequest::build(&request, None, Vec::new(), None).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidData { .. }));
    }
}
