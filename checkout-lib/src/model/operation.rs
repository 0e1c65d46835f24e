use serde::{Deserialize, Serialize};

use super::{api_enum, Interaction, Links};

/// A name/value pair, as used by redirects and provider blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Parameters exchanged with, or on behalf of, a third-party provider.
///
/// Lists carry these for risk providers to initialize; operations carry one
/// block per risk provider in `providerRequests`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderParameters {
    pub provider_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ProviderParameters {
    pub fn new(provider_code: impl Into<String>, provider_type: Option<String>) -> Self {
        Self {
            provider_code: provider_code.into(),
            provider_type,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

api_enum! {
    /// HTTP method the browser must use to follow a redirect.
    pub enum HttpMethod {
        Get => "GET",
        Post => "POST",
    }
}

/// Out-of-band interaction required to complete an operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, rename = "suppressIFrame")]
    pub suppress_iframe: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub redirect_type: Option<String>,
}

/// Outcome of a single operation attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    #[serde(default)]
    pub result_info: String,
    pub interaction: Interaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<ProviderParameters>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl OperationResult {
    pub fn new(result_info: impl Into<String>, interaction: Interaction) -> Self {
        Self {
            result_info: result_info.into(),
            interaction,
            redirect: None,
            provider_response: None,
            links: Links::new(),
        }
    }
}

/// Error description, either returned by the API or synthesized locally when
/// a client-side or network failure prevents reaching it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(default)]
    pub result_info: String,
    pub interaction: Interaction,
}

impl ErrorInfo {
    pub fn new(result_info: impl Into<String>, interaction: Interaction) -> Self {
        Self {
            result_info: result_info.into(),
            interaction,
        }
    }
}
