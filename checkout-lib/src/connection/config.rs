//! Configuration for the Payment API connection and the checkout session.

use serde::{Deserialize, Serialize};

/// Media type spoken by the List and Operation APIs.
pub const PAYMENT_MEDIA_TYPE: &str = "application/vnd.optile.payment.enterprise-v1-extensible+json";

/// Configuration for [`HttpConnection`](super::HttpConnection).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `view` query appended to list URLs that do not carry one.
    #[serde(default = "default_list_view")]
    pub list_view: String,

    /// Value of the `Accept` and `Content-Type` headers.
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("checkout-rs/{}", env!("CARGO_PKG_VERSION"))
}

fn default_list_view() -> String {
    "jsonForms,-htmlForms".to_string()
}

fn default_media_type() -> String {
    PAYMENT_MEDIA_TYPE.to_string()
}

fn default_max_risk_error_len() -> usize {
    2000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            list_view: default_list_view(),
            media_type: default_media_type(),
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Settings for one checkout session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Self link of the list resource to load.
    pub list_url: String,

    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Prefix of the URL the host hands back after a redirect, e.g.
    /// `myshop://checkout/return`. Empty accepts any URL.
    #[serde(default)]
    pub redirect_return_prefix: String,

    /// Cap, in characters, for risk-provider error messages.
    #[serde(default = "default_max_risk_error_len")]
    pub max_risk_error_len: usize,
}

impl CheckoutConfig {
    pub fn new(list_url: impl Into<String>) -> Self {
        Self {
            list_url: list_url.into(),
            connection: ConnectionConfig::default(),
            redirect_return_prefix: String::new(),
            max_risk_error_len: default_max_risk_error_len(),
        }
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_redirect_return_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.redirect_return_prefix = prefix.into();
        self
    }
}
