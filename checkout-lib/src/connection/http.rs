//! reqwest implementation of [`PaymentConnection`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{ConnectionConfig, PaymentConnection};
use crate::model::{ErrorInfo, ListResult, OperationResult};
use crate::request::OperationRequest;
use crate::{CheckoutError, Result};

/// Payment API client over HTTPS.
pub struct HttpConnection {
    config: ConnectionConfig,
    client: reqwest::Client,
}

impl HttpConnection {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckoutError::client_side(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Appends the configured `view` query unless the URL already has one.
    fn list_url(&self, url: &str) -> Result<Url> {
        let mut url = Url::parse(url)?;
        if !url.query_pairs().any(|(key, _)| key == "view") {
            url.query_pairs_mut().append_pair("view", &self.config.list_view);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCEPT, &self.config.media_type)
            .header(USER_AGENT, &self.config.user_agent)
    }

    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| {
                CheckoutError::Serialization(format!("failed to parse Payment API response: {}", e))
            });
        }

        // Error statuses carry an ErrorInfo whenever the API itself rejected
        // the request.
        match serde_json::from_slice::<ErrorInfo>(&bytes) {
            Ok(info) => Err(CheckoutError::Api(info)),
            Err(_) => Err(CheckoutError::client_side(format!(
                "unexpected HTTP status {} without error description",
                status.as_u16()
            ))),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CheckoutError {
    if err.is_decode() {
        CheckoutError::Serialization(err.to_string())
    } else if err.is_builder() {
        CheckoutError::client_side(err.to_string())
    } else {
        // Connect, timeout, request and body errors never reached the API.
        CheckoutError::Network(err.to_string())
    }
}

#[async_trait]
impl PaymentConnection for HttpConnection {
    #[tracing::instrument(skip(self))]
    async fn load_list(&self, url: &str) -> Result<ListResult> {
        let url = self.list_url(url)?;
        self.send(self.request(reqwest::Method::GET, url)).await
    }

    #[tracing::instrument(skip(self, request), fields(network = %request.network_code, url = %request.url))]
    async fn post_operation(&self, request: &OperationRequest) -> Result<OperationResult> {
        let url = Url::parse(&request.url)?;
        let body = serde_json::to_vec(&request.body)?;
        let builder = self
            .request(reqwest::Method::POST, url)
            .header(CONTENT_TYPE, &self.config.media_type)
            .body(body);
        self.send(builder).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, url: &str) -> Result<OperationResult> {
        let url = Url::parse(url)?;
        self.send(self.request(reqwest::Method::DELETE, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_url_appends_view_once() {
        let connection = HttpConnection::new(ConnectionConfig::default()).unwrap();

        let url = connection.list_url("https://api.example.com/lists/l1").unwrap();
        assert_eq!(url.query(), Some("view=jsonForms%2C-htmlForms"));

        let url = connection
            .list_url("https://api.example.com/lists/l1?view=jsonForms")
            .unwrap();
        assert_eq!(url.query(), Some("view=jsonForms"));
    }

    #[test]
    fn test_relative_list_url_is_rejected() {
        let connection = HttpConnection::new(ConnectionConfig::default()).unwrap();
        assert!(matches!(
            connection.list_url("/lists/l1"),
            Err(CheckoutError::InvalidData { .. })
        ));
    }
}
