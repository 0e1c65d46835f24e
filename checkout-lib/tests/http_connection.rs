//! Integration tests for the reqwest-backed Payment API connection.
//!
//! ```bash
//! cargo test -p checkout-lib --features http-connection --test http_connection
//! ```

#![cfg(feature = "http-connection")]

use checkout_lib::connection::{ConnectionConfig, HttpConnection, PaymentConnection, PAYMENT_MEDIA_TYPE};
use checkout_lib::model::{InteractionCode, InteractionReason, OperationType};
use checkout_lib::request::OperationRequest;
use checkout_lib::{CheckoutError, InputCategory, InputValues, ListResult, RequestData};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn list_body(server: &MockServer) -> serde_json::Value {
    json!({
        "links": {"self": format!("{}/lists/L1", server.uri())},
        "resultInfo": "1 applicable network",
        "interaction": {"code": "PROCEED", "reason": "OK"},
        "operationType": "CHARGE",
        "networks": {
            "applicable": [{
                "code": "VISA",
                "label": "Visa",
                "method": "CREDIT_CARD",
                "links": {"operation": format!("{}/lists/L1/VISA/charge", server.uri())}
            }]
        }
    })
}

fn connection() -> HttpConnection {
    HttpConnection::new(ConnectionConfig::default().with_timeout(2)).unwrap()
}

async fn mount_and_load_list(connection: &HttpConnection, server: &MockServer) -> ListResult {
    Mock::given(method("GET"))
        .and(path("/lists/L1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(server)))
        .mount(server)
        .await;
    connection
        .load_list(&format!("{}/lists/L1", server.uri()))
        .await
        .unwrap()
}

// ============================================================================
// List API
// ============================================================================

#[tokio::test]
async fn test_load_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists/L1"))
        .and(query_param("view", "jsonForms,-htmlForms"))
        .and(header("Accept", PAYMENT_MEDIA_TYPE))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&server)))
        .expect(1)
        .mount(&server)
        .await;

    let list = connection()
        .load_list(&format!("{}/lists/L1", server.uri()))
        .await
        .unwrap();

    assert_eq!(list.operation_type, Some(OperationType::Charge));
    assert_eq!(list.applicable_networks()[0].code, "VISA");
}

#[tokio::test]
async fn test_load_list_api_error_is_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lists/expired"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "resultInfo": "session expired",
            "interaction": {"code": "ABORT", "reason": "EXPIRED_SESSION"}
        })))
        .mount(&server)
        .await;

    let err = connection()
        .load_list(&format!("{}/lists/expired", server.uri()))
        .await
        .unwrap_err();

    match err {
        CheckoutError::Api(info) => {
            assert_eq!(info.interaction.code, InteractionCode::Abort);
            assert_eq!(info.interaction.reason, InteractionReason::ExpiredSession);
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_without_body_is_client_side() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = connection()
        .load_list(&format!("{}/lists/L1", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ClientSide(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_network_failure() {
    // Nothing listens on port 9 locally.
    let err = connection()
        .load_list("http://127.0.0.1:9/lists/L1")
        .await
        .unwrap_err();
    assert!(err.is_network_failure());
}

#[tokio::test]
async fn test_timeout_is_network_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_body(&server))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let connection = HttpConnection::new(ConnectionConfig::default().with_timeout(1)).unwrap();
    let err = connection
        .load_list(&format!("{}/lists/L1", server.uri()))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

// ============================================================================
// Operation API
// ============================================================================

#[tokio::test]
async fn test_post_operation_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/lists/L1/VISA/charge"))
        .and(header("Content-Type", PAYMENT_MEDIA_TYPE))
        .and(body_partial_json(json!({
            "account": {"number": "4111111111111111"},
            "autoRegistration": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultInfo": "approved",
            "interaction": {"code": "PROCEED", "reason": "OK"},
            "redirect": {
                "url": "https://shop.example.com/success",
                "method": "GET",
                "type": "SUMMARY"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connection = connection();
    let list = mount_and_load_list(&connection, &server).await;
    let values = InputValues::new()
        .with(InputCategory::Account, "number", "4111111111111111")
        .with(InputCategory::Registration, "autoRegistration", true);
    let request = RequestData::for_network(&list, &list.applicable_networks()[0], values).unwrap();
    let operation = OperationRequest::build(&request, None, Vec::new(), None).unwrap();

    let result = connection.post_operation(&operation).await.unwrap();
    assert_eq!(result.result_info, "approved");
    assert_eq!(result.redirect.unwrap().redirect_type.as_deref(), Some("SUMMARY"));
}

#[tokio::test]
async fn test_delete_account() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/accounts/acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultInfo": "deleted",
            "interaction": {"code": "PROCEED", "reason": "OK"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = connection()
        .delete_account(&format!("{}/accounts/acc-1", server.uri()))
        .await
        .unwrap();
    assert!(result.interaction.is_proceed());
}
