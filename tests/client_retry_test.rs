mod common;

use amazon_pay_gateway::amazon::{Action, RequestParams, SignedRequestClient};
use amazon_pay_gateway::GatewayError;
use common::{action, gateway_config, param, API_PATH};
use mockito::{Matcher, Server};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

fn reference_params() -> RequestParams {
    let mut params = RequestParams::new();
    params.insert("AmazonOrderReferenceId".to_string(), "S01-4301752-9080047".to_string());
    params
}

#[tokio::test]
async fn test_request_is_signed_form() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", API_PATH)
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            action("GetOrderReferenceDetails"),
            param("AmazonOrderReferenceId", "S01-4301752-9080047"),
            param("AWSAccessKeyId", "ACCESS"),
            param("SellerId", "SELLER"),
            param("SignatureMethod", "HmacSHA256"),
            param("SignatureVersion", "2"),
            param("Version", "2013-01-01"),
            Matcher::Regex("Timestamp=\\d{4}-\\d{2}-\\d{2}T\\d{2}%3A\\d{2}%3A\\d{2}Z".into()),
            Matcher::Regex("Signature=[A-Za-z0-9%]+".into()),
        ]))
        .with_status(200)
        .with_body("<GetOrderReferenceDetailsResponse/>")
        .create_async()
        .await;

    let client = SignedRequestClient::new(gateway_config(&server.url()));
    let response = client
        .call(Action::GetOrderReferenceDetails, reference_params())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_service_unavailable_retried_until_exhausted() {
    let mut server = Server::new_async().await;
    let config = gateway_config(&server.url());
    let mock = server
        .mock("POST", API_PATH)
        .with_status(503)
        .with_body("<ErrorResponse><Error><Code>ServiceUnavailable</Code></Error></ErrorResponse>")
        .expect(config.max_retries as usize + 1)
        .create_async()
        .await;

    let client = SignedRequestClient::new(config.clone());
    let err = client
        .call(Action::Authorize, reference_params())
        .await
        .unwrap_err();

    match err {
        GatewayError::GatewayUnavailable {
            action,
            status,
            attempts,
        } => {
            assert_eq!(action, "Authorize");
            assert_eq!(status, 503);
            assert_eq!(attempts, config.max_retries + 1);
        }
        other => panic!("expected GatewayUnavailable, got {:?}", other),
    }
    assert!(client.config().max_retries > 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_internal_error_retried() {
    let mut server = Server::new_async().await;
    let mut config = gateway_config(&server.url());
    config.max_retries = 1;
    let mock = server
        .mock("POST", API_PATH)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let client = SignedRequestClient::new(config);
    let err = client
        .call(Action::Capture, RequestParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::GatewayUnavailable { status: 500, attempts: 2, .. }));
    assert!(err.is_transport());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", API_PATH)
        .with_status(400)
        .with_body(common::error_response("InvalidParameterValue", "Bad amount"))
        .expect(1)
        .create_async()
        .await;

    let client = SignedRequestClient::new(gateway_config(&server.url()));
    let response = client
        .call(Action::Authorize, reference_params())
        .await
        .unwrap();

    assert_eq!(response.status, 400);
    let err = response.remote_error();
    assert_eq!(err.code.as_deref(), Some("InvalidParameterValue"));
    assert_eq!(err.formatted(), "400 InvalidParameterValue: Bad amount");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_timeout() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        thread::sleep(Duration::from_secs(2));
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    });

    let mut config = gateway_config(&format!("http://{}:{}", addr.ip(), addr.port()));
    config.request_timeout = Duration::from_millis(200);

    let client = SignedRequestClient::new(config);
    let err = client
        .call(Action::ConfirmOrderReference, reference_params())
        .await
        .unwrap_err();

    match err {
        GatewayError::Timeout { action } => assert_eq!(action, "ConfirmOrderReference"),
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_while_reading_body() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let _ = stream.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: 100\r\n\r\n<Close",
        );
        let _ = stream.flush();
        thread::sleep(Duration::from_secs(2));
    });

    let mut config = gateway_config(&format!("http://{}:{}", addr.ip(), addr.port()));
    config.request_timeout = Duration::from_millis(300);

    let client = SignedRequestClient::new(config);
    let err = client
        .call(Action::CloseOrderReference, reference_params())
        .await
        .unwrap_err();

    match err {
        GatewayError::Timeout { action } => assert_eq!(action, "CloseOrderReference"),
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_response_headers_kept() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", API_PATH)
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_header("x-mws-request-id", "5f20169b-7ab2-11df-bcef-d35615e2b044")
        .with_body(common::CLOSE_OK)
        .create_async()
        .await;

    let client = SignedRequestClient::new(gateway_config(&server.url()));
    let response = client
        .call(Action::CloseOrderReference, reference_params())
        .await
        .unwrap();

    assert_eq!(
        response.header("X-Mws-Request-Id"),
        Some("5f20169b-7ab2-11df-bcef-d35615e2b044")
    );
    assert_eq!(response.content_type(), Some("text/xml"));
}

#[tokio::test]
async fn test_circuit_breaker_opens_after_failures() {
    let mut server = Server::new_async().await;
    let mut config = gateway_config(&server.url());
    config.max_retries = 0;
    let _mock = server
        .mock("POST", API_PATH)
        .with_status(503)
        .create_async()
        .await;

    let client = SignedRequestClient::with_circuit_breaker(config, 1, 60);
    assert_eq!(client.circuit_state(), "closed");

    let first = client.call(Action::Authorize, RequestParams::new()).await;
    assert!(matches!(first, Err(GatewayError::GatewayUnavailable { .. })));
    assert_eq!(client.circuit_state(), "open");

    let second = client.call(Action::Authorize, RequestParams::new()).await;
    assert!(matches!(second, Err(GatewayError::CircuitBreakerOpen(_))));
}

#[tokio::test]
async fn test_client_errors_keep_circuit_closed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", API_PATH)
        .with_status(404)
        .create_async()
        .await;

    let client = SignedRequestClient::with_circuit_breaker(gateway_config(&server.url()), 1, 60);
    for _ in 0..3 {
        let response = client
            .call(Action::GetCaptureDetails, RequestParams::new())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }
    assert_eq!(client.circuit_state(), "closed");
}
