mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use chat_client::service::ConfigPatch;
use chat_client::transport::TransportError;
use chat_client::{ErrorKind, MessageSource};
use common::{network_error, ok_reply, service_with, test_config, MockTransport, Step};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_blank_message_never_reaches_the_network() {
    let transport = MockTransport::always(ok_reply(r#"{"response": "hi"}"#));
    let service = service_with(test_config(), transport.clone());

    for message in ["", "   ", "\n\t"] {
        let err = service.send_to_local(message).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.is_retryable());

        let err = service.send_to_remote(message).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = service.send_to_research(message).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_unconfigured_remote_endpoint_is_a_config_error() {
    let transport = MockTransport::always(ok_reply(r#"{"response": "hi"}"#));
    let mut config = test_config();
    config.remote_endpoint = None;
    let service = service_with(config, transport.clone());

    let err = service.send_to_remote("hello").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.message(), "Remote endpoint not configured");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_local_reply_is_formatted() {
    let transport = MockTransport::always(ok_reply(
        r#"{"response": "Revenue: $5M\n- Grew 10%\n- Beat estimates"}"#,
    ));
    let service = service_with(test_config(), transport.clone());

    let reply = service.send_to_local("How did Q3 go?").await.unwrap();

    assert_eq!(reply.source, MessageSource::Local);
    assert_eq!(
        reply.content,
        "<div class=\"kv\"><strong>Revenue:</strong> <span>$5M</span></div>\n\
         <ul>\n<li>Grew 10%</li>\n<li>Beat estimates</li>\n</ul>"
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_str(), "http://127.0.0.1:8080/invocations");
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_sends_the_same_prompt() {
    let transport = MockTransport::scripted([
        network_error(),
        Step::Respond(503, ""),
        ok_reply(r#"{"response": "done"}"#),
    ]);
    let service = service_with(test_config(), transport.clone());

    service.send_to_local("What moved the market?").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, json!({"prompt": "What moved the market?"}));
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_network_errors_are_retried_with_exponential_backoff() {
    let transport = MockTransport::scripted([
        network_error(),
        network_error(),
        ok_reply(r#"{"response": "recovered"}"#),
    ]);
    let service = service_with(test_config(), transport.clone());

    let reply = service.send_to_local("hello").await.unwrap();

    assert_eq!(reply.content, "<p>recovered</p>");
    assert_eq!(transport.call_count(), 3);
    assert_eq!(
        transport.gaps(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_client_error_is_not_retried() {
    let transport = MockTransport::always(Step::Respond(400, ""));
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status_code(), Some(400));
    assert!(!err.is_retryable());
    assert_eq!(err.message(), "HTTP 400: Bad Request");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_exhaust_retries() {
    let transport = MockTransport::always(Step::Respond(500, ""));
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_remote("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status_code(), Some(500));
    assert!(err.is_retryable());
    assert_eq!(transport.call_count(), 3);
    assert_eq!(
        transport.requests()[0].url.as_str(),
        "https://remote.example.com/chat"
    );
}

#[tokio::test(start_paused = true)]
async fn test_last_error_is_the_one_returned() {
    let transport = MockTransport::scripted([
        Step::Respond(500, ""),
        Step::Respond(429, ""),
        Step::Respond(502, ""),
    ]);
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.status_code(), Some(502));
    assert_eq!(err.message(), "HTTP 502: Bad Gateway");
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_means_one_attempt() {
    let transport = MockTransport::always(network_error());
    let mut config = test_config();
    config.max_retries = 0;
    let service = service_with(config, transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_produces_retryable_timeout() {
    let transport = MockTransport::always(Step::Hang);
    let mut config = test_config();
    config.max_retries = 1;
    let service = service_with(config, transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_retryable());
    assert_eq!(transport.call_count(), 2);
    // 5s deadline on the first attempt, then a 1s backoff
    assert_eq!(transport.gaps(), vec![Duration::from_secs(6)]);
}

#[tokio::test(start_paused = true)]
async fn test_transport_timeout_is_classified_as_timeout() {
    let transport = MockTransport::scripted([
        Step::Fail(TransportError::Timeout),
        ok_reply(r#"{"response": "ok"}"#),
    ]);
    let service = service_with(test_config(), transport.clone());

    service.send_to_local("hello").await.unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_error_field_in_success_response() {
    let transport = MockTransport::always(ok_reply(r#"{"error": "model overloaded"}"#));
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.message(), "model overloaded");
    assert_eq!(err.status_code(), None);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_response_field_is_malformed() {
    let transport = MockTransport::always(ok_reply(r#"{"status": "ok"}"#));
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_local("hello").await.unwrap_err();

    assert_eq!(err.message(), "Invalid response format: missing response field");
    assert!(!err.is_retryable());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_research_maps_proxy_envelope() {
    let transport = MockTransport::always(ok_reply(
        r#"{"content": "<p>Rates are flat</p>", "timestamp": "2025-01-02T03:04:05Z", "source": "bedrock-agent"}"#,
    ));
    let service = service_with(test_config(), transport.clone());

    let reply = service.send_to_research("Where are rates going?").await.unwrap();

    assert_eq!(reply.content, "<p>Rates are flat</p>");
    assert_eq!(reply.source, MessageSource::Bedrock);
    assert_eq!(reply.timestamp.to_rfc3339(), "2025-01-02T03:04:05+00:00");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_str(), "http://localhost:3000/api/research");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"query": "Where are rates going?"}));
}

#[tokio::test]
async fn test_research_failure_uses_proxy_message_and_is_not_retried() {
    let transport = MockTransport::always(Step::Respond(
        500,
        r#"{"error": "Bedrock Agent not found. Please verify the Agent Runtime ARN is correct and the agent is deployed."}"#,
    ));
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_research("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status_code(), Some(500));
    assert!(err.is_retryable());
    assert!(err.message().starts_with("Bedrock Agent not found"));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_research_failure_without_body_uses_status_line() {
    let transport = MockTransport::always(Step::Respond(400, ""));
    let service = service_with(test_config(), transport);

    let err = service.send_to_research("hello").await.unwrap_err();
    assert_eq!(err.message(), "HTTP 400: Bad Request");
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_research_timeout_is_reported_as_408() {
    let transport = MockTransport::always(Step::Hang);
    let service = service_with(test_config(), transport.clone());

    let err = service.send_to_research("hello").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.status_code(), Some(408));
    assert!(err.is_retryable());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_update_config_merges_headers() {
    let transport = MockTransport::always(ok_reply(r#"{"response": "hi"}"#));
    let mut service = service_with(test_config(), transport.clone());

    service.update_config(ConfigPatch {
        max_retries: Some(5),
        headers: BTreeMap::from([("X-Api-Key".to_string(), "secret".to_string())]),
        ..ConfigPatch::default()
    });

    assert_eq!(service.config().max_retries, 5);
    assert_eq!(service.config().headers.len(), 2);

    service.send_to_local("hello").await.unwrap();
    let request = &transport.requests()[0];
    assert_eq!(request.headers["X-Api-Key"], "secret");
    assert_eq!(request.headers["Content-Type"], "application/json");
}
