use httpmock::prelude::*;
use sdr_agent::config::endpoints::Endpoint;
use sdr_agent::config::{AppConfig, AuthScheme};
use sdr_agent::core::playground::{self, FormValues};
use sdr_agent::{AgentHiveClient, AppError, Command, Router, SessionState};
use serde_json::{json, Value};
use std::time::Duration;

fn client(server: &MockServer) -> AgentHiveClient {
    AgentHiveClient::new(
        server.url("/api/v1/run"),
        "test-key",
        AuthScheme::ApiKey,
        Duration::from_secs(5),
    )
}

fn form(value: Value) -> FormValues {
    value.as_object().cloned().unwrap()
}

fn flow_reply(message: &str) -> Value {
    json!({
        "session_id": "s-1",
        "outputs": [{"inputs": {}, "outputs": [{"messages": [{"message": message}]}]}]
    })
}

#[tokio::test]
async fn test_market_intelligence_request_shape() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/run/market-intelligence")
            .header("x-api-key", "test-key")
            .header("content-type", "application/json")
            .json_body(json!({
                "output_type": "chat",
                "input_type": "chat",
                "input_value": "{\"Company\":\"Acme\",\"Industry\":\"SaaS\"}"
            }));
        then.status(200)
            .json_body(flow_reply("Summary:\n```json\n{\"market_size\": \"large\"}\n```"));
    });

    let response = playground::call(
        &client(&server),
        Endpoint::MarketIntelligence,
        &form(json!({"Company": "Acme", "Industry": "SaaS"})),
    )
    .await
    .unwrap();

    api_mock.assert();
    assert_eq!(response.status, 200);
    assert_eq!(response.endpoint, "market_intelligence");
    assert_eq!(response.processed, Some(json!({"market_size": "large"})));
    assert_eq!(response.data["session_id"], json!("s-1"));
}

#[tokio::test]
async fn test_enrichment_renames_manual_fields() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/run/lead-enrichment")
            .json_body(json!({
                "output_type": "chat",
                "input_type": "chat",
                "input_value": "{\"Company Name\":\"Acme\",\"Company Domain\":\"acme.com\"}"
            }));
        then.status(200).json_body(flow_reply("no structured data"));
    });

    let response = playground::call(
        &client(&server),
        Endpoint::Enrichment,
        &form(json!({"company_name": "Acme", "company_domain": "acme.com"})),
    )
    .await
    .unwrap();

    api_mock.assert();
    assert!(response.processed.is_none());
    assert_eq!(response.content(), Some("no structured data"));
    assert_eq!(response.display_value(), &response.data);
}

#[tokio::test]
async fn test_icp_profiling_merges_defaults_and_tweaks() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/run/icp-profiling")
            .body_contains("product_context")
            .body_contains("target_icp")
            .body_contains("GoogleGenerativeAIModel-r4iC7");
        then.status(200)
            .json_body(flow_reply("```json\n{\"icp_score\": 4, \"fit\": \"strong\"}\n```"));
    });

    let response = playground::call(
        &client(&server),
        Endpoint::IcpProfiling,
        &form(json!({"domain": "acme.com", "enriched_lead": {"Company": "Acme"}})),
    )
    .await
    .unwrap();

    api_mock.assert();
    assert_eq!(response.processed.unwrap()["icp_score"], json!(4));
}

#[tokio::test]
async fn test_engagement_signal_sends_plain_url() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/run/linkedin-posts")
            .json_body(json!({
                "output_type": "chat",
                "input_type": "chat",
                "input_value": "https://www.linkedin.com/in/jane/",
                "tweaks": {"GoogleGenerativeAIModel-pmAtd": {"model_name": "gemini-2.5-flash"}}
            }));
        then.status(200).json_body(flow_reply(
            "```json\n{\"person_name\": \"Jane\", \"engagement_signal_summary\": \"posts weekly\", \"posts\": []}\n```",
        ));
    });

    let response = playground::call(
        &client(&server),
        Endpoint::EngagementSignal,
        &form(json!({"url": "https://www.linkedin.com/in/jane/"})),
    )
    .await
    .unwrap();

    api_mock.assert();
    assert_eq!(
        response.processed,
        Some(json!({"person_name": "Jane", "engagement_signal_summary": "posts weekly"}))
    );
}

#[tokio::test]
async fn test_validation_failure_sends_no_request() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api/v1/run/champion-scoring");
        then.status(200).json_body(json!({}));
    });

    let err = playground::call(
        &client(&server),
        Endpoint::ChampionScoring,
        &form(json!({"linkedin_url": "https://www.linkedin.com/in/jane/"})),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::ValidationError { ref field, .. } if field == "icp_result"));
    api_mock.assert_hits(0);
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/run/champion-scoring");
        then.status(401).json_body(json!({"detail": "invalid api key"}));
    });

    let err = playground::call(
        &client(&server),
        Endpoint::ChampionScoring,
        &form(json!({
            "linkedin_url": "https://www.linkedin.com/in/jane/",
            "icp_result": {"icp_score": 3}
        })),
    )
    .await
    .unwrap_err();

    match err {
        AppError::ApiError { status, message } => {
            assert_eq!(status, Some(401));
            assert!(message.contains("invalid api key"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_router_stores_last_response_in_session() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/api/v1/run/market-intelligence");
        then.status(200)
            .json_body(flow_reply("```json\n{\"trend\": \"up\", \"hiring\": true}\n```"));
    });

    let router = Router::new(AppConfig::default()).with_client(client(&server));
    let mut session = SessionState::new();
    let output = router
        .dispatch(
            Command::Call {
                endpoint: Endpoint::MarketIntelligence,
                input: r#"{"Company": "Acme"}"#.to_string(),
            },
            &mut session,
        )
        .await
        .unwrap();

    api_mock.assert();
    assert!(output.contains("\"trend\": \"up\""));

    let stored = session.last_response(Endpoint::MarketIntelligence).unwrap();
    assert_eq!(stored.processed, Some(json!({"trend": "up", "hiring": true})));

    let shown = router
        .dispatch_line("show last_response.market_intelligence", &mut session)
        .await
        .unwrap();
    assert!(shown.contains("\"status\": 200"));
}

#[tokio::test]
async fn test_router_reads_input_from_file() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/run/lead-enrichment")
            .body_contains("Example Corp");
        then.status(200).json_body(flow_reply("ok"));
    });

    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("lead.json");
    std::fs::write(&input, r#"{"Company Name": "Example Corp"}"#).unwrap();

    let router = Router::new(AppConfig::default()).with_client(client(&server));
    router
        .dispatch_line(&format!("enrich @{}", input.display()), &mut SessionState::new())
        .await
        .unwrap();

    api_mock.assert();
}
