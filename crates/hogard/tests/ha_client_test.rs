//! Home Assistant client and light actions against a mock HTTP server.

use std::sync::Arc;

use hogard::config::AreasConfig;
use hogard::config::HomeAssistantConfig;
use hogard::AreaRegistry;
use hogard::Backend;
use hogard::BackendError;
use hogard::HaClient;
use hogard::LightActions;
use serde_json::json;
use wiremock::matchers::bearer_token;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn client(server: &MockServer, timeout_ms: u64) -> HaClient {
    HaClient::new(&HomeAssistantConfig {
        base_url: format!("{}/", server.uri()),
        token: "test-token".to_string(),
        timeout_ms,
    })
    .unwrap()
}

#[tokio::test]
async fn test_call_service_posts_payload_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_off"))
        .and(bearer_token("test-token"))
        .and(body_json(json!({ "entity_id": ["light.kitchen"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "entity_id": "light.kitchen", "state": "off" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, 5000)
        .call_service("light", "turn_off", &json!({ "entity_id": ["light.kitchen"] }))
        .await
        .unwrap();

    assert_eq!(result[0]["state"], "off");
}

#[tokio::test]
async fn test_get_state_parses_state_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/light.bedroom_ceiling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "light.bedroom_ceiling",
            "state": "on",
            "attributes": { "brightness": 255 },
            "last_changed": "2026-01-01T00:00:00+00:00"
        })))
        .mount(&server)
        .await;

    let state = client(&server, 5000)
        .get_state("light.bedroom_ceiling")
        .await
        .unwrap();

    assert_eq!(state.entity_id, "light.bedroom_ceiling");
    assert_eq!(state.state.as_deref(), Some("on"));
    assert_eq!(state.attributes["brightness"], 255);
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .mount(&server)
        .await;

    let err = client(&server, 5000).get_state("light.kitchen").await.unwrap_err();

    assert!(matches!(err, BackendError::Unauthorized));
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("{\"message\":\"extra keys not allowed\"}"),
        )
        .mount(&server)
        .await;

    let err = client(&server, 5000)
        .call_service("light", "turn_on", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error 400: {\"message\":\"extra keys not allowed\"}"
    );
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "state": "on" }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client(&server, 50).get_state("light.kitchen").await.unwrap_err();

    assert!(matches!(err, BackendError::Timeout(_)), "{:?}", err);
    assert_eq!(err.to_string(), "request timed out after 50 ms");
}

#[tokio::test]
async fn test_turn_on_sends_one_batched_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_json(json!({
            "entity_id": ["light.living_ceiling", "light.living_lamp"],
            "brightness_pct": 100,
            "rgb_color": [0, 0, 255]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let registry = Arc::new(AreaRegistry::new(&AreasConfig::default().areas));
    let actions = LightActions::new(registry, client(&server, 5000));

    let reply = actions.turn_on_lights("living", Some(150), Some("azul")).await;

    assert!(reply.contains("Luces encendidas en living"));
    assert!(reply.contains("100%"));
    assert!(reply.contains("azul"));
}

#[tokio::test]
async fn test_backend_rejection_becomes_reply_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let registry = Arc::new(AreaRegistry::new(&AreasConfig::default().areas));
    let actions = LightActions::new(registry, client(&server, 5000));

    assert_eq!(
        actions.set_brightness("cocina", 70).await,
        "Error ajustando brillo en cocina: Error 500: boom"
    );
}
