//! Integration tests for the provider request executor and the dispatcher.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the happy path, template substitution and
//! URL encoding, the default POST body, header merging, error capture,
//! timeout behavior, and both fallback policies.

use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orchid_shipping::config::TRACKING_TOKEN;
use orchid_shipping::{
    Carrier, FallbackPolicy, ProviderClient, ProviderEndpoint, ProviderResult, ShippingConfig,
    ShippingError, Tracker,
};

fn test_client() -> ProviderClient {
    ProviderClient::new(5, "orchid-test/0.1").expect("failed to build test ProviderClient")
}

fn get_endpoint(url_template: String) -> ProviderEndpoint {
    ProviderEndpoint {
        url_template,
        method: reqwest::Method::GET,
        headers: Vec::new(),
        body_template: None,
    }
}

fn tracker_for(carrier: Carrier, endpoint: ProviderEndpoint, policy: FallbackPolicy) -> Tracker {
    let mut config = ShippingConfig::default();
    config.set_endpoint(carrier, endpoint);
    Tracker::new(test_client(), config, policy)
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unconfigured_endpoint_returns_mocked_with_placeholder_events() {
    let client = test_client();
    let result = client.execute("FLASH", None, "TH123", &[]).await;

    match result {
        ProviderResult::Mocked { warning, events } => {
            assert!(
                warning.contains("FLASH_TRACK_URL"),
                "warning should name the missing slot: {warning}"
            );
            assert!(!events.is_empty(), "mocked result carries a placeholder");
            assert_eq!(events[0].status.as_deref(), Some("Mocked"));
        }
        other => panic!("expected Mocked, got: {other:?}"),
    }
}

#[tokio::test]
async fn get_request_substitutes_and_encodes_the_tracking_number() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/track"))
        .and(query_param("no", "TH 1/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"events": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client();
    let endpoint = get_endpoint(format!("{}/track?no={TRACKING_TOKEN}", server.uri()));
    let result = client.execute("FLASH", Some(&endpoint), "TH 1/2", &[]).await;

    assert!(
        matches!(result, ProviderResult::Ok { .. }),
        "expected Ok, got: {result:?}"
    );
}

#[tokio::test]
async fn post_without_body_template_sends_default_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/track"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"tracking": "JNT001"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({"data": {"track": [{"status": "ok"}]}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client();
    let endpoint = ProviderEndpoint {
        url_template: format!("{}/track", server.uri()),
        method: reqwest::Method::POST,
        headers: Vec::new(),
        body_template: None,
    };
    let result = client.execute("JNT", Some(&endpoint), "JNT001", &[]).await;

    let ProviderResult::Ok { body } = result else {
        panic!("expected Ok, got: {result:?}");
    };
    assert_eq!(body["data"]["track"][0]["status"], "ok");
}

#[tokio::test]
async fn post_body_template_substitutes_without_url_encoding() {
    let server = MockServer::start().await;

    // The raw tracking number (with a space) must appear unencoded in the body.
    Mock::given(method("POST"))
        .and(path("/track"))
        .and(body_string(r#"{"billcode": "TH 99"}"#.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"events": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client();
    let endpoint = ProviderEndpoint {
        url_template: format!("{}/track", server.uri()),
        method: reqwest::Method::POST,
        headers: Vec::new(),
        body_template: Some(format!(r#"{{"billcode": "{TRACKING_TOKEN}"}}"#)),
    };
    let result = client.execute("JNT", Some(&endpoint), "TH 99", &[]).await;

    assert!(
        matches!(result, ProviderResult::Ok { .. }),
        "expected Ok, got: {result:?}"
    );
}

#[tokio::test]
async fn extra_headers_override_configured_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/track"))
        .and(header("authorization", "Bearer from-extra"))
        .and(header("x-static", "configured"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"events": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client();
    let endpoint = ProviderEndpoint {
        url_template: format!("{}/track", server.uri()),
        method: reqwest::Method::GET,
        headers: vec![
            ("X-Static".to_string(), "configured".to_string()),
            ("Authorization".to_string(), "Bearer from-config".to_string()),
        ],
        body_template: None,
    };
    let extra = vec![(
        "Authorization".to_string(),
        "Bearer from-extra".to_string(),
    )];
    let result = client.execute("THAI_POST", Some(&endpoint), "EG1TH", &extra).await;

    assert!(
        matches!(result, ProviderResult::Ok { .. }),
        "expected Ok, got: {result:?}"
    );
}

#[tokio::test]
async fn unparseable_body_is_captured_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = test_client();
    let endpoint = get_endpoint(format!("{}/track", server.uri()));
    let result = client.execute("FLASH", Some(&endpoint), "X", &[]).await;

    assert!(
        matches!(result, ProviderResult::Error { .. }),
        "expected Error, got: {result:?}"
    );
}

#[tokio::test]
async fn connection_failure_is_captured_as_error() {
    // Unroutable port: the server is never started.
    let client = test_client();
    let endpoint = get_endpoint("http://127.0.0.1:9/track?no={tracking}".to_string());
    let result = client.execute("FLASH", Some(&endpoint), "X", &[]).await;

    assert!(
        matches!(result, ProviderResult::Error { .. }),
        "expected Error, got: {result:?}"
    );
}

#[tokio::test]
async fn slow_provider_hits_the_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({"events": []}))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = ProviderClient::new(1, "orchid-test/0.1").expect("client");
    let endpoint = get_endpoint(format!("{}/track", server.uri()));
    let result = client.execute("FLASH", Some(&endpoint), "X", &[]).await;

    let ProviderResult::Error { message } = result else {
        panic!("expected Error, got: {result:?}");
    };
    assert!(!message.is_empty(), "timeout must surface an error message");
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn track_normalizes_aliases_and_extracts_events() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/open/v1/track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": {"track": [{"time": "2025-09-20T08:00:00Z", "status": "Out for delivery", "branch": "Lat Phrao"}]}
        })))
        .mount(&server)
        .await;

    let tracker = tracker_for(
        Carrier::Flash,
        get_endpoint(format!("{}/open/v1/track?no={TRACKING_TOKEN}", server.uri())),
        FallbackPolicy::MockOnError,
    );
    let outcome = tracker
        .track("FLASH EXPRESS", "TH01234567")
        .await
        .expect("track succeeds");

    assert_eq!(outcome.provider, "Flash");
    assert_eq!(outcome.tracking, "TH01234567");
    let events = outcome.events.expect("events extracted");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status.as_deref(), Some("Out for delivery"));
    assert_eq!(events[0].location.as_deref(), Some("Lat Phrao"));
    assert!(outcome.warning.is_none());
}

#[tokio::test]
async fn track_rejects_unknown_carriers() {
    let tracker = Tracker::new(
        test_client(),
        ShippingConfig::default(),
        FallbackPolicy::MockOnError,
    );
    let err = tracker.track("DHL", "123").await.unwrap_err();
    assert!(
        matches!(err, ShippingError::UnsupportedCarrier(ref c) if c == "DHL"),
        "expected UnsupportedCarrier, got: {err:?}"
    );
}

#[tokio::test]
async fn track_reports_not_implemented_for_kerry_and_ninjavan() {
    let tracker = Tracker::new(
        test_client(),
        ShippingConfig::default(),
        FallbackPolicy::MockOnError,
    );
    for alias in ["kerry", "Ninja Van"] {
        let err = tracker.track(alias, "123").await.unwrap_err();
        assert!(
            matches!(err, ShippingError::NotImplemented(_)),
            "expected NotImplemented for {alias}, got: {err:?}"
        );
    }
}

#[tokio::test]
async fn unconfigured_carrier_tracks_as_mocked() {
    let tracker = Tracker::new(
        test_client(),
        ShippingConfig::default(),
        FallbackPolicy::MockOnError,
    );
    let outcome = tracker.track("flash", "X1").await.expect("mocked outcome");

    assert_eq!(outcome.provider, "Flash");
    let events = outcome.events.expect("placeholder events");
    assert_eq!(events[0].status.as_deref(), Some("Mocked"));
    let warning = outcome.warning.expect("warning present");
    assert!(warning.contains("FLASH_TRACK_URL"), "warning: {warning}");
}

#[tokio::test]
async fn provider_error_falls_back_to_placeholder_by_default() {
    let tracker = tracker_for(
        Carrier::Flash,
        get_endpoint("http://127.0.0.1:9/track".to_string()),
        FallbackPolicy::MockOnError,
    );
    let outcome = tracker.track("flash", "X1").await.expect("fallback outcome");

    let events = outcome.events.expect("placeholder events");
    assert_eq!(
        events[0].status.as_deref(),
        Some("Provider unavailable - mocked")
    );
    let warning = outcome.warning.expect("warning present");
    assert!(
        warning.starts_with("Provider error:"),
        "warning: {warning}"
    );
}

#[tokio::test]
async fn provider_error_surfaces_under_strict_policy() {
    let tracker = tracker_for(
        Carrier::Flash,
        get_endpoint("http://127.0.0.1:9/track".to_string()),
        FallbackPolicy::Strict,
    );
    let err = tracker.track("flash", "X1").await.unwrap_err();

    assert!(
        matches!(err, ShippingError::ProviderFailed { carrier: "Flash", .. }),
        "expected ProviderFailed, got: {err:?}"
    );
}

#[tokio::test]
async fn thai_post_attaches_bearer_key_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post/track"))
        .and(header("authorization", "Bearer thai-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"events": [{"status": "รับฝาก"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ShippingConfig::default();
    config.set_endpoint(
        Carrier::ThaiPost,
        get_endpoint(format!("{}/post/track?barcode={TRACKING_TOKEN}", server.uri())),
    );
    config.thai_api_key = Some("thai-key".to_string());
    let tracker = Tracker::new(test_client(), config, FallbackPolicy::MockOnError);

    let outcome = tracker.track("ไปรษณีย์ไทย", "EG123456789TH").await.expect("track");
    assert_eq!(outcome.provider, "ไปรษณีย์ไทย");
    let events = outcome.events.expect("events");
    assert_eq!(events[0].status.as_deref(), Some("รับฝาก"));
}

#[tokio::test]
async fn unrecognized_shape_yields_no_events_but_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"ok": true})))
        .mount(&server)
        .await;

    let tracker = tracker_for(
        Carrier::Jnt,
        get_endpoint(format!("{}/track", server.uri())),
        FallbackPolicy::MockOnError,
    );
    let outcome = tracker.track("J&T", "JNT1").await.expect("track");

    assert!(outcome.events.is_none(), "shape is unrecognized");
    assert!(outcome.warning.is_none());
}

#[tokio::test]
async fn fetch_events_swallows_failures() {
    let tracker = tracker_for(
        Carrier::Kerry,
        get_endpoint("http://127.0.0.1:9/track".to_string()),
        FallbackPolicy::Strict,
    );

    // Request failure: None, no error.
    assert!(tracker.fetch_events(Carrier::Kerry, "KRY1").await.is_none());
    // Unconfigured carrier: mocked internally, still None.
    assert!(tracker.fetch_events(Carrier::Flash, "X").await.is_none());
}

#[tokio::test]
async fn fetch_events_works_for_carriers_without_track_integration() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kerry/track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "tracking_history": [{"status_time": "t", "status_description": "Delivered"}]
        })))
        .mount(&server)
        .await;

    let tracker = tracker_for(
        Carrier::Kerry,
        get_endpoint(format!("{}/kerry/track?no={TRACKING_TOKEN}", server.uri())),
        FallbackPolicy::MockOnError,
    );

    let events = tracker
        .fetch_events(Carrier::Kerry, "KRY123")
        .await
        .expect("events");
    assert_eq!(events[0].status.as_deref(), Some("Delivered"));
}
