use super::*;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde_json::json;

fn analytics_against(server: &MockServer) -> FirebaseAnalytics {
    let client = ClientBuilder::new(Client::new()).build();
    FirebaseAnalytics::new_with_client(
        client,
        server.url("/mp/collect"),
        "G-TESTSTREAM",
        "1:1234567890:web:abc123def456",
    )
}

#[tokio::test]
async fn test_log_event_posts_collect_payload() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/mp/collect")
            .query_param("measurement_id", "G-TESTSTREAM")
            .query_param("api_secret", "shhh")
            .json_body_includes(
                r#"{
                    "client_id": "1.1234567890.web.abc123def456",
                    "events": [
                        {"name": "guide_opened", "params": {"guide_id": "reroll-snipers"}}
                    ]
                }"#,
            );
        then.status(204);
    });

    analytics
        .log_event("guide_opened", json!({"guide_id": "reroll-snipers"}))
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_log_event_carries_user_identity() {
    let server = MockServer::start();
    let mut analytics = analytics_against(&server).with_api_secret("shhh");
    analytics.set_user_id(Some("uid-1"));
    analytics.set_user_property("favorite_tier", "S");

    let mock = server.mock(|when, then| {
        when.method(POST).path("/mp/collect").json_body_includes(
            r#"{
                "user_id": "uid-1",
                "user_properties": {"favorite_tier": {"value": "S"}}
            }"#,
        );
        then.status(204);
    });

    analytics.log_event("session_start_custom", json!(null)).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_batch_limit_is_enforced_locally() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    let batch: Vec<(String, serde_json::Value)> = (0..26)
        .map(|i| (format!("event_{i}"), json!(null)))
        .collect();

    let err = analytics.log_events(batch).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::TooManyEvents(26)));
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    // No mock configured: any request would 404 and fail the call.
    analytics.log_events(Vec::new()).await.unwrap();
}

#[tokio::test]
async fn test_missing_api_secret_fails_before_sending() {
    let server = MockServer::start();
    let analytics = analytics_against(&server);

    let err = analytics
        .log_event("guide_opened", json!(null))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::NoApiSecret));
}

#[tokio::test]
async fn test_non_success_status_maps_to_api_error() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    server.mock(|when, then| {
        when.method(POST).path("/mp/collect");
        then.status(502);
    });

    let err = analytics
        .log_event("guide_opened", json!(null))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::Api(status) if status.as_u16() == 502));
}

#[tokio::test]
async fn test_event_name_validation() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    for bad in [
        "",
        "9starts_with_digit",
        "has space",
        "google_reserved",
        "ga_reserved",
        "firebase_reserved",
        "this_event_name_is_way_too_long_for_ga4_rules",
    ] {
        let err = analytics.log_event(bad, json!(null)).await.unwrap_err();
        assert!(
            matches!(err, AnalyticsError::InvalidEventName(_)),
            "expected {bad:?} to be rejected"
        );
    }
}

#[tokio::test]
async fn test_params_must_be_an_object() {
    let server = MockServer::start();
    let analytics = analytics_against(&server).with_api_secret("shhh");

    let err = analytics
        .log_event("guide_opened", json!("not-an-object"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidParams(_)));
}

#[test]
fn test_client_id_is_stable_and_colon_free() {
    let server = MockServer::start();
    let analytics = analytics_against(&server);
    assert_eq!(analytics.client_id(), "1.1234567890.web.abc123def456");
}
