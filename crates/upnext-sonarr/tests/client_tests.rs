//! HTTP-mocked tests for the Sonarr client.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use upnext_sonarr::{SonarrClient, SonarrConfig, SonarrError};

fn config_for(server: &MockServer) -> SonarrConfig {
    SonarrConfig {
        url: server.uri(),
        api_key: "secret".to_string(),
        api_key_in_url: false,
        username: None,
        password: None,
    }
}

fn calendar_episode() -> serde_json::Value {
    json!({
        "id": 42,
        "title": "Pilot",
        "seasonNumber": 1,
        "episodeNumber": 1,
        "airDateUtc": "2024-01-01T00:00:00Z",
        "runtime": 45,
        "monitored": true,
        "series": {
            "title": "Test Show",
            "network": "HBO",
            "tvdbId": 121361,
            "tmdbId": 1399,
            "imdbId": "tt0944947",
            "images": []
        }
    })
}

#[tokio::test]
async fn calendar_sends_window_and_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .and(header("X-Api-Key", "secret"))
        .and(query_param("start", "2023-12-31T23:00:00Z"))
        .and(query_param("end", "2024-01-01T23:00:00Z"))
        .and(query_param("unmonitored", "false"))
        .and(query_param("includeSeries", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([calendar_episode()])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SonarrClient::new(config_for(&server));
    let start = "2023-12-31T23:00:00Z".parse().unwrap();
    let end = "2024-01-01T23:00:00Z".parse().unwrap();

    let episodes = client.calendar(start, end, false).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].id, 42);
    assert_eq!(episodes[0].series.title, "Test Show");
}

#[tokio::test]
async fn calendar_supports_api_key_in_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .and(query_param("apikey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.api_key_in_url = true;
    let client = SonarrClient::new(config);

    let now = chrono::Utc::now();
    let episodes = client.calendar(now, now, false).await.unwrap();
    assert!(episodes.is_empty());
}

#[tokio::test]
async fn unauthorized_maps_to_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = SonarrClient::new(config_for(&server));
    let now = chrono::Utc::now();

    let err = client.calendar(now, now, false).await.unwrap_err();
    assert!(matches!(err, SonarrError::Rejected));
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SonarrClient::new(config_for(&server));
    let now = chrono::Utc::now();

    let err = client.calendar(now, now, false).await.unwrap_err();
    assert!(matches!(err, SonarrError::Status(status) if status.as_u16() == 500));
}

#[tokio::test]
async fn missing_episode_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SonarrClient::new(config_for(&server));

    let err = client.episode(42).await.unwrap_err();
    assert!(matches!(err, SonarrError::NotFound));
}

#[tokio::test]
async fn episode_refetch_decodes_fresh_state() {
    let server = MockServer::start().await;

    let mut body = calendar_episode();
    body["monitored"] = json!(false);

    Mock::given(method("GET"))
        .and(path("/api/v3/calendar/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = SonarrClient::new(config_for(&server));

    let episode = client.episode(42).await.unwrap();
    assert_eq!(episode.id, 42);
    assert!(!episode.monitored);
}

#[tokio::test]
async fn basic_auth_is_sent_when_configured() {
    let server = MockServer::start().await;

    // "user:pass" base64-encoded.
    Mock::given(method("GET"))
        .and(path("/api/v3/calendar"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.username = Some("user".to_string());
    config.password = Some("pass".to_string());
    let client = SonarrClient::new(config);

    let now = chrono::Utc::now();
    client.calendar(now, now, false).await.unwrap();
}
