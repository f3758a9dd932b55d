use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use skycast::api::AppState;
use skycast::config::Config;
use skycast::entities::{prelude::*, weather_cache};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(provider_url: &str) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // In-memory sqlite is per-connection; keep the pool at one.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;
    config.provider.api_key = "test-key".to_string();
    config.provider.base_url = provider_url.to_string();
    config
}

async fn spawn_app(provider_url: &str) -> (Router, Arc<AppState>) {
    let state = skycast::api::create_app_state_from_config(test_config(provider_url))
        .await
        .expect("Failed to create app state");
    let app = skycast::api::router(state.clone()).await;
    (app, state)
}

async fn register(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": email, "password": "password123" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    response
        .headers()
        .get("set-cookie")
        .expect("Expected a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn current_body(city: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "data": [{
            "city_name": city,
            "country_code": "PT",
            "temp": temp,
            "app_temp": temp - 0.5,
            "weather": { "description": "Few clouds" },
            "wind_spd": 4.2,
            "rh": 61.0,
            "aqi": 34.0,
            "ob_time": "2026-08-25 10:00"
        }]
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "data": [{
            "datetime": "2026-08-26",
            "max_temp": 27.0,
            "min_temp": 17.5,
            "weather": { "description": "Clear sky" },
            "precip": 0.0,
            "uv": 7.2,
            "wind_cdir_full": "north-northwest",
            "wind_spd": 3.6
        }]
    })
}

async fn mount_provider(server: &MockServer, city: &str, temp: f64, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(city, temp)))
        .expect(expected_calls)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn search(app: &Router, cookie: &str, city: &str, country: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/weather/search")
                .header("Cookie", cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "city": city, "country": country }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_search_returns_current_and_forecast() {
    let server = MockServer::start().await;
    mount_provider(&server, "Lisbon", 21.3, 1).await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let response = search(&app, &cookie, "Lisbon", "PT").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["current_weather"]["city_name"], "Lisbon");
    assert_eq!(json["data"]["current_weather"]["temp"], 21.3);
    assert_eq!(json["data"]["forecast"][0]["datetime"], "2026-08-26");
    assert!(json["data"]["search_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_repeat_search_hits_cache_and_keeps_one_history_row() {
    let server = MockServer::start().await;
    // Provider must be called exactly once; the second search is served
    // from the cache and the history row is bumped, not duplicated.
    mount_provider(&server, "Lisbon", 21.3, 1).await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let first = body_json(search(&app, &cookie, "Lisbon", "PT").await).await;
    let second = body_json(search(&app, &cookie, "Lisbon", "PT").await).await;

    assert_eq!(first["data"]["search_id"], second["data"]["search_id"]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["city"], "Lisbon");
}

#[tokio::test]
async fn test_whitespace_variants_reuse_the_same_search_row() {
    let server = MockServer::start().await;
    mount_provider(&server, "Lisbon", 21.3, 1).await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let first = body_json(search(&app, &cookie, "Lisbon", "PT").await).await;
    let second = body_json(search(&app, &cookie, "  Lisbon  ", " PT ").await).await;

    assert_eq!(first["data"]["search_id"], second["data"]["search_id"]);
}

#[tokio::test]
async fn test_stale_cache_is_refreshed() {
    let server = MockServer::start().await;
    mount_provider(&server, "Lisbon", 21.3, 2).await;

    let (app, state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let first = body_json(search(&app, &cookie, "Lisbon", "PT").await).await;
    let search_id = i32::try_from(first["data"]["search_id"].as_i64().unwrap()).unwrap();

    // Backdate the cache entry past the 10-minute freshness window.
    let stale = (chrono::Utc::now() - chrono::Duration::minutes(10)).to_rfc3339();
    let row = WeatherCache::find_by_id(search_id)
        .one(&state.store().conn)
        .await
        .unwrap()
        .expect("cache entry should exist after a search");
    let mut active: weather_cache::ActiveModel = row.into();
    active.last_fetched = Set(stale);
    active.update(&state.store().conn).await.unwrap();

    let response = search(&app, &cookie, "Lisbon", "PT").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Both mocks now expect two calls; verified on MockServer drop.
}

#[tokio::test]
async fn test_refresh_uses_saved_search_and_checks_ownership() {
    let server = MockServer::start().await;
    mount_provider(&server, "Lisbon", 21.3, 1).await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let owner = register(&app, "owner@example.com").await;
    let other = register(&app, "other@example.com").await;

    let first = body_json(search(&app, &owner, "Lisbon", "PT").await).await;
    let search_id = first["data"]["search_id"].as_i64().unwrap();

    // Owner recall is served from the still-fresh cache.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/weather/refresh/{search_id}"))
                .header("Cookie", &owner)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Another user's session must not see this search id.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/weather/refresh/{search_id}"))
                .header("Cookie", &other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_is_capped_and_ordered_newest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Somewhere", 20.0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    for city in ["Lisbon", "Porto", "Faro", "Braga", "Coimbra", "Aveiro"] {
        let response = search(&app, &cookie, city, "PT").await;
        assert_eq!(response.status(), StatusCode::OK);
        // Timestamps are RFC3339 with sub-second precision; consecutive
        // inserts in the same test still order correctly.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap();

    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["city"], "Aveiro");
    assert!(entries.iter().all(|e| e["city"] != "Lisbon"));
}

#[tokio::test]
async fn test_clear_history_removes_rows_and_cache() {
    let server = MockServer::start().await;
    mount_provider(&server, "Lisbon", 21.3, 1).await;

    let (app, state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let first = body_json(search(&app, &cookie, "Lisbon", "PT").await).await;
    let search_id = i32::try_from(first["data"]["search_id"].as_i64().unwrap()).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/history")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["removed"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let cache_row = WeatherCache::find_by_id(search_id)
        .one(&state.store().conn)
        .await
        .unwrap();
    assert!(cache_row.is_none());
}

#[tokio::test]
async fn test_clear_history_only_touches_the_acting_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Lisbon", 21.3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    search(&app, &alice, "Lisbon", "PT").await;
    search(&app, &bob, "Porto", "PT").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/history")
                .header("Cookie", &alice)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/history")
                .header("Cookie", &bob)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_provider_errors_are_distinct() {
    // Unknown city: provider 404 surfaces as our 404 with a city message.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let response = search(&app, &cookie, "Nowhere", "XX").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(
        json["error"].as_str().unwrap().contains("City not found"),
        "{json}"
    );

    // Throttled: provider 429 surfaces as our 429.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (app, _state) = spawn_app(&server.uri()).await;
    let cookie = register(&app, "user@example.com").await;

    let response = search(&app, &cookie, "Lisbon", "PT").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Unreachable provider: connectivity failures surface as 502.
    let (app, _state) = spawn_app("http://127.0.0.1:9").await;
    let cookie = register(&app, "user@example.com").await;

    let response = search(&app, &cookie, "Lisbon", "PT").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
