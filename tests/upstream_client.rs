//! Drives the real reqwest-backed client against a throwaway OMDb stand-in on a random port.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use omdb_proxy::config::Config;
use omdb_proxy::error::AppError;
use omdb_proxy::omdb::{OmdbApi, OmdbClient};
use omdb_proxy::validate::{MediaType, Plot, SearchQuery};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Calls = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn fake_omdb(
    State(calls): State<Calls>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    calls.lock().unwrap().push(params.clone());

    if params.get("apikey").map(String::as_str) == Some("revoked") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"Response": "False", "Error": "Invalid API key!"})),
        )
            .into_response();
    }

    match (params.get("s").map(String::as_str), params.get("i").map(String::as_str)) {
        (Some("batman"), _) => Json(json!({
            "Search": [
                {"Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "https://img/1.jpg"},
                {"Title": "The Batman", "Year": "2022", "imdbID": "tt1877830", "Type": "movie", "Poster": "https://img/2.jpg"},
                {"Title": "Batman", "Year": "1989", "imdbID": "tt0096895", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "3",
            "Response": "True"
        }))
        .into_response(),
        (Some("slow"), _) => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"Search": [], "totalResults": "0"})).into_response()
        }
        (Some("broken"), _) => (StatusCode::BAD_GATEWAY, "upstream exploded").into_response(),
        (Some(_), _) => Json(json!({"Response": "False", "Error": "Movie not found!"})).into_response(),
        (None, Some("tt0111161")) => Json(json!({
            "Title": "The Shawshank Redemption",
            "Year": "1994",
            "Runtime": "142 min",
            "Genre": "Drama",
            "Director": "Frank Darabont",
            "Actors": "Tim Robbins, Morgan Freeman",
            "Plot": "Two imprisoned men bond over a number of years.",
            "Poster": "https://img/shawshank.jpg",
            "imdbRating": "9.3",
            "imdbID": "tt0111161",
            "Response": "True"
        }))
        .into_response(),
        (None, _) => Json(json!({"Response": "False", "Error": "Incorrect IMDb ID."})).into_response(),
    }
}

async fn spawn_fake_omdb() -> (String, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/", get(fake_omdb))
        .with_state(calls.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}

fn client_for(api_url: &str, api_key: Option<&str>) -> OmdbClient {
    let config = Config {
        api_key: api_key.map(str::to_string),
        api_url: api_url.to_string(),
        upstream_timeout: Duration::from_millis(500),
        ..Config::default()
    };
    OmdbClient::new(&config).unwrap()
}

fn query(text: &str) -> SearchQuery {
    SearchQuery {
        text: text.to_string(),
        media_type: None,
        year: None,
        page: 1,
    }
}

fn upstream_parts(err: AppError) -> (u16, String) {
    match err {
        AppError::Upstream { status, message } => (status, message),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_sends_expected_parameters() {
    let (url, calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let res = client.search(&query("batman")).await.unwrap();
    assert_eq!(res.search.len(), 3);
    assert_eq!(res.total_results.as_deref(), Some("3"));

    let sent = &calls.lock().unwrap()[0];
    assert_eq!(sent["apikey"], "k3y");
    assert_eq!(sent["s"], "batman");
    assert_eq!(sent["type"], "movie");
    assert_eq!(sent["page"], "1");
    assert_eq!(sent["r"], "json");
    assert!(!sent.contains_key("y"));
}

#[tokio::test]
async fn search_forwards_type_and_year() {
    let (url, calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let q = SearchQuery {
        text: "batman".to_string(),
        media_type: Some(MediaType::Episode),
        year: Some(2005),
        page: 4,
    };
    client.search(&q).await.unwrap();

    let sent = &calls.lock().unwrap()[0];
    assert_eq!(sent["type"], "episode");
    assert_eq!(sent["y"], "2005");
    assert_eq!(sent["page"], "4");
}

#[tokio::test]
async fn search_error_field_becomes_404() {
    let (url, _calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let err = client.search(&query("qwertyuiop")).await.unwrap_err();
    assert_eq!(upstream_parts(err), (404, "Movie not found!".to_string()));
}

#[tokio::test]
async fn non_success_status_is_mirrored_with_upstream_message() {
    let (url, _calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("revoked"));

    let err = client.search(&query("batman")).await.unwrap_err();
    assert_eq!(upstream_parts(err), (401, "Invalid API key!".to_string()));

    let err = client.fetch_by_id("tt0111161", Plot::Full).await.unwrap_err();
    assert_eq!(upstream_parts(err).0, 401);
}

#[tokio::test]
async fn non_json_failure_falls_back_to_status_message() {
    let (url, _calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let (status, message) = upstream_parts(client.search(&query("broken")).await.unwrap_err());
    assert_eq!(status, 502);
    assert!(message.contains("502"));
}

#[tokio::test]
async fn slow_upstream_times_out_as_504() {
    let (url, _calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let err = client.search(&query("slow")).await.unwrap_err();
    assert_eq!(upstream_parts(err).0, 504);
}

#[tokio::test]
async fn unreachable_upstream_is_500() {
    let client = client_for("http://127.0.0.1:9", Some("k3y"));
    let (status, message) = upstream_parts(client.search(&query("batman")).await.unwrap_err());
    assert_eq!(status, 500);
    assert!(!message.is_empty());
}

#[tokio::test]
async fn fetch_by_id_returns_record() {
    let (url, calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let record = client
        .fetch_by_id("tt0111161", Plot::Short)
        .await
        .unwrap()
        .expect("record");
    assert_eq!(record.title, "The Shawshank Redemption");
    assert_eq!(record.poster.as_deref(), Some("https://img/shawshank.jpg"));

    let sent = &calls.lock().unwrap()[0];
    assert_eq!(sent["i"], "tt0111161");
    assert_eq!(sent["plot"], "short");
    assert_eq!(sent["r"], "json");
}

#[tokio::test]
async fn fetch_by_id_error_field_is_absence() {
    let (url, _calls) = spawn_fake_omdb().await;
    let client = client_for(&url, Some("k3y"));

    let record = client.fetch_by_id("tt9999999", Plot::Full).await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn missing_key_never_reaches_upstream() {
    let (url, calls) = spawn_fake_omdb().await;
    let client = client_for(&url, None);

    assert!(matches!(
        client.search(&query("batman")).await,
        Err(AppError::Config(_))
    ));
    assert!(matches!(
        client.fetch_by_id("tt0111161", Plot::Full).await,
        Err(AppError::Config(_))
    ));
    assert!(calls.lock().unwrap().is_empty());
}
