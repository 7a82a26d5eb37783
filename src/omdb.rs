use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::AppError;
use crate::validate::{MediaType, Plot, SearchQuery};

const MISSING_KEY: &str = "OMDB API key is not configured";

#[async_trait]
pub trait OmdbApi: Send + Sync {
    /// Fails with a 404 upstream error when OMDb answers with an `Error` field.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, AppError>;
    /// `Ok(None)` when OMDb reports the id as unknown.
    async fn fetch_by_id(&self, id: &str, plot: Plot) -> Result<Option<MovieRecord>, AppError>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
}

impl OmdbClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let user_agent = format!("omdb-proxy/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5).min(config.upstream_timeout))
            .timeout(config.upstream_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build OMDb HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
        })
    }

    async fn get_json(&self, params: &[(&str, String)]) -> Result<Value, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config(MISSING_KEY.to_string()))?;

        let res = self
            .client
            .get(&self.api_url)
            .query(&[("apikey", api_key)])
            .query(params)
            .query(&[("r", "json")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let text = res.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(upstream_error)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(AppError::upstream(status.as_u16(), message));
        }

        serde_json::from_str(&text)
            .map_err(|e| AppError::upstream(500, format!("Invalid response from OMDb: {e}")))
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, AppError> {
        let key_state = if self.api_key.is_some() { "present" } else { "missing" };
        debug!(
            api_url = %self.api_url,
            api_key = key_state,
            query = %query.text,
            media_type = ?query.media_type,
            year = ?query.year,
            page = query.page,
            "Searching OMDb"
        );

        let mut params = vec![
            ("s", query.text.clone()),
            (
                "type",
                query.media_type.unwrap_or(MediaType::Movie).as_str().to_string(),
            ),
        ];
        if let Some(year) = query.year {
            params.push(("y", year.to_string()));
        }
        params.push(("page", query.page.to_string()));

        let body = self.get_json(&params).await?;
        if let Some(message) = upstream_error(&body) {
            return Err(AppError::upstream(404, message));
        }
        let parsed: SearchResponse = serde_json::from_value(body)
            .map_err(|e| AppError::upstream(500, format!("Invalid search response from OMDb: {e}")))?;
        debug!(
            total_results = ?parsed.total_results,
            result_count = parsed.search.len(),
            "OMDb search answered"
        );
        Ok(parsed)
    }

    async fn fetch_by_id(&self, id: &str, plot: Plot) -> Result<Option<MovieRecord>, AppError> {
        let params = [("i", id.to_string()), ("plot", plot.as_str().to_string())];
        let body = self.get_json(&params).await?;
        if let Some(message) = upstream_error(&body) {
            debug!(id, upstream_error = %message, "OMDb has no record");
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| AppError::upstream(500, format!("Invalid movie record from OMDb: {e}")))
    }
}

/// OMDb signals failures in-band with a string `Error` field.
pub fn upstream_error(body: &Value) -> Option<String> {
    body.get("Error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        return AppError::upstream(504, "OMDb request timed out");
    }
    let status = err.status().map(|s| s.as_u16()).unwrap_or(500);
    AppError::upstream(status, err.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<SearchItem>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Actors", default)]
    pub actors: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
