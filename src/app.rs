use crate::config::Config;
use crate::error::AppError;
use crate::models::{MovieDetail, SearchResultPage};
use crate::omdb::{OmdbApi, OmdbClient};
use crate::transform::{self, PosterLinks};
use crate::validate::{self, DetailParams, SearchParams};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

const SEARCH_FIELDS: &[&str] = &["query", "type", "year", "page"];
const DETAIL_FIELDS: &[&str] = &["plot"];

#[derive(Clone)]
pub struct AppState {
    pub omdb: Arc<dyn OmdbApi>,
    pub config: Arc<Config>,
}

impl AppState {
    fn poster_links(&self) -> PosterLinks<'_> {
        // Only used after a successful upstream call, which already required the key.
        PosterLinks::new(
            &self.config.poster_url,
            self.config.api_key.as_deref().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    config: HealthConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthConfig {
    has_api_key: bool,
    api_url: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let omdb: Arc<dyn OmdbApi> = Arc::new(OmdbClient::new(&config)?);
    let port = config.port;
    let state = AppState {
        omdb,
        config: Arc::new(config),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.public_dir);
    Router::new()
        .route("/api/health", get(health))
        .route("/api/movies/search", get(search_movies))
        .route("/api/movies/:id", get(movie_details))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        config: HealthConfig {
            has_api_key: state.config.has_api_key(),
            api_url: state.config.api_url.clone(),
        },
    })
}

async fn search_movies(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResultPage>, AppError> {
    let Query(params) = params.map_err(|rejection| {
        let detail = rejection.body_text();
        warn!(error = %detail, "Rejected search query string");
        validate::malformed_query(&detail, SEARCH_FIELDS)
    })?;
    info!(
        query = ?params.query,
        media_type = ?params.media_type,
        year = ?params.year,
        page = ?params.page,
        "Received search request"
    );

    let result = async {
        let query = validate::validate_search(&params)?;
        let body = state.omdb.search(&query).await?;
        Ok::<_, AppError>(transform::to_search_result_page(
            body,
            query.page,
            &state.poster_links(),
        ))
    }
    .await;

    match result {
        Ok(page) => {
            info!(
                total_results = page.total_results,
                current_page = page.current_page,
                "Search successful"
            );
            Ok(Json(page))
        }
        Err(err) if err.is_server_fault() => {
            error!(query = ?params.query, page = ?params.page, error = %err, "Search failed");
            Err(err)
        }
        Err(err) => {
            warn!(query = ?params.query, page = ?params.page, error = %err, "Search failed");
            Err(err)
        }
    }
}

async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<DetailParams>, QueryRejection>,
) -> Result<Json<MovieDetail>, AppError> {
    let Query(params) = params.map_err(|rejection| {
        let detail = rejection.body_text();
        warn!(id = %id, error = %detail, "Rejected movie details query string");
        validate::malformed_query(&detail, DETAIL_FIELDS)
    })?;
    info!(id = %id, plot = ?params.plot, "Received movie details request");

    let result = async {
        let lookup = validate::validate_lookup(&id, &params)?;
        let record = state
            .omdb
            .fetch_by_id(&lookup.id, lookup.plot)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok::<_, AppError>(transform::to_movie_detail(
            record,
            &lookup.id,
            &state.poster_links(),
        ))
    }
    .await;

    match result {
        Ok(movie) => {
            info!(id = %id, title = %movie.title, "Movie details found");
            Ok(Json(movie))
        }
        Err(err) if err.is_server_fault() => {
            error!(id = %id, plot = ?params.plot, error = %err, "Movie details failed");
            Err(err)
        }
        Err(err) => {
            warn!(id = %id, plot = ?params.plot, error = %err, "Movie details failed");
            Err(err)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
