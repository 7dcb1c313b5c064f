//! JSON HTTP API.
//!
//! Exposes the ingestion and read surfaces over HTTP for the browser UI and
//! other clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (open, returns version) |
//! | `POST` | `/api/subreddits` | Track a subreddit and fetch its metadata |
//! | `GET`  | `/api/subreddits` | List tracked subreddits |
//! | `POST` | `/api/subreddits/{id}/refresh` | Refresh one page of posts |
//! | `GET`  | `/api/subreddits/{id}/posts` | List stored posts |
//! | `POST` | `/api/posts/{id}/comments/refresh` | Refresh a post's comment tree |
//! | `GET`  | `/api/posts/{id}/comments` | List stored comments |
//! | `POST` | `/api/refresh-all` | Posts-only refresh of every tracked subreddit |
//! | `GET`  | `/api/search` | Search stored posts |
//! | `GET`  | `/api/pain-points` | Extract pain points for a subreddit |
//! | `POST` | `/api/generate-content` | Pain points + content ideas in one call |
//!
//! # Auth
//!
//! Everything under `/api` requires `Authorization: Bearer <token>` when a
//! token is configured (`[server].auth_token` or `SUBSCOPE_API_TOKEN`).
//! Without a configured token the API is open and a warning is logged at
//! startup.
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be in [1, 100], got 150" } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `not_found`
//! (404), `upstream_error` (502), `storage_error` (500).

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::analyze::{pain_points_for_subreddit, PainPointExtractor};
use crate::config::Config;
use crate::db;
use crate::error::Error;
use crate::ideas::{generate_ideas, IdeaSet};
use crate::ingest::{resolve_subreddit, Ingestor, RefreshOptions};
use crate::models::{Comment, CommentSort, Platform, Post, RefreshSummary, Subreddit};
use crate::reddit::RedditClient;
use crate::store::Store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    ingestor: Arc<Ingestor>,
    auth_token: Option<String>,
}

impl AppState {
    fn store(&self) -> &Store {
        self.ingestor.store()
    }
}

/// Starts the JSON API server on the configured bind address. Runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let client = RedditClient::new(&config.reddit)?;
    let ingestor = Arc::new(Ingestor::new(client, Store::new(pool)));

    let auth_token = config.server.resolved_auth_token();
    if auth_token.is_none() {
        warn!("no API auth token configured; /api routes are open");
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        ingestor,
        auth_token,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/subreddits",
            post(handle_add_subreddit).get(handle_list_subreddits),
        )
        .route("/subreddits/{id}/refresh", post(handle_refresh_posts))
        .route("/subreddits/{id}/posts", get(handle_list_posts))
        .route("/posts/{id}/comments/refresh", post(handle_refresh_comments))
        .route("/posts/{id}/comments", get(handle_list_comments))
        .route("/refresh-all", post(handle_refresh_all))
        .route("/search", get(handle_search))
        .route("/pain-points", get(handle_pain_points))
        .route("/generate-content", post(handle_generate_content))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .route("/health", get(handle_health))
        .nest("/api", api)
        .layer(cors)
        .with_state(state);

    println!("subscope API listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Auth ============

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.auth_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            warn!("authentication failed for API request");
            Err(AppError {
                status: StatusCode::UNAUTHORIZED,
                code: "unauthorized".to_string(),
                message: "missing or invalid bearer token".to_string(),
            })
        }
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Subreddits ============

#[derive(Deserialize)]
struct AddSubredditBody {
    name: String,
}

async fn handle_add_subreddit(
    State(state): State<AppState>,
    Json(body): Json<AddSubredditBody>,
) -> Result<Json<Subreddit>, AppError> {
    let subreddit = state.ingestor.add_subreddit(&body.name).await?;
    Ok(Json(subreddit))
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    25
}

async fn handle_list_subreddits(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Subreddit>>, AppError> {
    let subreddits = state.store().list_subreddits(page.limit, page.offset).await?;
    Ok(Json(subreddits))
}

// ============ Posts ============

#[derive(Deserialize, Default)]
struct RefreshBody {
    sort: Option<String>,
    timeframe: Option<String>,
    limit: Option<u32>,
    #[serde(default)]
    comments: bool,
    comment_sort: Option<String>,
}

async fn handle_refresh_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RefreshBody>>,
) -> Result<Json<Vec<Post>>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let options = RefreshOptions::resolve(
        &state.config,
        body.sort.as_deref(),
        body.timeframe.as_deref(),
        body.limit,
        body.comments,
        body.comment_sort.as_deref(),
    )?;

    let posts = state.ingestor.refresh_posts(&id, &options).await?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
struct PostsQuery {
    #[serde(default = "default_sort_by")]
    sort_by: String,
    #[serde(default = "default_sort_order")]
    order: String,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_sort_by() -> String {
    "created_at".to_string()
}
fn default_sort_order() -> String {
    "desc".to_string()
}

async fn handle_list_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state
        .store()
        .list_posts(&id, &query.sort_by, &query.order, query.limit, query.offset)
        .await?;
    Ok(Json(posts))
}

async fn handle_refresh_all(
    State(state): State<AppState>,
    body: Option<Json<RefreshBody>>,
) -> Result<Json<RefreshSummary>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let options = RefreshOptions::resolve(
        &state.config,
        body.sort.as_deref(),
        body.timeframe.as_deref(),
        body.limit,
        false,
        None,
    )?;

    let summary = state.ingestor.refresh_all(&options).await?;
    Ok(Json(summary))
}

// ============ Comments ============

#[derive(Deserialize, Default)]
struct CommentsRefreshBody {
    sort: Option<String>,
}

async fn handle_refresh_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CommentsRefreshBody>>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let sort = CommentSort::parse(
        body.sort
            .as_deref()
            .unwrap_or(&state.config.ingest.comment_sort),
    )?;

    let comments = state.ingestor.refresh_comments(&id, sort).await?;
    Ok(Json(comments))
}

async fn handle_list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = state.store().list_comments(&id, page.limit, page.offset).await?;
    Ok(Json(comments))
}

// ============ Search ============

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    #[serde(default)]
    subreddit_id: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::from(Error::Validation(
            "q must not be empty".to_string(),
        )));
    }

    let posts = state
        .store()
        .search_posts(
            &query.q,
            query.subreddit_id.as_deref(),
            query.limit,
            query.offset,
        )
        .await?;
    Ok(Json(posts))
}

// ============ Analysis ============

#[derive(Deserialize)]
struct PainPointsQuery {
    subreddit: String,
}

#[derive(Serialize)]
struct PainPointsResponse {
    subreddit: String,
    pain_points: Vec<String>,
    count: usize,
}

async fn handle_pain_points(
    State(state): State<AppState>,
    Query(query): Query<PainPointsQuery>,
) -> Result<Json<PainPointsResponse>, AppError> {
    let subreddit = resolve_subreddit(state.store(), &query.subreddit).await?;
    let extractor = PainPointExtractor::new();
    let pain_points = pain_points_for_subreddit(state.store(), &subreddit.id, &extractor).await?;

    Ok(Json(PainPointsResponse {
        subreddit: subreddit.name,
        count: pain_points.len(),
        pain_points,
    }))
}

#[derive(Deserialize)]
struct GenerateContentBody {
    subreddit: String,
    platform: Option<String>,
}

#[derive(Serialize)]
struct GenerateContentResponse {
    subreddit: String,
    /// Top pain points only; the full list is available via /api/pain-points.
    pain_points: Vec<String>,
    content_ideas: IdeaSet,
    metadata: ContentMetadata,
}

#[derive(Serialize)]
struct ContentMetadata {
    total_pain_points: usize,
    platform: String,
}

async fn handle_generate_content(
    State(state): State<AppState>,
    Json(body): Json<GenerateContentBody>,
) -> Result<Json<GenerateContentResponse>, AppError> {
    let platform_str = body.platform.as_deref().unwrap_or("all");
    let platform = Platform::parse(platform_str)?;

    let subreddit = resolve_subreddit(state.store(), &body.subreddit).await?;
    let extractor = PainPointExtractor::new();
    let pain_points = pain_points_for_subreddit(state.store(), &subreddit.id, &extractor).await?;
    let content_ideas = generate_ideas(&pain_points, platform);

    Ok(Json(GenerateContentResponse {
        subreddit: subreddit.name,
        metadata: ContentMetadata {
            total_pain_points: pain_points.len(),
            platform: platform_str.to_string(),
        },
        pain_points: pain_points.into_iter().take(5).collect(),
        content_ideas,
    }))
}
