// Axum API server
//
// Routes:
//   GET /health
//   GET /api/{token}.json              entry, radical or category listing
//   GET /api/{lang}/{text}.json        explicit-language form of the above
//   GET /api/index/{lang}.json         search index
//   GET /api/stroke-json/{hex}.json    stroke-order proxy
//   GET /render/{token}?system=        ruby + converted readings
//   GET|PUT /preferences/{lang}        stored romanization choice

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::cache::ResponseCache;
use crate::config::ServerConfig;
use crate::error::LookupError;
use crate::lang::{Lang, Token, TokenKind};
use crate::romanization::{MemoryPreferences, Preference, PreferenceStore};
use crate::service::{fuzzy_terms, project, DictionaryService, LookupOutcome};
use crate::storage::{FsStorage, StorageGateway};

static STROKE_FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[0-9a-f]+\.json$").expect("valid stroke file regex"));

const LISTING_CACHE_CONTROL: &str = "public, max-age=3600";
const STROKE_CACHE_CONTROL: &str = "public, max-age=86400";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub dictionary: Arc<DictionaryService>,
    pub preferences: Arc<dyn PreferenceStore>,
    /// Radical, category and index listings by storage key.
    pub listings: Cache<String, Value>,
    pub http: reqwest::Client,
    pub stroke_upstream: String,
}

impl AppState {
    /// State over the data directory named by `config`.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Opening dictionary data at {}", config.data_dir.display());
        Self::with_storage(Arc::new(FsStorage::new(&config.data_dir)), config)
    }

    pub fn with_storage(storage: Arc<dyn StorageGateway>, config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Initializing entry cache (capacity {})...", config.entry_cache_capacity);
        let entries = ResponseCache::<LookupOutcome, LookupError>::builder()
            .capacity(config.entry_cache_capacity)
            .build();

        tracing::info!("Initializing Moka listing cache...");
        let listings = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(config.list_cache_ttl)
            .build();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            dictionary: Arc::new(DictionaryService::with_cache(storage, entries)),
            preferences: Arc::new(MemoryPreferences::new()),
            listings,
            http,
            stroke_upstream: config.stroke_upstream.clone(),
        })
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))

        // Static segments win over the token routes
        .route("/api/index/:file", get(get_index))
        .route("/api/stroke-json/:file", get(get_stroke_json))
        .route("/api/:token", get(get_token))
        .route("/api/:lang/:text", get(get_explicit_token))

        .route("/render/:token", get(render_token))
        .route("/preferences/:lang", get(get_preference).put(put_preference))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_token(State(state): State<AppState>, Path(raw): Path<String>) -> Result<Response, AppError> {
    let token = Token::parse(strip_json(&raw))?;
    resolve(&state, token).await
}

async fn get_explicit_token(
    State(state): State<AppState>,
    Path((lang, text)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let token = Token::parse(&format!("{}/{}", lang, strip_json(&text)))?;
    resolve(&state, token).await
}

async fn resolve(state: &AppState, token: Token) -> Result<Response, AppError> {
    let lang = token.lang;
    match token.kind {
        TokenKind::Entry(text) => match state.dictionary.lookup(lang, &text).await? {
            LookupOutcome::Entry(entry) => Ok(Json(project(&entry)).into_response()),
            LookupOutcome::Suggestions { terms } => Err(AppError::not_found_with_terms(&text, terms)),
        },
        TokenKind::Radical(radical) => {
            let dictionary = state.dictionary.clone();
            let key = format!("{}/@{}", lang.code(), radical);
            let listing = cached_listing(state, key, async move { dictionary.radical(lang, &radical).await }).await?;
            Ok(Json(listing).into_response())
        }
        TokenKind::Category(category) => {
            let dictionary = state.dictionary.clone();
            let key = format!("{}/={}", lang.code(), category);
            let listing =
                cached_listing(state, key, async move { dictionary.category(lang, &category).await }).await?;
            Ok(with_cache_control(Json(listing), LISTING_CACHE_CONTROL))
        }
        TokenKind::Bookmarks => Err(AppError::BadRequest("bookmarks are kept by the reader, not the server".into())),
    }
}

async fn get_index(State(state): State<AppState>, Path(file): Path<String>) -> Result<Response, AppError> {
    let lang = Lang::from_code(strip_json(&file))
        .ok_or_else(|| AppError::BadRequest(format!("unknown language: {}", file)))?;

    let dictionary = state.dictionary.clone();
    let key = format!("{}/index", lang.code());
    let index = cached_listing(&state, key, async move { dictionary.index(lang).await }).await?;
    Ok(with_cache_control(Json(index), LISTING_CACHE_CONTROL))
}

async fn get_stroke_json(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !STROKE_FILE_RE.is_match(&file) {
        return Err(AppError::BadRequest(format!("invalid codepoint: {}", file)));
    }

    let upstream = format!("{}/{}", state.stroke_upstream, file);
    let user_agent = headers
        .get(header::USER_AGENT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("moedict-rust"));

    tracing::debug!("Proxying stroke data from {}", upstream);
    let response = state
        .http
        .get(&upstream)
        .header(header::USER_AGENT, user_agent)
        .send()
        .await
        .map_err(|e| AppError::Proxy(e.to_string()))?;

    if !response.status().is_success() {
        tracing::debug!("Stroke upstream returned {} for {}", response.status(), file);
        return Err(AppError::NotFound { message: format!("找不到筆畫資料：{}", file), terms: None });
    }

    let body = response.bytes().await.map_err(|e| AppError::Proxy(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (header::CACHE_CONTROL, STROKE_CACHE_CONTROL),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct RenderParams {
    system: Option<String>,
}

async fn render_token(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<RenderParams>,
) -> Result<Json<Value>, AppError> {
    let token = Token::parse(strip_json(&raw))?;
    let TokenKind::Entry(text) = token.kind else {
        return Err(AppError::BadRequest(format!("not a headword: {}", raw)));
    };
    let lang = token.lang;

    let preference = match params.system.as_deref() {
        Some(system) => Preference::parse(lang, Some(system)),
        None => state.preferences.preference(lang),
    };

    match state.dictionary.render(lang, &text, preference).await? {
        Some(heteronyms) => Ok(Json(json!({
            "title": text,
            "lang": lang,
            "preference": preference.to_value(lang),
            "heteronyms": heteronyms,
        }))),
        None => Err(AppError::not_found_with_terms(&text, fuzzy_terms(&text))),
    }
}

#[derive(Debug, Deserialize)]
struct PreferenceUpdate {
    value: String,
}

async fn get_preference(State(state): State<AppState>, Path(lang): Path<String>) -> Result<Json<Value>, AppError> {
    let lang: Lang = lang.parse()?;
    Ok(Json(preference_body(lang, state.preferences.preference(lang))))
}

async fn put_preference(
    State(state): State<AppState>,
    Path(lang): Path<String>,
    Json(update): Json<PreferenceUpdate>,
) -> Result<Json<Value>, AppError> {
    let lang: Lang = lang.parse()?;
    let preference = Preference::parse(lang, Some(&update.value));
    state.preferences.set(lang, &preference.to_value(lang));
    tracing::info!("Romanization for {} set to {}", lang, preference);
    Ok(Json(preference_body(lang, preference)))
}

fn preference_body(lang: Lang, preference: Preference) -> Value {
    json!({
        "lang": lang,
        "value": preference.to_value(lang),
        "system": preference.system,
        "parallel": preference.parallel,
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn strip_json(raw: &str) -> &str {
    raw.strip_suffix(".json").unwrap_or(raw)
}

async fn cached_listing(
    state: &AppState,
    key: String,
    load: impl Future<Output = Result<Value, LookupError>>,
) -> Result<Value, AppError> {
    if let Some(cached) = state.listings.get(&key).await {
        tracing::debug!("Cache hit for listing {}", key);
        return Ok(cached);
    }

    let listing = load.await?;
    state.listings.insert(key, listing.clone()).await;
    Ok(listing)
}

fn with_cache_control(body: impl IntoResponse, value: &'static str) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
    response
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// `terms` is omitted from the body when `None`.
    NotFound { message: String, terms: Option<Vec<String>> },
    /// Headword not stored; the reader gets per-character lookups instead.
    Suggestions(Vec<String>),
    Internal(String),
    Proxy(String),
}

impl AppError {
    fn not_found_with_terms(text: &str, terms: Vec<String>) -> Self {
        if terms.is_empty() {
            AppError::NotFound { message: format!("找不到詞彙: {}", text), terms: Some(terms) }
        } else {
            AppError::Suggestions(terms)
        }
    }
}

impl From<LookupError> for AppError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::EmptyHeadword | LookupError::InvalidToken(_) => AppError::BadRequest(e.to_string()),
            LookupError::NotFound(message) => AppError::NotFound { message, terms: Some(Vec::new()) },
            LookupError::Malformed { .. } | LookupError::Storage(_) => {
                tracing::error!("Lookup failed: {}", e);
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": "Bad Request", "message": message }))
            }
            AppError::NotFound { message, terms: Some(terms) } => {
                (StatusCode::NOT_FOUND, json!({ "error": "Not Found", "message": message, "terms": terms }))
            }
            AppError::NotFound { message, terms: None } => {
                (StatusCode::NOT_FOUND, json!({ "error": "Not Found", "message": message }))
            }
            AppError::Suggestions(terms) => (StatusCode::NOT_FOUND, json!({ "terms": terms })),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error", "message": message }),
            ),
            AppError::Proxy(message) => {
                tracing::warn!("Stroke proxy failed: {}", message);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Proxy Error", "message": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}
