use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sift_core::{CorpusSource, DirCorpus, EngineConfig, SearchEngine, SearchOptions};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SNIPPET_CHARS: usize = 200;
const DOC_EXTENSION: &str = ".txt";

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub use_soundex: bool,
    #[serde(default)]
    pub use_spellcorrection: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub document: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub corpus: Arc<DirCorpus>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn build_app(config: EngineConfig) -> Result<Router> {
    // Load or build the index at startup
    let engine = SearchEngine::open(&config)?;
    let stats = engine.stats();
    tracing::info!(num_docs = stats.num_docs, num_terms = stats.num_terms, "index ready");
    let app_state = AppState { engine: Arc::new(engine), corpus: Arc::new(DirCorpus::new(&config.corpus_dir)) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", post(search_handler))
        .route("/api/rebuild-index", post(rebuild_handler))
        .route("/api/corpus", get(corpus_list_handler))
        .route("/api/corpus/:file_name", get(corpus_content_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    // spell correction and snippet reads block, keep them off the async workers
    let response = tokio::task::spawn_blocking(move || run_search(&state, &params))
        .await
        .map_err(|e| internal(format!("Search failed: {e}")))?;
    Ok(Json(response))
}

/// Ranked hits for one request, with display names and snippets resolved.
pub fn run_search(state: &AppState, params: &SearchParams) -> SearchResponse {
    let start = std::time::Instant::now();
    let options = SearchOptions { use_soundex: params.use_soundex, use_spell_correction: params.use_spellcorrection };
    let hits = state.engine.search(&params.query, options);

    let results = hits
        .into_iter()
        .map(|hit| SearchHit {
            snippet: snippet(&state.corpus, &hit.document),
            document: display_name(&hit.document).to_string(),
            score: hit.score,
        })
        .collect::<Vec<_>>();

    tracing::debug!(query = %params.query, hits = results.len(), took_s = start.elapsed().as_secs_f64(), "search served");
    SearchResponse { results }
}

pub async fn rebuild_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.rebuild_index()).await;
    match outcome {
        Ok(Ok(_)) => Ok(Json(json!({ "message": "Index rebuilt successfully" }))),
        Ok(Err(e)) => Err(internal(format!("Failed to rebuild index: {e}"))),
        Err(e) => Err(internal(format!("Failed to rebuild index: {e}"))),
    }
}

pub async fn corpus_list_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let names = state.corpus.list().map_err(|e| internal(e.to_string()))?;
    let files: Vec<&str> = names.iter().filter_map(|n| n.strip_suffix(DOC_EXTENSION)).collect();
    Ok(Json(json!({ "files": files })))
}

pub async fn corpus_content_handler(State(state): State<AppState>, Path(file_name): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    if !is_plain_name(&file_name) {
        return Err(not_found());
    }
    let bytes = state.corpus.read(&format!("{file_name}{DOC_EXTENSION}")).map_err(|_| not_found())?;
    Ok(Json(json!({ "content": String::from_utf8_lossy(&bytes) })))
}

/// Document name as shown to clients, without the `.txt` extension.
fn display_name(document: &str) -> &str {
    document.strip_suffix(DOC_EXTENSION).unwrap_or(document)
}

/// Leading characters of a document, with `...` appended when cut short.
fn snippet(corpus: &DirCorpus, document: &str) -> String {
    let Ok(bytes) = corpus.read(document) else { return String::new() };
    let text = String::from_utf8_lossy(&bytes);
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "File not found" })))
}

fn internal(message: String) -> ApiError {
    tracing::error!(%message, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message })))
}
