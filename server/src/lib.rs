use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use ir_core::persist::IndexPaths;
use ir_core::query_syntax::parse_query;
use ir_core::{DocId, IrError, Normalizer, Posting, QueryProcessor, TermId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub kind: &'static str,
    pub terms: Vec<String>,
    pub took_s: f64,
    pub total_hits: usize,
    pub doc_ids: Vec<DocId>,
}

#[derive(Serialize)]
pub struct TermResponse {
    pub term: String,
    pub term_id: TermId,
    pub doc_frequency: usize,
    pub postings: Vec<Posting>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: msg.into() }))
}

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<QueryProcessor>,
    pub normalizer: Normalizer,
}

pub fn build_app(index_dir: String, normalizer: Normalizer) -> Result<Router> {
    // Load dictionary and index once; both stay read-only for the server lifetime
    let processor = QueryProcessor::load(&IndexPaths::new(&index_dir))?;
    tracing::info!(index_dir = %index_dir, num_terms = processor.dictionary().len(), "index ready");
    let app_state = AppState { processor: Arc::new(processor), normalizer };

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
        .route("/search", get(search_handler))
        .route("/term/:term", get(term_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let parsed = parse_query(&state.normalizer, &params.q, state.processor.position_mode())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let doc_ids = state.processor.execute(&parsed).map_err(|e| match e {
        IrError::InvalidQuery(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, kind = parsed.kind(), hits = doc_ids.len(), "search");
    Ok(Json(SearchResponse {
        query: params.q,
        kind: parsed.kind(),
        terms: parsed.terms().to_vec(),
        took_s: elapsed.as_secs_f64(),
        total_hits: doc_ids.len(),
        doc_ids,
    }))
}

/// Posting list of a single word, normalized the same way as document text.
pub async fn term_handler(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<TermResponse>, ApiError> {
    let term = state.normalizer.normalize(&word);
    if term.is_empty() {
        return Err(api_error(StatusCode::NOT_FOUND, format!("{word:?} is not indexed")));
    }
    let term_id = *state
        .processor
        .dictionary()
        .get(&term)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("{term:?} is not in the dictionary")))?;
    let index = state.processor.index();
    Ok(Json(TermResponse {
        term,
        term_id,
        doc_frequency: index.doc_frequency(term_id),
        postings: index.postings(term_id).to_vec(),
    }))
}
