//! HTTP request handlers.
//!
//! Routes supported, mirroring the workflow-engine remote codec protocol:
//! `/{namespace}/encode` and `/{namespace}/decode` select a namespace by
//! path; requests to any other path fall back to the `X-Namespace` header
//! with the operation taken from the trailing path segment. `/health` sits
//! outside the namespace and auth machinery entirely.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::auth::bearer_token;
use crate::error::{Result, TransitError};
use crate::payload::PayloadBatch;

/// Header naming the namespace for requests routed to the root.
pub const NAMESPACE_HEADER: &str = "x-namespace";

/// Which direction a request runs the chain in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Encode,
    Decode,
}

impl Operation {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "encode" => Some(Operation::Encode),
            "decode" => Some(Operation::Decode),
            _ => None,
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Result<Router> {
    let cors = state
        .config
        .cors_origin
        .as_deref()
        .map(cors_layer)
        .transpose()?;

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/:namespace/encode", post(encode_handler))
        .route("/:namespace/decode", post(decode_handler))
        .fallback(header_routed_handler)
        .with_state(state);

    if let Some(cors) = cors {
        router = router.layer(cors);
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}

/// CORS wrapper for the allowed origin: credentials plus the headers the
/// workflow-engine web UI sends, `X-Namespace` included.
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| TransitError::Config(format!("invalid CORS origin: {origin}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(NAMESPACE_HEADER),
        ]))
}

/// Liveness endpoint. Always healthy once the process is serving; no auth.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn encode_handler(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
    headers: HeaderMap,
    Json(batch): Json<PayloadBatch>,
) -> Result<Json<PayloadBatch>> {
    transform(&state, &namespace, Operation::Encode, &headers, batch)
        .await
        .map(Json)
}

async fn decode_handler(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
    headers: HeaderMap,
    Json(batch): Json<PayloadBatch>,
) -> Result<Json<PayloadBatch>> {
    transform(&state, &namespace, Operation::Decode, &headers, batch)
        .await
        .map(Json)
}

/// Header-based fallback: any unmatched path whose trailing segment is
/// `encode` or `decode` is routed by the `X-Namespace` header.
async fn header_routed_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let Some(operation) = uri
        .path()
        .rsplit('/')
        .next()
        .and_then(Operation::from_segment)
    else {
        return TransitError::Routing(format!("no route for {}", uri.path())).into_response();
    };

    let namespace = match headers.get(NAMESPACE_HEADER).map(HeaderValue::to_str) {
        Some(Ok(namespace)) => namespace.to_string(),
        _ => {
            return TransitError::Routing(format!("missing {NAMESPACE_HEADER} header"))
                .into_response()
        },
    };

    let batch: PayloadBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("invalid payload batch: {e}")})),
            )
                .into_response()
        },
    };

    match transform(&state, &namespace, operation, &headers, batch).await {
        Ok(batch) => Json(batch).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Resolve the namespace's chain, pass the authorization gate, then run
/// the chain. Resolution precedes the gate so unknown namespaces are 404
/// regardless of credentials; the gate precedes the chain so a denied
/// request never reaches a stage.
async fn transform(
    state: &AppState,
    namespace: &str,
    operation: Operation,
    headers: &HeaderMap,
    batch: PayloadBatch,
) -> Result<PayloadBatch> {
    let chain = state
        .registry
        .chain(namespace)
        .ok_or_else(|| TransitError::Routing(format!("unknown namespace: {namespace}")))?;

    if let Some(gate) = &state.authorizer {
        let bearer = bearer_token(headers);
        if !gate.authorize(namespace, bearer).await {
            return Err(TransitError::Authorization(format!(
                "request not authorized for namespace {namespace}"
            )));
        }
    }

    tracing::debug!(namespace, ?operation, payloads = batch.payloads.len(), "transforming batch");

    let payloads = match operation {
        Operation::Encode => chain.encode(batch.payloads).await?,
        Operation::Decode => chain.decode(batch.payloads).await?,
    };

    Ok(PayloadBatch::new(payloads))
}
