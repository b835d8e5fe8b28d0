//! The ambient minimal HTTP surface (out of scope for the core's domain
//! logic per spec §6, carried anyway as operational plumbing): liveness and
//! a read-only resolve endpoint, wired directly over the Resolver and the
//! Observer's cursor.

use std::sync::Arc;

use anchor_observer::Observer;
use anchor_stores::OperationStore;
use anchor_types::ResolutionResult;
use anchor_versioning::VersioningDispatcher;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;

#[derive(Clone)]
pub struct AppState {
    pub operation_store: Arc<dyn OperationStore>,
    pub dispatcher: Arc<VersioningDispatcher>,
    pub observer: Arc<Observer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/resolve/:did_suffix", get(resolve))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "lastKnownTransactionNumber": state.observer.last_known_transaction_number(),
    }))
}

async fn resolve(State(state): State<AppState>, Path(did_suffix): Path<String>) -> impl IntoResponse {
    let operations = match state.operation_store.get(&did_suffix).await {
        Ok(operations) => operations,
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    match anchor_protocol::resolve(operations, state.dispatcher.as_ref()) {
        ResolutionResult::NotFound => {
            (StatusCode::NOT_FOUND, Json(json!({ "status": "not_found" }))).into_response()
        }
        ResolutionResult::Deactivated => {
            (StatusCode::GONE, Json(json!({ "status": "deactivated" }))).into_response()
        }
        ResolutionResult::Found(did_state) => {
            (StatusCode::OK, Json(json!({ "status": "found", "didDocument": did_state.document }))).into_response()
        }
    }
}
