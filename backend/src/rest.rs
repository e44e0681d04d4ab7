//! HTTP surface of the transaction store.
//!
//! The wire protocol is query-string action dispatch over a single route:
//! `GET ?action=get`, `POST ?action=save|delete|addCategory`. Bodies are
//! JSON (posted as text by spreadsheet-era clients, so they are parsed
//! from the raw body rather than through a typed extractor). Every
//! response is HTTP 200 with a `{status: "success"|"error"}` envelope.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{AddCategoryRequest, SnapshotResponse, StatusResponse, Transaction};
use tracing::{error, info};

use crate::lock::StoreLock;
use crate::store::SheetStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SheetStore,
    pub lock: StoreLock,
}

impl AppState {
    pub fn new(store: SheetStore, lock: StoreLock) -> Self {
        Self { store, lock }
    }
}

/// Query parameters carried by every request.
#[derive(Deserialize, Debug)]
pub struct ActionQuery {
    pub action: Option<String>,
    pub id: Option<String>,
}

/// Handler for GET requests (`?action=get`).
pub async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
) -> Response {
    info!("GET request - action: {:?}", query.action);

    if query.action.as_deref() != Some("get") {
        return unknown_action();
    }

    let _guard = state.lock.acquire().await;
    match state.store.get_all() {
        Ok((transactions, categories)) => Json(SnapshotResponse {
            status: "success".to_string(),
            message: None,
            transactions,
            categories: Some(categories),
        })
        .into_response(),
        Err(e) => {
            error!("error reading store: {:?}", e);
            Json(StatusResponse::error(e.to_string())).into_response()
        }
    }
}

/// Handler for POST requests (`?action=save|delete|addCategory`).
pub async fn handle_post(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    body: String,
) -> Response {
    info!("POST request - action: {:?}", query.action);

    let _guard = state.lock.acquire().await;
    let outcome = match query.action.as_deref() {
        Some("save") => save_action(&state, &body),
        Some("delete") => delete_action(&state, query.id.as_deref()),
        Some("addCategory") => add_category_action(&state, &body),
        _ => return unknown_action(),
    };

    match outcome {
        Ok(()) => Json(StatusResponse::success()).into_response(),
        Err(e) => {
            error!("error handling action {:?}: {:?}", query.action, e);
            Json(StatusResponse::error(e.to_string())).into_response()
        }
    }
}

fn save_action(state: &AppState, body: &str) -> anyhow::Result<()> {
    let transaction: Transaction = serde_json::from_str(body)?;
    state.store.save(&transaction)
}

fn delete_action(state: &AppState, id: Option<&str>) -> anyhow::Result<()> {
    let id = id.ok_or_else(|| anyhow::anyhow!("missing id parameter"))?;
    // A miss is not an error: deleting an unknown id is a no-op.
    let removed = state.store.delete(id)?;
    if !removed {
        info!("delete for unknown id {} ignored", id);
    }
    Ok(())
}

fn add_category_action(state: &AppState, body: &str) -> anyhow::Result<()> {
    let request: AddCategoryRequest = serde_json::from_str(body)?;
    state.store.add_category(request.kind, &request.name)?;
    Ok(())
}

fn unknown_action() -> Response {
    Json(StatusResponse::error("Unknown action")).into_response()
}
