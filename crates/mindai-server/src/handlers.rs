use axum::{extract::State, Json};
use mindai_core::context::MessageComposer;
use mindai_core::llm::dispatch;
use mindai_core::{MindError, ProviderId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Provider name, e.g. `deepseek` or `claude`.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct AutoRouteRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutoRouteResponse {
    pub response: String,
    /// Provider that answered.
    pub model: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Send a bare prompt to the named provider.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let (Some(prompt), Some(model)) = (non_empty(req.prompt), non_empty(req.model)) else {
        return Err(ApiError::bad_request("Prompt and model are required"));
    };

    let id: ProviderId = model.parse()?;
    let response = ask(&state, id, &prompt).await?;
    Ok(Json(QueryResponse { response }))
}

/// Classify the prompt, then answer it with the chosen provider.
pub async fn auto_route(
    State(state): State<AppState>,
    Json(req): Json<AutoRouteRequest>,
) -> ApiResult<Json<AutoRouteResponse>> {
    let Some(prompt) = non_empty(req.prompt) else {
        return Err(ApiError::bad_request("Prompt is required"));
    };

    let id = state.router.route(None, &prompt)?;
    let response = ask(&state, id, &prompt).await?;
    Ok(Json(AutoRouteResponse {
        response,
        model: id.as_str().to_string(),
    }))
}

async fn ask(state: &AppState, id: ProviderId, prompt: &str) -> Result<String, MindError> {
    let adapter = state
        .router
        .registry()
        .get(id)
        .ok_or_else(|| MindError::UnknownProvider(id.to_string()))?;
    let payload = MessageComposer::single_prompt(adapter.model(), prompt);
    dispatch(adapter.as_ref(), state.transport.as_ref(), &payload).await
}
