//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use agent_core::LlmProvider;
use mail_assistant::store::ReminderStore;

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
    pub mailbox: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub request_id: String,
    pub intent: String,
    pub confidence: f32,
    /// Steps executed, in order
    pub steps: Vec<String>,
    /// Failure notes accumulated along the way (empty on a clean run)
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct ReminderView {
    pub id: String,
    pub title: String,
    pub due_date: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.name().to_string(),
        provider_connected,
        mailbox: state.mailbox_name.clone(),
    })
}

/// Main chat endpoint: one request, one full engine walk
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty".into(),
                code: "EMPTY_MESSAGE".into(),
            }),
        ));
    }

    let final_state = state.engine.handle(message).await;

    // The engine always terminates with some response text; an empty one
    // here would be a wiring bug, not a user error.
    let response = final_state
        .final_response
        .clone()
        .unwrap_or_else(|| "I could not produce an answer for that request.".into());

    Ok(Json(ChatResponse {
        response,
        request_id: final_state.id().to_string(),
        intent: final_state.intent.to_string(),
        confidence: final_state.intent_confidence,
        steps: final_state
            .completed()
            .iter()
            .map(ToString::to_string)
            .collect(),
        errors: final_state.errors().to_vec(),
    }))
}

/// List reminders, soonest due first
pub async fn list_reminders(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReminderView>>, (StatusCode, Json<ErrorResponse>)> {
    let reminders = state.reminders.list().map_err(|e| {
        tracing::error!("reminder listing failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "could not list reminders".into(),
                code: "REMINDER_STORE_ERROR".into(),
            }),
        )
    })?;

    Ok(Json(
        reminders
            .into_iter()
            .map(|r| ReminderView {
                id: r.id,
                title: r.title,
                due_date: r.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            })
            .collect(),
    ))
}
