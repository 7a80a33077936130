use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::chat::{fan_out, ChatExchange};
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Defaults to the configured model selection when absent.
    pub models: Option<Vec<ChatModel>>,
}

/// POST /api/v1/documents/:id/chat
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatExchange>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }
    let models = req
        .models
        .unwrap_or_else(|| state.config.default_chat_models.clone());
    if models.is_empty() {
        return Err(AppError::Validation(
            "Select at least one model".to_string(),
        ));
    }

    let session = state.documents.get(id).await?;
    let document = session.document_text().await;
    let exchange = fan_out(Arc::clone(&state.chat), &models, message, &document).await;

    session.record_exchange(exchange.clone()).await;
    Ok(Json(exchange))
}

/// GET /api/v1/documents/:id/chat
pub async fn handle_chat_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatExchange>>, AppError> {
    let session = state.documents.get(id).await?;
    Ok(Json(session.chat_history().await))
}
