use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::documents::{EditOutcome, EditorSession, PageView};
use crate::errors::AppError;
use crate::pagination::{PageId, ReflowReport};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub struct EditPageRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub pages: Vec<PageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReflowReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

#[derive(Serialize)]
pub struct DocumentTextResponse {
    pub text: String,
}

impl DocumentResponse {
    async fn settled(session: &EditorSession, outcome: EditOutcome) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            pages: session.pages().await,
            report: Some(outcome.report),
            interrupted: outcome.interrupted,
        }
    }
}

/// POST /api/v1/documents
pub async fn handle_create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (session, outcome) = state.documents.create(req.text).await?;
    let response = DocumentResponse::settled(&session, outcome).await;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let session = state.documents.get(id).await?;
    Ok(Json(DocumentResponse {
        id,
        created_at: session.created_at,
        pages: session.pages().await,
        report: None,
        interrupted: None,
    }))
}

/// GET /api/v1/documents/:id/text
pub async fn handle_get_document_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentTextResponse>, AppError> {
    let session = state.documents.get(id).await?;
    Ok(Json(DocumentTextResponse {
        text: session.document_text().await,
    }))
}

/// PUT /api/v1/documents/:id/pages/:page_id
pub async fn handle_edit_page(
    State(state): State<AppState>,
    Path((id, page_id)): Path<(Uuid, PageId)>,
    Json(req): Json<EditPageRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let session = state.documents.get(id).await?;
    let outcome = session.edit_page(page_id, req.content).await?;
    Ok(Json(DocumentResponse::settled(&session, outcome).await))
}

/// DELETE /api/v1/documents/:id/pages/:page_id
pub async fn handle_remove_page(
    State(state): State<AppState>,
    Path((id, page_id)): Path<(Uuid, PageId)>,
) -> Result<Json<DocumentResponse>, AppError> {
    let session = state.documents.get(id).await?;
    let outcome = session.remove_page(page_id).await?;
    Ok(Json(DocumentResponse::settled(&session, outcome).await))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_close_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.documents.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
