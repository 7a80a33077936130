pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::chat::handlers as chat;
use crate::documents::handlers as documents;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route("/api/v1/documents", post(documents::handle_create_document))
        .route(
            "/api/v1/documents/:id",
            get(documents::handle_get_document).delete(documents::handle_close_document),
        )
        .route(
            "/api/v1/documents/:id/text",
            get(documents::handle_get_document_text),
        )
        .route(
            "/api/v1/documents/:id/pages/:page_id",
            put(documents::handle_edit_page).delete(documents::handle_remove_page),
        )
        // Chat
        .route(
            "/api/v1/documents/:id/chat",
            get(chat::handle_chat_history).post(chat::handle_send_message),
        )
        .with_state(state)
}
