//! Document chat: sends one message to several models at once, with the document as context.
//!
//! Each selected model is queried concurrently. Replies are recorded independently: a model
//! that fails is stored as an `Error: ...` reply and never fails its siblings.
//!
//! `AppState` holds an `Arc<dyn ChatBackend>`; production uses `LlmClient`, tests use stubs.

pub mod handlers;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{error, warn};
use uuid::Uuid;

use crate::chat::prompts::{build_chat_prompt, CHAT_SYSTEM};
use crate::llm_client::{ChatModel, LlmError};

/// Anything that can answer a prompt on behalf of a chat model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        model: ChatModel,
        prompt: &str,
        system: &str,
    ) -> Result<String, LlmError>;
}

/// One model's answer within an exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub model: ChatModel,
    pub reply: String,
    pub ok: bool,
}

/// A user message and every selected model's reply, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub id: Uuid,
    pub text: String,
    pub responses: Vec<ModelReply>,
    pub timestamp: DateTime<Utc>,
}

/// Drops repeated selections, keeping first occurrence order.
pub fn dedupe_models(models: &[ChatModel]) -> Vec<ChatModel> {
    let mut seen = Vec::with_capacity(models.len());
    for model in models {
        if !seen.contains(model) {
            seen.push(*model);
        }
    }
    seen
}

/// Queries every model in `models` concurrently and collects the replies.
pub async fn fan_out(
    backend: Arc<dyn ChatBackend>,
    models: &[ChatModel],
    message: &str,
    document: &str,
) -> ChatExchange {
    let models = dedupe_models(models);
    let prompt = build_chat_prompt(document, message);

    let mut tasks = JoinSet::new();
    for (slot, model) in models.iter().copied().enumerate() {
        let backend = Arc::clone(&backend);
        let prompt = prompt.clone();
        tasks.spawn(async move {
            let result = backend.complete(model, &prompt, CHAT_SYSTEM).await;
            (slot, model, result)
        });
    }

    let mut replies: Vec<Option<ModelReply>> = vec![None; models.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, model, Ok(reply))) => {
                replies[slot] = Some(ModelReply {
                    model,
                    reply,
                    ok: true,
                });
            }
            Ok((slot, model, Err(e))) => {
                warn!(?model, error = %e, "Chat model call failed");
                replies[slot] = Some(ModelReply {
                    model,
                    reply: format!("Error: {e}"),
                    ok: false,
                });
            }
            Err(e) => error!("Chat task did not complete: {e}"),
        }
    }

    let responses = models
        .iter()
        .zip(replies)
        .map(|(model, reply)| {
            reply.unwrap_or_else(|| ModelReply {
                model: *model,
                reply: "Error: request did not complete".to_string(),
                ok: false,
            })
        })
        .collect();

    ChatExchange {
        id: Uuid::new_v4(),
        text: message.to_string(),
        responses,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Echoes the model name, fails for Llama, and records every prompt it sees.
    #[derive(Default)]
    pub(crate) struct StubBackend {
        pub prompts: Mutex<Vec<(ChatModel, String)>>,
    }

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn complete(
            &self,
            model: ChatModel,
            prompt: &str,
            _system: &str,
        ) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .expect("stub lock")
                .push((model, prompt.to_string()));
            match model {
                ChatModel::Llama => Err(LlmError::NotConfigured {
                    provider: "Together",
                }),
                other => Ok(format!("reply from {other:?}")),
            }
        }
    }

    #[test]
    fn test_dedupe_models_keeps_first_order() {
        let models = [
            ChatModel::ChatGpt,
            ChatModel::Claude,
            ChatModel::ChatGpt,
            ChatModel::Claude,
        ];
        assert_eq!(
            dedupe_models(&models),
            vec![ChatModel::ChatGpt, ChatModel::Claude]
        );
    }

    #[tokio::test]
    async fn test_fan_out_collects_replies_in_selection_order() {
        let backend = Arc::new(StubBackend::default());
        let exchange = fan_out(
            backend.clone(),
            &[ChatModel::ChatGpt, ChatModel::Claude],
            "Tighten the intro",
            "Once upon a time",
        )
        .await;

        assert_eq!(exchange.text, "Tighten the intro");
        let models: Vec<ChatModel> = exchange.responses.iter().map(|r| r.model).collect();
        assert_eq!(models, vec![ChatModel::ChatGpt, ChatModel::Claude]);
        assert!(exchange.responses.iter().all(|r| r.ok));
        assert_eq!(exchange.responses[1].reply, "reply from Claude");

        let prompts = backend.prompts.lock().expect("stub lock");
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|(_, p)| p.contains("Once upon a time")));
    }

    #[tokio::test]
    async fn test_failed_model_does_not_fail_siblings() {
        let backend = Arc::new(StubBackend::default());
        let exchange = fan_out(
            backend,
            &[ChatModel::Claude, ChatModel::Llama],
            "hello",
            "",
        )
        .await;

        assert!(exchange.responses[0].ok);
        assert!(!exchange.responses[1].ok);
        assert!(exchange.responses[1].reply.starts_with("Error: "));
        assert!(exchange.responses[1].reply.contains("Together"));
    }
}
