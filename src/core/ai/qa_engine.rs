// =============================================================================
// GROUNDED Q&A ENGINE
// =============================================================================
//
// Answers a question from the current snapshot only. Each question is one
// self-contained request: instruction, record context, question. There is no
// conversation history.

use super::ai_service::{AiProvider, AiProviderError};
use super::context::{build_context, ContextKind, DEFAULT_CONTEXT_TOKENS};
use super::models::{AiConfig, AiMessage};
use crate::core::headaches::SnapshotState;
use std::time::Duration;

/// Total attempts per question: the first call plus one immediate retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Pause before the retry.
pub const RETRY_BACKOFF: Duration = Duration::ZERO;

/// Returned without calling the model when there is nothing to ground on.
pub const NO_DATA_ANSWER: &str = "No headache data is available yet, so I can't answer that. \
     Log some entries or run /refresh, then ask again.";

const GROUNDING_INSTRUCTION: &str = "You are a helpful assistant for headache tracking. \
Answer the user's question using ONLY the headache records and statistics provided in the \
data message. Do not use outside knowledge about the user and do not invent records, dates \
or numbers. If the provided data is not enough to answer, say explicitly that the data does \
not contain that information. When the data says only some records are listed in full, \
take that into account and say so if it limits your answer. Be concise and friendly and use \
simple language.";

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("Please ask a question")]
    EmptyQuestion,

    #[error("The language model could not answer right now: {0}")]
    Upstream(#[from] AiProviderError),
}

pub struct GroundedQaEngine<P: AiProvider> {
    provider: P,
    config: AiConfig,
    context_tokens: usize,
}

impl<P: AiProvider> GroundedQaEngine<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self {
            provider,
            config,
            context_tokens: DEFAULT_CONTEXT_TOKENS,
        }
    }

    pub fn with_context_tokens(mut self, context_tokens: usize) -> Self {
        self.context_tokens = context_tokens;
        self
    }

    /// Builds the exact messages sent for `question`, or `None` when the
    /// snapshot has no records.
    pub fn compose_messages(&self, question: &str, state: &SnapshotState) -> Option<Vec<AiMessage>> {
        let snapshot = state.snapshot().filter(|s| !s.is_empty())?;
        let context = build_context(&snapshot.records, self.context_tokens);
        if let ContextKind::Summary { listed, total } = &context.kind {
            tracing::debug!(listed = *listed, total = *total, "Log too long, sending summary context");
        }

        Some(vec![
            AiMessage::system(GROUNDING_INSTRUCTION),
            AiMessage::system(format!(
                "User's headache data (synced {}):\n{}",
                snapshot.synced_at.format("%Y-%m-%d %H:%M UTC"),
                context.text
            )),
            AiMessage::user(question),
        ])
    }

    pub async fn answer(&self, question: &str, state: &SnapshotState) -> Result<String, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        let Some(messages) = self.compose_messages(question, state) else {
            tracing::debug!("No records to ground on; returning the no-data answer");
            return Ok(NO_DATA_ANSWER.to_string());
        };

        let answer = self.complete_with_retry(&messages).await?;
        Ok(answer.trim().to_string())
    }

    async fn complete_with_retry(&self, messages: &[AiMessage]) -> Result<String, AiProviderError> {
        let mut attempt = 1;
        loop {
            match self.provider.chat_complete(messages, &self.config).await {
                Ok(answer) => return Ok(answer),
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, "Transient completion failure, retrying: {}", err);
                    attempt += 1;
                    if !RETRY_BACKOFF.is_zero() {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
                Err(err) => {
                    tracing::error!(attempt, "Completion failed: {}", err);
                    return Err(err);
                }
            }
        }
    }
}
