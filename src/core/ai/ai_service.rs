use super::models::{AiConfig, AiMessage};
use async_trait::async_trait;

/// Failure talking to the completion service.
#[derive(Debug, thiserror::Error)]
pub enum AiProviderError {
    #[error("Completion request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion API error: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected completion response: {0}")]
    InvalidResponse(String),
}

impl AiProviderError {
    /// Connection-level failures and gateway errors. Timeouts are not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AiProviderError::Network(_) => true,
            AiProviderError::Http { status, .. } => matches!(status, 502 | 503 | 504),
            AiProviderError::Timeout | AiProviderError::InvalidResponse(_) => false,
        }
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request and returns the reply text.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiProviderError>;
}

// Blanket implementation for Box<dyn AiProvider> so the engine can hold a
// provider chosen at runtime.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiProviderError> {
        (**self).chat_complete(messages, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AiProviderError::Network("reset".to_string()).is_transient());
        assert!(AiProviderError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!AiProviderError::Http {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!AiProviderError::Timeout.is_transient());
    }
}
