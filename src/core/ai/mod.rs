pub mod ai_service;
pub mod context;
pub mod models;
pub mod qa_engine;

pub use ai_service::{AiProvider, AiProviderError};
pub use models::{AiConfig, AiMessage};
pub use qa_engine::{GroundedQaEngine, QaError, NO_DATA_ANSWER};
