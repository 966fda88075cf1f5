// The two operations callers see: ask a question, refresh the data.
//
// This is what the Discord commands talk to. It owns the cache and the Q&A
// engine and passes the cache's current snapshot into each question.

use super::data_cache::DataCache;
use super::headache_models::{CacheStatus, RefreshSummary};
use super::sheet_source::{SheetSource, SyncError};
use crate::core::ai::{AiProvider, GroundedQaEngine, QaError};

pub struct HeadacheService<S: SheetSource, P: AiProvider> {
    cache: DataCache<S>,
    qa: GroundedQaEngine<P>,
}

impl<S: SheetSource, P: AiProvider> HeadacheService<S, P> {
    pub fn new(cache: DataCache<S>, qa: GroundedQaEngine<P>) -> Self {
        Self { cache, qa }
    }

    pub async fn get_answer(&self, question: &str) -> Result<String, QaError> {
        let state = self.cache.current().await;
        self.qa.answer(question, &state).await
    }

    pub async fn refresh_data(&self) -> Result<RefreshSummary, SyncError> {
        self.cache.refresh().await
    }

    pub async fn status(&self) -> CacheStatus {
        self.cache.status().await
    }
}
