// =============================================================================
// DATA CACHE
// =============================================================================
//
// Holds the most recent `DataSnapshot` in memory.
//
// Publishing is a pointer swap: the new snapshot is fetched and parsed with
// no lock held, then a write guard is taken only long enough to replace the
// `Arc`. Readers clone the `Arc` under a read guard and never see a half-built
// snapshot. A separate mutex keeps refreshes single-flight.

use super::headache_models::{
    CacheStatus, DataSnapshot, RefreshSummary, SnapshotState,
};
use super::record_parser::parse_table;
use super::sheet_source::{SheetSource, SyncError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct DataCache<S: SheetSource> {
    source: S,
    snapshot: RwLock<Option<Arc<DataSnapshot>>>,
    last_error: RwLock<Option<String>>,
    refresh_lock: Mutex<()>,
}

impl<S: SheetSource> DataCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            last_error: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetches, parses and publishes a new snapshot.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// returned. Returns `RefreshInProgress` if another refresh is running.
    pub async fn refresh(&self) -> Result<RefreshSummary, SyncError> {
        let _guard = self
            .refresh_lock
            .try_lock()
            .map_err(|_| SyncError::RefreshInProgress)?;

        match self.build_snapshot().await {
            Ok(snapshot) => {
                let summary = snapshot.summary();
                let snapshot = Arc::new(snapshot);
                {
                    let mut current = self.snapshot.write().await;
                    *current = Some(snapshot);
                }
                *self.last_error.write().await = None;

                tracing::info!(
                    records = summary.record_count,
                    skipped = summary.skipped_count,
                    "Headache data refreshed"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!("Headache data refresh failed, keeping previous data: {}", err);
                *self.last_error.write().await = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn build_snapshot(&self) -> Result<DataSnapshot, SyncError> {
        let (source, table) = self.source.fetch_table().await?;
        let parsed = parse_table(&table)?;

        Ok(DataSnapshot {
            records: parsed.records,
            synced_at: Utc::now(),
            skipped_rows: parsed.skipped_rows,
            warnings: parsed.warnings,
            source,
        })
    }

    pub async fn current(&self) -> SnapshotState {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => SnapshotState::Synced(Arc::clone(snapshot)),
            None => SnapshotState::NeverSynced,
        }
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn status(&self) -> CacheStatus {
        CacheStatus {
            state: self.current().await,
            last_error: self.last_error().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::headaches::headache_models::{RawTable, SpreadsheetRef};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    type FetchResult = Result<(SpreadsheetRef, RawTable), SyncError>;

    /// Hands out queued results, one per fetch.
    struct ScriptedSource {
        results: StdMutex<VecDeque<FetchResult>>,
    }

    impl ScriptedSource {
        fn new(results: Vec<FetchResult>) -> Self {
            Self {
                results: StdMutex::new(results.into()),
            }
        }
    }

    #[async_trait]
    impl SheetSource for ScriptedSource {
        async fn fetch_table(&self) -> FetchResult {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SyncError::Upstream("script exhausted".to_string())))
        }
    }

    /// Blocks every fetch until released.
    struct GatedSource {
        gate: Arc<Notify>,
        rows: usize,
    }

    #[async_trait]
    impl SheetSource for GatedSource {
        async fn fetch_table(&self) -> FetchResult {
            self.gate.notified().await;
            Ok(table_with_rows(self.rows))
        }
    }

    fn sheet() -> SpreadsheetRef {
        SpreadsheetRef {
            id: "sheet-1".to_string(),
            name: "Headache Log".to_string(),
            modified_time: None,
        }
    }

    fn table_with_rows(count: usize) -> (SpreadsheetRef, RawTable) {
        let rows = (0..count)
            .map(|i| vec![format!("2024-01-{:02}", i % 28 + 1), "5".to_string()])
            .collect();
        (
            sheet(),
            RawTable {
                header: vec!["Date".to_string(), "Severity".to_string()],
                rows,
            },
        )
    }

    #[tokio::test]
    async fn test_never_synced_before_first_refresh() {
        let cache = DataCache::new(ScriptedSource::new(vec![]));
        assert!(matches!(cache.current().await, SnapshotState::NeverSynced));
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let cache = DataCache::new(ScriptedSource::new(vec![Ok(table_with_rows(3))]));

        let summary = cache.refresh().await.unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.skipped_count, 0);

        let state = cache.current().await;
        let snapshot = state.snapshot().expect("snapshot should be published");
        assert_eq!(snapshot.record_count(), 3);
        assert_eq!(snapshot.source.name, "Headache Log");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let cache = DataCache::new(ScriptedSource::new(vec![
            Ok(table_with_rows(2)),
            Err(SyncError::NotFound("folder is empty".to_string())),
        ]));

        cache.refresh().await.unwrap();
        let before = cache.current().await.snapshot().cloned().unwrap();

        let err = cache.refresh().await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));

        let after = cache.current().await.snapshot().cloned().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert!(cache.last_error().await.unwrap().contains("folder is empty"));
    }

    #[tokio::test]
    async fn test_schema_failure_keeps_previous_snapshot() {
        let (sheet, _) = table_with_rows(0);
        let broken = RawTable {
            header: vec!["When".to_string()],
            rows: vec![],
        };
        let cache = DataCache::new(ScriptedSource::new(vec![
            Ok(table_with_rows(4)),
            Ok((sheet, broken)),
            Ok(table_with_rows(1)),
        ]));

        cache.refresh().await.unwrap();
        assert!(matches!(cache.refresh().await, Err(SyncError::Schema(_))));
        assert_eq!(cache.current().await.snapshot().unwrap().record_count(), 4);

        // Success clears the remembered failure.
        cache.refresh().await.unwrap();
        assert_eq!(cache.current().await.snapshot().unwrap().record_count(), 1);
        assert!(cache.last_error().await.is_none());
    }

    #[tokio::test]
    async fn test_second_refresh_while_running_is_rejected() {
        let gate = Arc::new(Notify::new());
        let cache = Arc::new(DataCache::new(GatedSource {
            gate: Arc::clone(&gate),
            rows: 1,
        }));

        let running = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh().await })
        };
        tokio::task::yield_now().await;
        while cache.refresh_lock.try_lock().is_ok() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            cache.refresh().await,
            Err(SyncError::RefreshInProgress)
        ));

        gate.notify_one();
        assert_eq!(running.await.unwrap().unwrap().record_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_snapshot() {
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            gate: Arc::clone(&gate),
            rows: 500,
        };
        let cache = Arc::new(DataCache::new(source));

        let refresher = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh().await })
        };

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        match cache.current().await {
                            SnapshotState::NeverSynced => {}
                            SnapshotState::Synced(snapshot) => {
                                assert_eq!(snapshot.records.len(), 500);
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        gate.notify_one();
        refresher.await.unwrap().unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(cache.current().await.snapshot().unwrap().record_count(), 500);
    }
}
