//! Time-bounded report cache.
//!
//! A cached [`Report`] is served unchanged until it is older than the TTL.
//! The next request after that regenerates the whole report and replaces the
//! cached one. Regeneration holds the cache lock, so concurrent callers that
//! miss at the same time wait for one scan instead of starting their own.
//!
//! Appending events does not invalidate the cache; a report may lag the log
//! by up to one TTL.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use doorbell_types::Report;
use tokio::sync::Mutex;

use crate::report::StatsEngine;

/// Default time a report stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// Caches the most recent [`Report`] for a fixed TTL.
#[derive(Debug)]
pub struct ReportCache {
    engine: StatsEngine,
    ttl_ms: i64,
    current: Mutex<Option<Arc<Report>>>,
    regenerations: AtomicU64,
}

impl ReportCache {
    /// Create an empty cache over `engine`.
    pub fn new(engine: StatsEngine, ttl: Duration) -> Self {
        Self {
            engine,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            current: Mutex::new(None),
            regenerations: AtomicU64::new(0),
        }
    }

    /// Return the cached report, regenerating it first if missing or stale.
    pub async fn get(&self) -> Arc<Report> {
        let mut current = self.current.lock().await;
        let now_ms = self.engine.clock().now_ms();

        let fresh = current
            .as_ref()
            .filter(|r| now_ms.saturating_sub(r.generated_at_ms) < self.ttl_ms);
        if let Some(report) = fresh {
            return Arc::clone(report);
        }

        tracing::debug!(ttl_ms = self.ttl_ms, "Report cache miss, regenerating");
        let report = Arc::new(self.engine.generate().await);
        self.regenerations.fetch_add(1, Ordering::Relaxed);
        *current = Some(Arc::clone(&report));
        report
    }

    /// The cached report without regenerating, fresh or not.
    pub async fn peek(&self) -> Option<Arc<Report>> {
        self.current.lock().await.clone()
    }

    /// Drop the cached report so the next [`get`](Self::get) regenerates.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    /// How many times the report has been regenerated.
    pub fn regenerations(&self) -> u64 {
        self.regenerations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use doorbell_core::clock::ManualClock;
    use doorbell_db::Database;
    use doorbell_types::{ActorId, EventType, NewEvent};

    use super::*;
    use crate::zone::DisplayZone;

    async fn setup(ttl: Duration) -> (Database, Arc<ManualClock>, Arc<ReportCache>) {
        let db = Database::connect_in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let clock = Arc::new(ManualClock::new(1_000));
        let engine = StatsEngine::new(db.events(), db.reactions(), clock.clone())
            .with_zone(DisplayZone::Utc);
        (db, clock, Arc::new(ReportCache::new(engine, ttl)))
    }

    async fn open(db: &Database, ts: i64) {
        db.events()
            .append(&NewEvent::new(ts, EventType::Open, ActorId(2)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn hit_returns_same_snapshot() {
        let (_db, clock, cache) = setup(Duration::from_secs(60)).await;
        let first = cache.get().await;
        clock.advance(59_999);
        let second = cache.get().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.regenerations(), 1);
    }

    #[tokio::test]
    async fn appends_are_invisible_until_expiry() {
        let (db, clock, cache) = setup(Duration::from_secs(60)).await;
        assert_eq!(cache.get().await.users.opens.len(), 0);

        open(&db, 1_500).await;
        clock.advance(1_000);
        assert_eq!(cache.get().await.users.opens.len(), 0);

        clock.advance(60_000);
        let fresh = cache.get().await;
        assert_eq!(fresh.users.opens.len(), 1);
        assert_eq!(fresh.generated_at_ms, 62_000);
        assert_eq!(cache.regenerations(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_regeneration() {
        let (db, _clock, cache) = setup(Duration::from_secs(60)).await;
        cache.get().await;
        open(&db, 1_000).await;
        cache.invalidate().await;
        assert!(cache.peek().await.is_none());
        assert_eq!(cache.get().await.users.opens.len(), 1);
        assert_eq!(cache.regenerations(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_regeneration() {
        let (_db, _clock, cache) = setup(Duration::from_secs(60)).await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get().await }));
        }
        let mut reports = Vec::new();
        for handle in handles {
            reports.push(handle.await.unwrap());
        }
        assert_eq!(cache.regenerations(), 1);
        let first = reports.first().unwrap();
        assert!(reports.iter().all(|r| Arc::ptr_eq(first, r)));
    }
}
