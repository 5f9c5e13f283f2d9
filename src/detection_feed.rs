//! Detection feed reconciliation
//!
//! ## Responsibilities
//!
//! - Maintain the bounded "recent detections" view under two sources:
//!   push events (prepend at head, truncate) and pull snapshots (wholesale
//!   replace)
//! - Trigger the aggregate-stats refresh after each applied push
//! - Contain fetch failures: prior state is retained, nothing is surfaced
//!
//! The pull path does not merge with interim push entries; it is
//! the consistency fallback and wins outright on each tick. Feed order is
//! push order, not a guaranteed timestamp sort.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Detection, DetectionStats};

/// Maximum feed length
pub const FEED_CAPACITY: usize = 20;

/// Pull-side collaborator for detections and aggregate stats
pub trait DetectionSource: Send + Sync {
    /// Up to 20 recent detections, newest first
    fn fetch_recent(&self) -> impl Future<Output = Result<Vec<Detection>>> + Send;
    /// Today's aggregate counters
    fn fetch_stats(&self) -> impl Future<Output = Result<DetectionStats>> + Send;
}

/// Reconciles push and pull updates into one capped feed.
pub struct FeedReconciler<S> {
    source: Arc<S>,
    /// Front is newest
    feed: RwLock<VecDeque<Detection>>,
    stats: RwLock<DetectionStats>,
}

impl<S: DetectionSource> FeedReconciler<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            feed: RwLock::new(VecDeque::with_capacity(FEED_CAPACITY)),
            stats: RwLock::new(DetectionStats::default()),
        }
    }

    /// Apply a push-arrived detection: insert at head, truncate to capacity,
    /// then refresh the aggregate stats as a follow-up pull.
    ///
    /// An entry with the same id is removed first so identities stay unique;
    /// ordering is still insertion order, never a re-sort.
    pub async fn apply_push(&self, detection: Detection) {
        {
            let mut feed = self.feed.write().await;
            feed.retain(|d| d.id != detection.id);
            feed.push_front(detection.clone());
            feed.truncate(FEED_CAPACITY);
        }

        tracing::debug!(
            detection_id = %detection.id,
            camera_id = %detection.camera_id,
            plate = %detection.plate,
            "Push detection applied to feed"
        );

        self.refresh_stats().await;
    }

    /// Pull refresh: the fetched snapshot replaces the feed wholesale. A
    /// failed fetch leaves the feed untouched.
    pub async fn refresh_feed(&self) {
        match self.source.fetch_recent().await {
            Ok(snapshot) => {
                let mut feed = self.feed.write().await;
                feed.clear();
                feed.extend(snapshot.into_iter().take(FEED_CAPACITY));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Detection pull failed, keeping current feed");
            }
        }
    }

    /// Refresh today's aggregate counters. A failed fetch keeps the prior
    /// values.
    pub async fn refresh_stats(&self) {
        match self.source.fetch_stats().await {
            Ok(stats) => {
                *self.stats.write().await = stats;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stats pull failed, keeping current counters");
            }
        }
    }

    /// Read-only feed snapshot, newest first
    pub async fn feed_snapshot(&self) -> Vec<Detection> {
        self.feed.read().await.iter().cloned().collect()
    }

    /// Read-only stats snapshot
    pub async fn stats_snapshot(&self) -> DetectionStats {
        *self.stats.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    fn detection(id: &str) -> Detection {
        Detection {
            id: id.to_string(),
            camera_id: "c1".to_string(),
            plate: format!("34ABC{}", id),
            status: "allowed".to_string(),
            confidence: 0.9,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 4, 10, 0, 0).unwrap(),
            image_base64: None,
            owner_info: None,
        }
    }

    struct FakeSource {
        recent: Mutex<Result<Vec<Detection>>>,
        stats: Mutex<Result<DetectionStats>>,
        stats_calls: AtomicU32,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                recent: Mutex::new(Ok(vec![])),
                stats: Mutex::new(Ok(DetectionStats::default())),
                stats_calls: AtomicU32::new(0),
            }
        }
    }

    impl DetectionSource for FakeSource {
        async fn fetch_recent(&self) -> Result<Vec<Detection>> {
            match &*self.recent.lock().await {
                Ok(v) => Ok(v.clone()),
                Err(_) => Err(crate::Error::Fetch("recent unavailable".to_string())),
            }
        }

        async fn fetch_stats(&self) -> Result<DetectionStats> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            match &*self.stats.lock().await {
                Ok(s) => Ok(*s),
                Err(_) => Err(crate::Error::Fetch("stats unavailable".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_push_sequence_is_reverse_arrival_order() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source);

        for i in 0..5 {
            reconciler.apply_push(detection(&format!("d{}", i))).await;
        }

        let feed = reconciler.feed_snapshot().await;
        let ids: Vec<_> = feed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d4", "d3", "d2", "d1", "d0"]);
    }

    #[tokio::test]
    async fn test_feed_capped_at_twenty() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source);

        for i in 0..30 {
            reconciler.apply_push(detection(&format!("d{}", i))).await;
        }

        let feed = reconciler.feed_snapshot().await;
        assert_eq!(feed.len(), FEED_CAPACITY);
        assert_eq!(feed[0].id, "d29");
        assert_eq!(feed[FEED_CAPACITY - 1].id, "d10");
    }

    #[tokio::test]
    async fn test_push_same_id_keeps_identity_unique() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source);

        reconciler.apply_push(detection("d1")).await;
        reconciler.apply_push(detection("d2")).await;
        reconciler.apply_push(detection("d1")).await;

        let feed = reconciler.feed_snapshot().await;
        let ids: Vec<_> = feed.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
    }

    #[tokio::test]
    async fn test_pull_replaces_wholesale() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source.clone());

        for i in 0..20 {
            reconciler.apply_push(detection(&format!("old{}", i))).await;
        }

        let snapshot: Vec<_> = (0..5).map(|i| detection(&format!("new{}", i))).collect();
        *source.recent.lock().await = Ok(snapshot);

        reconciler.refresh_feed().await;

        let feed = reconciler.feed_snapshot().await;
        assert_eq!(feed.len(), 5);
        assert!(feed.iter().all(|d| d.id.starts_with("new")));
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_feed_unchanged() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source.clone());

        reconciler.apply_push(detection("d1")).await;
        let before = reconciler.feed_snapshot().await;

        *source.recent.lock().await = Err(crate::Error::Fetch("down".to_string()));
        reconciler.refresh_feed().await;

        assert_eq!(reconciler.feed_snapshot().await, before);
    }

    #[tokio::test]
    async fn test_push_triggers_stats_refresh_exactly_once() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source.clone());

        *source.stats.lock().await = Ok(DetectionStats {
            total_today: 7,
            allowed_today: 5,
            blocked_today: 1,
            unknown_today: 1,
        });

        reconciler.apply_push(detection("d1")).await;

        assert_eq!(source.stats_calls.load(Ordering::SeqCst), 1);
        assert_eq!(reconciler.stats_snapshot().await.total_today, 7);
    }

    #[tokio::test]
    async fn test_failed_stats_keeps_prior_counters() {
        let source = Arc::new(FakeSource::new());
        let reconciler = FeedReconciler::new(source.clone());

        *source.stats.lock().await = Ok(DetectionStats {
            total_today: 3,
            ..DetectionStats::default()
        });
        reconciler.refresh_stats().await;

        *source.stats.lock().await = Err(crate::Error::Fetch("down".to_string()));
        reconciler.refresh_stats().await;

        assert_eq!(reconciler.stats_snapshot().await.total_today, 3);
    }
}
