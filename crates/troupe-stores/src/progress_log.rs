//! ProgressLog implementations

use async_trait::async_trait;
use std::sync::RwLock;

use troupe_core::store::{ProgressLog, StoreError};
use troupe_core::ProgressEvent;

const DEFAULT_IN_MEMORY_EVENT_LIMIT: usize = 10_000;

/// In-memory journal for development and testing.
///
/// Holds one session's events in append order. When the capacity limit is
/// reached the oldest entries are dropped, so long runs keep a bounded tail
/// rather than growing without end.
pub struct InMemoryProgressLog {
    events: RwLock<Vec<ProgressEvent>>,
    max_events: usize,
}

impl InMemoryProgressLog {
    /// Create a new in-memory journal
    pub fn new() -> Self {
        Self::with_max_events(DEFAULT_IN_MEMORY_EVENT_LIMIT)
    }

    /// Create a new in-memory journal with a hard capacity limit.
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max_events.max(1),
        }
    }
}

impl Default for InMemoryProgressLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressLog for InMemoryProgressLog {
    async fn append(&self, event: ProgressEvent) -> Result<(), StoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if events.len() >= self.max_events {
            let overflow = events.len() + 1 - self.max_events;
            events.drain(0..overflow);
        }
        events.push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ProgressEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let start = events.len().saturating_sub(limit);
        Ok(events[start..].to_vec())
    }

    async fn all(&self) -> Result<Vec<ProgressEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_log_preserves_append_order() {
        tokio_test::block_on(async {
            let log = InMemoryProgressLog::new();
            log.append(ProgressEvent::plan_accepted("s1"))
                .await
                .expect("append");
            log.append(ProgressEvent::step_started("s1", "a", 1, 2))
                .await
                .expect("append");
            log.append(ProgressEvent::step_started("s1", "b", 2, 2))
                .await
                .expect("append");

            let all = log.all().await.expect("all");
            let kinds: Vec<_> = all.iter().map(|e| e.kind()).collect();
            assert_eq!(kinds, ["plan_accepted", "step_started", "step_started"]);
        });
    }

    #[test]
    fn test_in_memory_log_recent_returns_tail_oldest_first() {
        tokio_test::block_on(async {
            let log = InMemoryProgressLog::new();
            for i in 1..=5 {
                log.append(ProgressEvent::step_started("s1", format!("t{}", i), i, 5))
                    .await
                    .expect("append");
            }

            let tail = log.recent(2).await.expect("recent");
            assert_eq!(tail.len(), 2);
            assert_eq!(tail[0].task_id().map(|id| id.as_str()), Some("t4"));
            assert_eq!(tail[1].task_id().map(|id| id.as_str()), Some("t5"));
        });
    }

    #[test]
    fn test_in_memory_log_evicts_oldest_when_limit_exceeded() {
        tokio_test::block_on(async {
            let log = InMemoryProgressLog::with_max_events(2);
            for i in 1..=3 {
                log.append(ProgressEvent::step_started("s1", format!("t{}", i), i, 3))
                    .await
                    .expect("append");
            }

            let all = log.all().await.expect("all");
            assert_eq!(all.len(), 2);
            assert_eq!(all[0].task_id().map(|id| id.as_str()), Some("t2"));
            assert_eq!(all[1].task_id().map(|id| id.as_str()), Some("t3"));
        });
    }
}
