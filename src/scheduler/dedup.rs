//! Discovery deduplication.
//!
//! Membership set ensuring a discovered resource ID is scheduled at most
//! once per run. Owned by the scheduler; the lock linearizes concurrent
//! discoveries of the same ID. Records are never removed during a run
//! unless a size cap forces FIFO truncation of the oldest entries, in which
//! case a truncated ID may be rediscovered (at-least-once stays intact).

use std::collections::{HashSet, VecDeque};

use tokio::sync::Mutex;
use tracing::warn;

pub struct DedupRecord {
    inner: Mutex<DedupInner>,
    cap: usize,
}

struct DedupInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
    truncations: u64,
}

impl DedupRecord {
    /// `cap` of 0 means unbounded.
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(DedupInner {
                seen: HashSet::new(),
                order: VecDeque::new(),
                truncations: 0,
            }),
            cap,
        }
    }

    /// Atomically record an ID. Returns true if it was newly seen and should
    /// be scheduled.
    pub async fn try_claim(&self, resource_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.seen.contains(resource_id) {
            return false;
        }
        if self.cap > 0 && inner.seen.len() >= self.cap {
            if let Some(oldest) = inner.order.pop_front() {
                inner.seen.remove(&oldest);
                inner.truncations += 1;
                if inner.truncations == 1 {
                    warn!(
                        cap = self.cap,
                        "dedup record full, truncating oldest entries; \
                         rediscovered IDs may be crawled again"
                    );
                }
            }
        }
        inner.seen.insert(resource_id.to_string());
        inner.order.push_back(resource_id.to_string());
        true
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claims_each_id_once() {
        let dedup = DedupRecord::new(0);
        assert!(dedup.try_claim("a").await);
        assert!(!dedup.try_claim("a").await);
        assert!(dedup.try_claim("b").await);
        assert_eq!(dedup.len().await, 2);
    }

    #[tokio::test]
    async fn test_cap_truncates_oldest() {
        let dedup = DedupRecord::new(2);
        assert!(dedup.try_claim("a").await);
        assert!(dedup.try_claim("b").await);
        assert!(dedup.try_claim("c").await);
        // "a" was truncated out and can be claimed again.
        assert!(dedup.try_claim("a").await);
        // "c" is still tracked.
        assert!(!dedup.try_claim("c").await);
    }
}
