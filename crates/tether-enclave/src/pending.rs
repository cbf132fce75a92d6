// ABOUTME: Bounded table of requests awaiting a response, keyed by request ID.
// ABOUTME: LRU-evicts the oldest waiter past capacity and wakes it with an abandoned resolution.

use crate::error::ChannelError;
use crate::protocol::Response;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Capacity of the pending table.
pub const DEFAULT_PENDING_CAPACITY: usize = 128;

/// The single value written to a waiter's slot.
#[derive(Debug)]
pub enum Resolution {
    /// The enclave answered.
    Answered(Response),
    /// Gave up: evicted from the table, or the drain loop hit its deadline.
    Abandoned,
    /// The channel failed while we were still waiting.
    ChannelFailed(ChannelError),
}

/// Receiving end of a pending slot.
pub type ResponseSlot = oneshot::Receiver<Resolution>;

/// Request ID -> waiter, bounded, least recently used evicted first.
///
/// Every slot is written at most once: on resolve, on eviction, or on
/// abandon. Removing an entry without writing drops the sender, which the
/// waiter also observes as closed.
pub struct PendingRequests {
    slots: LruCache<String, oneshot::Sender<Resolution>>,
}

impl PendingRequests {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: LruCache::new(capacity),
        }
    }

    /// Register a waiter for `request_id` and return its slot.
    ///
    /// If the table is full the oldest waiter is evicted and resolved as
    /// abandoned. A duplicate ID replaces the previous waiter without
    /// notifying it; its slot closes with no resolution.
    pub fn register(&mut self, request_id: String) -> ResponseSlot {
        let (tx, rx) = oneshot::channel();
        if let Some((evicted_id, evicted)) = self.slots.push(request_id.clone(), tx) {
            if evicted_id != request_id {
                warn!(
                    request_id = %evicted_id,
                    capacity = self.capacity(),
                    "Pending table full, evicting oldest request"
                );
                let _ = evicted.send(Resolution::Abandoned);
            }
        }
        rx
    }

    /// Deliver `resolution` to the waiter for `request_id` and drop the entry.
    ///
    /// Returns false if nobody is waiting (never issued, evicted, or already
    /// resolved).
    pub fn resolve(&mut self, request_id: &str, resolution: Resolution) -> bool {
        match self.slots.pop(request_id) {
            Some(tx) => {
                if tx.send(resolution).is_err() {
                    debug!(request_id = %request_id, "Waiter already gone");
                }
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `request_id` without writing to it.
    pub fn remove(&mut self, request_id: &str) -> bool {
        self.slots.pop(request_id).is_some()
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.slots.contains(request_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.cap().get()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ListResponse, ResponseBody};

    fn response(id: &str) -> Response {
        Response {
            request_id: id.to_string(),
            body: ResponseBody::List(ListResponse::default()),
            sns_endpoint_arn: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_delivers_once() {
        let mut pending = PendingRequests::default();
        let slot = pending.register("a".to_string());
        assert!(pending.contains("a"));

        assert!(pending.resolve("a", Resolution::Answered(response("a"))));
        assert!(!pending.contains("a"));
        assert!(!pending.resolve("a", Resolution::Abandoned));

        match slot.await.unwrap() {
            Resolution::Answered(r) => assert_eq!(r.request_id, "a"),
            other => panic!("unexpected resolution {:?}", other),
        }
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut pending = PendingRequests::default();
        let _slot = pending.register("a".to_string());
        assert!(!pending.resolve("zzz", Resolution::Answered(response("zzz"))));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_oldest_evicted_past_capacity() {
        let mut pending = PendingRequests::default();
        let first = pending.register("req-0".to_string());
        let mut rest = Vec::new();
        for i in 1..DEFAULT_PENDING_CAPACITY {
            rest.push(pending.register(format!("req-{i}")));
        }
        assert_eq!(pending.len(), DEFAULT_PENDING_CAPACITY);
        assert!(pending.contains("req-0"));

        let _overflow = pending.register("req-overflow".to_string());
        assert_eq!(pending.len(), DEFAULT_PENDING_CAPACITY);
        assert!(!pending.contains("req-0"));
        assert!(pending.contains("req-1"));
        assert!(matches!(first.await, Ok(Resolution::Abandoned)));
    }

    #[tokio::test]
    async fn test_duplicate_id_replaces_waiter() {
        let mut pending = PendingRequests::new(4);
        let old = pending.register("dup".to_string());
        let new = pending.register("dup".to_string());
        assert_eq!(pending.len(), 1);

        // replaced waiter sees its sender dropped, never a value
        assert!(old.await.is_err());

        pending.resolve("dup", Resolution::Abandoned);
        assert!(matches!(new.await, Ok(Resolution::Abandoned)));
    }

    #[tokio::test]
    async fn test_remove_closes_slot() {
        let mut pending = PendingRequests::new(2);
        let slot = pending.register("x".to_string());
        assert!(pending.remove("x"));
        assert!(pending.is_empty());
        assert!(slot.await.is_err());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(PendingRequests::new(0).capacity(), 1);
    }
}
