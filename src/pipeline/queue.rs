use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// What happens when `push` is called against a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Reject the incoming item, keeping what's already queued (§4.1: the
    /// ingress queue drops the new datagram on overflow).
    DropNewest,
    /// Evict the oldest queued item to make room for the incoming one
    /// (§4.5: the egress queue drops the oldest datagram on overflow, to
    /// favor fresher telemetry).
    DropOldest,
}

/// A bounded queue shared between one producer role and one consumer role.
///
/// `std::sync::mpsc::sync_channel` covers the ingress queue's drop-newest
/// behavior directly via `try_send`, but has no way to evict an
/// already-queued item, which the egress queue's drop-oldest policy (§4.5)
/// needs. This type covers both policies with the same bounded
/// Mutex+Condvar shape so ingress and egress share one queue
/// implementation rather than splitting the pipeline across two different
/// channel primitives.
pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    capacity: usize,
    policy: DropPolicy,
    closed: AtomicBool,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize, policy: DropPolicy) -> Self {
        BoundedQueue {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            not_empty: Condvar::new(),
            capacity: capacity.max(1),
            policy,
            closed: AtomicBool::new(false),
        }
    }

    /// Pushes an item, applying the configured drop policy on overflow.
    /// Returns `true` if an item was dropped (either the incoming one, for
    /// `DropNewest`, or an evicted older one, for `DropOldest`) so the
    /// caller can bump `pkts_dropped_queue`.
    pub fn push(&self, item: T) -> bool {
        let mut queue = self.inner.lock().unwrap();

        if queue.len() >= self.capacity {
            match self.policy {
                DropPolicy::DropNewest => return true,
                DropPolicy::DropOldest => {
                    queue.pop_front();
                    queue.push_back(item);
                    drop(queue);
                    self.not_empty.notify_one();
                    return true;
                }
            }
        }

        queue.push_back(item);
        drop(queue);
        self.not_empty.notify_one();
        false
    }

    /// Blocks up to `timeout` for an item. Returns `None` on timeout or once
    /// the queue is closed and drained.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut queue = self.inner.lock().unwrap();
        loop {
            if let Some(item) = queue.pop_front() {
                return Some(item);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            let (guard, result) = self.not_empty.wait_timeout(queue, timeout).unwrap();
            queue = guard;
            if result.timed_out() && queue.is_empty() {
                return None;
            }
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
