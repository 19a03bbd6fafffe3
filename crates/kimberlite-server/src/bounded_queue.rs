//! Bounded queue with backpressure for the VSR event loop.
//!
//! Uses `crossbeam-queue::ArrayQueue` for a lock-free, bounded MPSC queue.
//! When the queue is full, `try_push` returns the item back to the caller
//! to signal backpressure.
//!
//! # Sizing
//!
//! Size the queue using Little's Law: `capacity = throughput * latency`.
//! For example, at 100k ops/sec with 10ms latency: `capacity = 100_000 * 0.01 = 1000`.

use crossbeam_queue::ArrayQueue;

/// Result of attempting to push to a full queue.
#[derive(Debug)]
pub enum PushResult<T> {
    /// Item was successfully enqueued.
    Ok,
    /// Queue is full. Returns the item for the caller to handle.
    Backpressure(T),
}

/// A bounded, lock-free queue with backpressure signaling.
///
/// When the queue is full, producers receive their item back instead of
/// blocking. This enables the server to send `ServerBusy` responses to
/// clients rather than accumulating unbounded memory.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: ArrayQueue<T>,
}

impl<T> BoundedQueue<T> {
    /// Creates a new bounded queue with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Attempts to push an item onto the queue.
    ///
    /// Returns `PushResult::Ok` if successful, or `PushResult::Backpressure(item)`
    /// if the queue is full.
    pub fn try_push(&self, item: T) -> PushResult<T> {
        match self.inner.push(item) {
            Ok(()) => PushResult::Ok,
            Err(item) => PushResult::Backpressure(item),
        }
    }

    /// Attempts to pop an item from the queue.
    ///
    /// Returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.pop()
    }

    /// Pops up to `max` items from the queue into a `Vec`.
    ///
    /// Returns an empty `Vec` if the queue is empty.
    pub fn pop_batch(&self, max: usize) -> Vec<T> {
        let mut batch = Vec::with_capacity(max.min(self.inner.len()));
        for _ in 0..max {
            match self.inner.pop() {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        batch
    }

    /// Returns the number of items currently in the queue.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns true if the queue is full.
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Returns the capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}
