//! Zero-copy buffer pool for recycling `BytesMut` allocations.
//!
//! The server's connection handling frequently allocates and frees buffers for
//! reading and writing wire protocol frames. This pool recycles `BytesMut`
//! instances to reduce allocator pressure and improve throughput.
//!
//! Backed by `crossbeam_queue::ArrayQueue` for lock-free, bounded pooling.
//! When the pool is empty, `get()` allocates a fresh buffer. When the pool
//! is full, `put()` drops the buffer instead of returning it.

use bytes::BytesMut;
use crossbeam_queue::ArrayQueue;

/// A lock-free pool of `BytesMut` buffers for reuse across connections.
///
/// # Design
///
/// - `get()` pops a recycled buffer or allocates a new one with `default_capacity`.
/// - `put()` clears the buffer and returns it to the pool (or drops it if full).
/// - The pool is bounded to prevent unbounded memory growth after traffic spikes.
///
/// # Sizing
///
/// Choose `pool_size` based on the expected number of concurrent connections.
/// Choose `default_capacity` based on the typical wire frame size (e.g., 8 KiB).
pub struct BytesMutPool {
    pool: ArrayQueue<BytesMut>,
    default_capacity: usize,
}

impl BytesMutPool {
    /// Creates a new buffer pool.
    ///
    /// # Arguments
    ///
    /// * `pool_size` - Maximum number of buffers to keep in the pool.
    /// * `default_capacity` - Initial capacity for newly allocated buffers.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is 0 or `default_capacity` is 0.
    pub fn new(pool_size: usize, default_capacity: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be positive");
        assert!(default_capacity > 0, "default_capacity must be positive");
        Self {
            pool: ArrayQueue::new(pool_size),
            default_capacity,
        }
    }

    /// Retrieves a buffer from the pool, or allocates a new one if empty.
    ///
    /// Recycled buffers are cleared (length == 0) but retain their allocated
    /// capacity, avoiding reallocation for typical frame sizes.
    pub fn get(&self) -> BytesMut {
        self.pool
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.default_capacity))
    }

    /// Returns a buffer to the pool for reuse.
    ///
    /// The buffer is cleared before being placed back. If the pool is already
    /// full, the buffer is silently dropped.
    pub fn put(&self, mut buf: BytesMut) {
        buf.clear();
        // If the pool is full, the buffer is dropped. This is intentional:
        // after a traffic spike, we shed excess buffers rather than growing
        // memory indefinitely.
        let _ = self.pool.push(buf);
    }

    /// Returns the number of buffers currently available in the pool.
    pub fn available(&self) -> usize {
        self.pool.len()
    }
}
