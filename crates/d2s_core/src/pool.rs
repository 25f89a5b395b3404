//! Reusable output buffers for repeated encodes.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

const DEFAULT_MAX_RETAINED: usize = 8;

/// A shared stash of byte buffers. Buffers are lent out as [`PooledBuffer`]
/// guards and come back when the guard is dropped.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
}

impl BufferPool {
    pub fn new(max_retained: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    /// Borrow a cleared buffer with at least `capacity` bytes reserved.
    pub fn acquire(&self, capacity: usize) -> PooledBuffer<'_> {
        let mut buffer = self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        buffer.clear();
        buffer.reserve(capacity);
        PooledBuffer { pool: self, buffer }
    }

    /// Number of idle buffers ready to be lent out.
    pub fn available(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, buffer: Vec<u8>) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < self.max_retained {
            buffers.push(buffer);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETAINED)
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("available", &self.available())
            .field("max_retained", &self.max_retained)
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`]; returned to the pool on drop.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Vec<u8>,
}

impl PooledBuffer<'_> {
    /// Move the allocation out so a writer can fill it; pair with [`Self::restore`].
    pub(crate) fn take(&mut self) -> Vec<u8> {
        mem::take(&mut self.buffer)
    }

    pub(crate) fn restore(&mut self, buffer: Vec<u8>) {
        self.buffer = buffer;
    }

    /// Copy the contents out. The allocation itself still goes back to the pool.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buffer.clone()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

impl AsRef<[u8]> for PooledBuffer<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}

impl fmt::Debug for PooledBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buffer.len())
            .finish()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let buffer = mem::take(&mut self.buffer);
        if buffer.capacity() > 0 {
            self.pool.release(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_return_on_drop() {
        let pool = BufferPool::new(2);
        assert_eq!(pool.available(), 0);
        {
            let mut buf = pool.acquire(32);
            let mut inner = buf.take();
            inner.extend_from_slice(b"hello");
            buf.restore(inner);
            assert_eq!(&*buf, b"hello");
        }
        assert_eq!(pool.available(), 1);

        let buf = pool.acquire(0);
        assert!(buf.is_empty());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn retention_is_capped() {
        let pool = BufferPool::new(1);
        let a = pool.acquire(8);
        let b = pool.acquire(8);
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn pool_is_shareable_across_threads() {
        let pool = BufferPool::default();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let buf = pool.acquire(64);
                    assert!(buf.is_empty());
                });
            }
        });
        assert!(pool.available() >= 1);
    }
}
