use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

/// Lock-free pool of worklist buffers reused across fill jobs.
///
/// Holds at most `max_buffers` idle buffers; extra ones, and buffers that
/// grew past `max_capacity` components, are dropped on release.
pub struct WorklistPool {
    available_tx: Sender<Vec<i64>>,
    available_rx: Receiver<Vec<i64>>,
    allocated: AtomicUsize,
    max_capacity: usize,
}

impl WorklistPool {
    pub fn new(max_buffers: usize, max_capacity: usize) -> Self {
        let (tx, rx) = bounded(max_buffers.max(1));
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_capacity,
        }
    }

    pub fn with_capacity_from_workers(worker_count: usize) -> Arc<Self> {
        Arc::new(Self::new(worker_count.max(1) * 2, 1 << 24))
    }

    /// An empty buffer, recycled when one is idle.
    pub fn acquire(&self) -> Vec<i64> {
        match self.available_rx.try_recv() {
            Ok(buf) => buf,
            Err(_) => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        }
    }

    pub fn release(&self, mut buf: Vec<i64>) {
        if buf.capacity() > self.max_capacity {
            return;
        }
        buf.clear();
        let _ = self.available_tx.try_send(buf);
    }

    /// Buffers created because none was idle.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn idle(&self) -> usize {
        self.available_rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_recycled_and_bounded() {
        let pool = WorklistPool::new(2, 1024);
        let mut a = pool.acquire();
        a.extend_from_slice(&[1, 2, 3]);
        let cap = a.capacity();
        pool.release(a);
        assert_eq!(pool.idle(), 1);

        let b = pool.acquire();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), cap);
        assert_eq!(pool.allocated(), 1);

        pool.release(b);
        pool.release(Vec::new());
        pool.release(Vec::new());
        assert_eq!(pool.idle(), 2);

        pool.release(Vec::with_capacity(4096));
        assert_eq!(pool.idle(), 2);
    }
}
