//! Flat FIFO of coordinates with in-place compaction.

use seedfill_geom::Coord;

/// Pending coordinates stored as `N` consecutive `i64` per entry.
///
/// Popping only advances a cursor; once the cursor has moved past
/// `cleanup_threshold` components the processed prefix is dropped.
#[derive(Debug)]
pub struct Worklist<const N: usize> {
    coords: Vec<i64>,
    head: usize,
    cleanup_threshold: usize,
    peak: usize,
}

impl<const N: usize> Worklist<N> {
    /// `cleanup_entries` is counted in coordinates, not components.
    pub fn new(cleanup_entries: usize) -> Self {
        Self::with_buffer(Vec::new(), cleanup_entries)
    }

    /// Reuses `buf`'s allocation; its contents are discarded.
    pub fn with_buffer(mut buf: Vec<i64>, cleanup_entries: usize) -> Self {
        buf.clear();
        Self {
            coords: buf,
            head: 0,
            cleanup_threshold: cleanup_entries.max(1) * N,
            peak: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, p: &Coord<N>) {
        self.coords.extend_from_slice(p);
        self.peak = self.peak.max(self.len());
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Coord<N>> {
        if self.head >= self.coords.len() {
            return None;
        }
        let mut p = [0i64; N];
        p.copy_from_slice(&self.coords[self.head..self.head + N]);
        self.head += N;
        Some(p)
    }

    /// Pending entries.
    #[inline]
    pub fn len(&self) -> usize {
        (self.coords.len() - self.head) / N.max(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head >= self.coords.len()
    }

    #[inline]
    pub fn should_compact(&self) -> bool {
        self.head > self.cleanup_threshold
    }

    /// Drops the processed prefix. Pending order is kept.
    pub fn compact(&mut self) {
        self.coords.drain(..self.head);
        self.head = 0;
    }

    pub fn clear(&mut self) {
        self.coords.clear();
        self.head = 0;
        self.peak = 0;
    }

    /// Largest pending length seen since the last clear.
    pub fn peak_len(&self) -> usize {
        self.peak
    }

    /// Backing components, processed prefix included.
    pub fn stored_components(&self) -> usize {
        self.coords.len()
    }

    pub fn into_buffer(self) -> Vec<i64> {
        self.coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_keeps_fifo_order() {
        let mut w = Worklist::<2>::new(3);
        for i in 0..10 {
            w.push(&[i, -i]);
        }
        let mut out = Vec::new();
        let mut compactions = 0;
        while let Some(p) = w.pop() {
            out.push(p[0]);
            if p[0] == 4 {
                w.push(&[10, -10]);
            }
            if w.should_compact() {
                w.compact();
                compactions += 1;
            }
        }
        assert_eq!(out, (0..=10).collect::<Vec<_>>());
        assert!(compactions >= 2);
        assert!(w.is_empty());
    }

    #[test]
    fn compaction_bounds_storage() {
        let mut w = Worklist::<3>::new(4);
        w.push(&[0, 0, 0]);
        let mut i = 0;
        while let Some(p) = w.pop() {
            if p[0] < 100 {
                w.push(&[p[0] + 1, 0, 0]);
            }
            if w.should_compact() {
                w.compact();
            }
            assert!(w.stored_components() <= 6 * 3);
            i += 1;
        }
        assert_eq!(i, 101);
        assert_eq!(w.peak_len(), 1);
    }

    #[test]
    fn buffer_is_reused_empty() {
        let buf = vec![1, 2, 3, 4];
        let cap = buf.capacity();
        let w = Worklist::<2>::with_buffer(buf, 8);
        assert!(w.is_empty());
        assert_eq!(w.into_buffer().capacity(), cap);
    }
}
