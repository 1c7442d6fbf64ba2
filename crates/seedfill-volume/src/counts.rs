use std::sync::atomic::{AtomicU32, Ordering};

use seedfill_geom::{Coord, Interval};

use crate::grid::DenseGrid;
use crate::layout::GridLayout;
use crate::{CountField, StorageResult};

/// In-memory count field with lock-free per-voxel increments.
///
/// Reads outside the bounds return the border value; increments outside the
/// bounds are dropped.
pub struct AtomicCounts<const N: usize> {
    layout: GridLayout<N>,
    cells: Vec<AtomicU32>,
    border: u32,
}

impl<const N: usize> AtomicCounts<N> {
    pub fn new(bounds: Interval<N>) -> Self {
        Self::with_border(bounds, 0)
    }

    pub fn with_border(bounds: Interval<N>, border: u32) -> Self {
        let layout = GridLayout::new(bounds);
        let cells = (0..layout.len()).map(|_| AtomicU32::new(0)).collect();
        Self {
            layout,
            cells,
            border,
        }
    }

    #[inline]
    pub fn get(&self, p: &Coord<N>) -> u32 {
        match self.layout.index(p) {
            Some(i) => self.cells[i].load(Ordering::Relaxed),
            None => self.border,
        }
    }

    /// Copy of all counts in layout order.
    pub fn snapshot(&self) -> Vec<u32> {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    pub fn to_grid(&self) -> DenseGrid<u32, N> {
        DenseGrid::from_fn(self.layout.bounds(), self.border, |p| self.get(p))
    }

    /// Sum over all voxels.
    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .map(|c| u64::from(c.load(Ordering::Relaxed)))
            .sum()
    }

    /// Number of voxels with a positive count.
    pub fn covered(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) > 0)
            .count()
    }
}

impl<const N: usize> CountField<N> for AtomicCounts<N> {
    fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }

    fn count(&self, p: &Coord<N>) -> StorageResult<u32> {
        Ok(self.get(p))
    }

    fn increment(&self, p: &Coord<N>) -> StorageResult<()> {
        if let Some(i) = self.layout.index(p) {
            self.cells[i].fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn border_reads_and_dropped_writes() {
        let c = AtomicCounts::with_border(Interval::from_dims([2, 2]), 9);
        assert_eq!(c.count(&[-1, 0]).unwrap(), 9);
        c.increment(&[5, 5]).unwrap();
        c.increment(&[1, 1]).unwrap();
        c.increment(&[1, 1]).unwrap();
        assert_eq!(c.get(&[1, 1]), 2);
        assert_eq!(c.total(), 2);
        assert_eq!(c.covered(), 1);
        assert_eq!(c.snapshot(), vec![0, 0, 0, 2]);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let c = Arc::new(AtomicCounts::new(Interval::from_dims([4])));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment(&[2]).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(&[2]), 8000);
    }
}
