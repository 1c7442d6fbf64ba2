use std::sync::atomic::{AtomicU8, Ordering};

use seedfill_geom::{Coord, Interval};

use crate::layout::GridLayout;
use crate::{StateField, StorageResult};

/// Per-voxel fill flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoxelFlags(u8);

impl VoxelFlags {
    pub const NONE: VoxelFlags = VoxelFlags(0);
    pub const VISITED: VoxelFlags = VoxelFlags(1);
    pub const ENQUEUED: VoxelFlags = VoxelFlags(2);
    /// What every position outside the volume reports.
    pub const BORDER: VoxelFlags = VoxelFlags(3);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        VoxelFlags(bits & 3)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn visited(self) -> bool {
        self.0 & Self::VISITED.0 != 0
    }

    #[inline]
    pub const fn enqueued(self) -> bool {
        self.0 & Self::ENQUEUED.0 != 0
    }

    #[inline]
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }
}

/// Visited/enqueued flags, one byte per voxel.
pub struct AtomicFillState<const N: usize> {
    layout: GridLayout<N>,
    cells: Vec<AtomicU8>,
}

impl<const N: usize> AtomicFillState<N> {
    pub fn new(bounds: Interval<N>) -> Self {
        let layout = GridLayout::new(bounds);
        let cells = (0..layout.len()).map(|_| AtomicU8::new(0)).collect();
        Self { layout, cells }
    }

    #[inline]
    pub fn get(&self, p: &Coord<N>) -> VoxelFlags {
        match self.layout.index(p) {
            Some(i) => VoxelFlags::from_bits(self.cells[i].load(Ordering::Acquire)),
            None => VoxelFlags::BORDER,
        }
    }

    pub fn visited_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) & VoxelFlags::VISITED.bits() != 0)
            .count()
    }
}

impl<const N: usize> StateField<N> for AtomicFillState<N> {
    fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }

    fn flags(&self, p: &Coord<N>) -> StorageResult<VoxelFlags> {
        Ok(self.get(p))
    }

    fn mark_visited(&self, p: &Coord<N>) -> StorageResult<VoxelFlags> {
        Ok(match self.layout.index(p) {
            Some(i) => VoxelFlags::from_bits(
                self.cells[i].fetch_or(VoxelFlags::VISITED.bits(), Ordering::AcqRel),
            ),
            None => VoxelFlags::BORDER,
        })
    }

    fn try_enqueue(&self, p: &Coord<N>) -> StorageResult<bool> {
        let Some(i) = self.layout.index(p) else {
            return Ok(false);
        };
        let won = self.cells[i]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (bits == 0).then_some(VoxelFlags::ENQUEUED.bits())
            })
            .is_ok();
        Ok(won)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn border_reports_both_flags() {
        let s = AtomicFillState::new(Interval::from_dims([3, 3]));
        let f = s.flags(&[3, 0]).unwrap();
        assert!(f.visited() && f.enqueued());
        assert!(!s.try_enqueue(&[-1, 1]).unwrap());
    }

    #[test]
    fn enqueue_only_once_and_never_after_visit() {
        let s = AtomicFillState::new(Interval::from_dims([3, 3]));
        assert!(s.try_enqueue(&[1, 1]).unwrap());
        assert!(!s.try_enqueue(&[1, 1]).unwrap());
        let prev = s.mark_visited(&[1, 1]).unwrap();
        assert!(prev.enqueued() && !prev.visited());

        s.mark_visited(&[0, 0]).unwrap();
        assert!(!s.try_enqueue(&[0, 0]).unwrap());
        assert_eq!(s.visited_count(), 2);
    }

    #[test]
    fn enqueue_race_has_one_winner() {
        let s = Arc::new(AtomicFillState::new(Interval::from_dims([1])));
        let wins = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (s, wins) = (s.clone(), wins.clone());
                std::thread::spawn(move || {
                    if s.try_enqueue(&[0]).unwrap() {
                        wins.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::Relaxed), 1);
    }
}
