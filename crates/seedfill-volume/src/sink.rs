use std::sync::Mutex;

use hashbrown::HashMap;
use rayon::prelude::*;
use seedfill_geom::{Coord, Interval};

use crate::grid::DenseGrid;
use crate::{CountField, StorageError, StorageResult};

/// Bulk destination for count blocks.
///
/// `data` holds the block's values in layout order (first axis fastest).
pub trait VolumeSink<const N: usize>: Send + Sync {
    fn write_block(&self, block: Interval<N>, data: &[u32]) -> StorageResult<()>;
}

/// Sink that keeps every written block in memory, keyed by block origin.
pub struct MemorySink<const N: usize> {
    blocks: Mutex<HashMap<Coord<N>, (Interval<N>, Vec<u32>)>>,
}

impl<const N: usize> Default for MemorySink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemorySink<N> {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Reassembles the written blocks into one grid over `bounds`.
    pub fn assemble(&self, bounds: Interval<N>) -> StorageResult<DenseGrid<u32, N>> {
        let map = self
            .blocks
            .lock()
            .map_err(|_| StorageError::Backend("memory sink lock poisoned".into()))?;
        let mut grid = DenseGrid::new(bounds, 0u32, 0u32);
        for (block, data) in map.values() {
            for (p, v) in block.iter().zip(data) {
                if bounds.contains(&p) {
                    grid.set(&p, *v)?;
                }
            }
        }
        Ok(grid)
    }
}

impl<const N: usize> VolumeSink<N> for MemorySink<N> {
    fn write_block(&self, block: Interval<N>, data: &[u32]) -> StorageResult<()> {
        if data.len() != block.size() {
            return Err(StorageError::ShapeMismatch {
                expected: block.size(),
                found: data.len(),
            });
        }
        let mut map = self
            .blocks
            .lock()
            .map_err(|_| StorageError::Backend("memory sink lock poisoned".into()))?;
        map.insert(block.min, (block, data.to_vec()));
        Ok(())
    }
}

/// Tiles `bounds` into blocks of at most `block` voxels per axis.
pub fn block_grid<const N: usize>(bounds: Interval<N>, block: [usize; N]) -> Vec<Interval<N>> {
    if bounds.is_empty() {
        return Vec::new();
    }
    let mut counts = [0usize; N];
    let mut step = [0i64; N];
    for d in 0..N {
        let b = block[d].max(1);
        step[d] = b as i64;
        counts[d] = bounds.dim(d).div_ceil(b);
    }
    Interval::from_dims(counts)
        .iter()
        .map(|bi| {
            let mut min = bounds.min;
            let mut max = bounds.min;
            for d in 0..N {
                min[d] += bi[d] * step[d];
                max[d] = (min[d] + step[d] - 1).min(bounds.max[d]);
            }
            Interval::new(min, max)
        })
        .collect()
}

/// Writes the whole count field to `sink`, one block at a time, blocks in
/// parallel. Returns the number of blocks written.
pub fn write_counts<const N: usize, C, S>(counts: &C, sink: &S, block: [usize; N]) -> StorageResult<usize>
where
    C: CountField<N> + ?Sized,
    S: VolumeSink<N> + ?Sized,
{
    let blocks = block_grid(counts.bounds(), block);
    blocks.par_iter().try_for_each(|b| {
        let data = b
            .iter()
            .map(|p| counts.count(&p))
            .collect::<StorageResult<Vec<u32>>>()?;
        sink.write_block(*b, &data)
    })?;
    Ok(blocks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtomicCounts;

    #[test]
    fn blocks_tile_bounds_exactly() {
        let bounds = Interval::new([-2, 0], [4, 2]);
        let blocks = block_grid(bounds, [3, 2]);
        assert_eq!(blocks.len(), 3 * 2);
        let total: usize = blocks.iter().map(|b| b.size()).sum();
        assert_eq!(total, bounds.size());
        assert!(blocks.iter().all(|b| b.intersect(&bounds) == *b));
    }

    #[test]
    fn write_counts_roundtrips_through_memory_sink() {
        let bounds = Interval::from_dims([5, 4, 3]);
        let counts = AtomicCounts::new(bounds);
        for p in bounds.iter() {
            for _ in 0..((p[0] + p[1] * 2 + p[2]) % 4) {
                counts.increment(&p).unwrap();
            }
        }
        let sink = MemorySink::new();
        let n = write_counts(&counts, &sink, [2, 2, 2]).unwrap();
        assert_eq!(n, 3 * 2 * 2);
        assert_eq!(sink.block_count(), n);
        let grid = sink.assemble(bounds).unwrap();
        assert_eq!(grid.as_slice(), counts.snapshot().as_slice());
    }

    #[test]
    fn rejects_wrong_block_length() {
        let sink = MemorySink::<2>::new();
        let err = sink.write_block(Interval::from_dims([2, 2]), &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StorageError::ShapeMismatch { expected: 4, found: 3 }));
    }
}
