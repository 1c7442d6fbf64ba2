//! Voxel storage for fills: read-only source fields, shared count fields,
//! per-voxel fill state and bulk export.
#![forbid(unsafe_code)]

use seedfill_geom::{Coord, Interval};

mod counts;
mod error;
mod grid;
mod layout;
mod sink;
mod state;

pub use counts::AtomicCounts;
pub use error::{StorageError, StorageResult};
pub use grid::{DenseGrid, RayGrid, ray_absolute_diff, ray_avg_absolute_diff, ray_square_diff};
pub use layout::GridLayout;
pub use sink::{MemorySink, VolumeSink, block_grid, write_counts};
pub use state::{AtomicFillState, VoxelFlags};

/// Read-only scalar volume. Positions outside `bounds` read the border value.
pub trait VoxelField<T, const N: usize>: Send + Sync {
    fn bounds(&self) -> Interval<N>;
    fn get(&self, p: &Coord<N>) -> StorageResult<T>;
}

/// Read-only volume of `ray_count()` ray lengths per voxel.
pub trait RayField<const N: usize>: Send + Sync {
    fn bounds(&self) -> Interval<N>;
    fn ray_count(&self) -> usize;
    /// Fills `out` (length `ray_count()`) with the lengths at `p`; all zero
    /// outside the bounds.
    fn read_lengths(&self, p: &Coord<N>, out: &mut [f32]) -> StorageResult<()>;
}

/// Monotone per-voxel admission counts shared by concurrent fills.
pub trait CountField<const N: usize>: Send + Sync {
    fn bounds(&self) -> Interval<N>;
    fn count(&self, p: &Coord<N>) -> StorageResult<u32>;
    /// Atomic `+1`; dropped outside the bounds.
    fn increment(&self, p: &Coord<N>) -> StorageResult<()>;
}

/// Visited/enqueued bookkeeping shared by concurrent fills.
pub trait StateField<const N: usize>: Send + Sync {
    fn bounds(&self) -> Interval<N>;
    fn flags(&self, p: &Coord<N>) -> StorageResult<VoxelFlags>;
    /// Sets the visited bit and returns the flags held before.
    fn mark_visited(&self, p: &Coord<N>) -> StorageResult<VoxelFlags>;
    /// Sets the enqueued bit iff neither bit is set. `true` means the caller
    /// owns the push.
    fn try_enqueue(&self, p: &Coord<N>) -> StorageResult<bool>;
}
