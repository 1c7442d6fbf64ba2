use seedfill_geom::{Coord, Interval};

use crate::layout::GridLayout;
use crate::{RayField, StorageError, StorageResult, VoxelField};

/// In-memory scalar volume with a constant border value.
#[derive(Clone, Debug)]
pub struct DenseGrid<T, const N: usize> {
    layout: GridLayout<N>,
    data: Vec<T>,
    border: T,
}

impl<T: Copy, const N: usize> DenseGrid<T, N> {
    pub fn new(bounds: Interval<N>, fill: T, border: T) -> Self {
        let layout = GridLayout::new(bounds);
        Self {
            data: vec![fill; layout.len()],
            layout,
            border,
        }
    }

    pub fn from_vec(bounds: Interval<N>, data: Vec<T>, border: T) -> StorageResult<Self> {
        let layout = GridLayout::new(bounds);
        if data.len() != layout.len() {
            return Err(StorageError::ShapeMismatch {
                expected: layout.len(),
                found: data.len(),
            });
        }
        Ok(Self {
            layout,
            data,
            border,
        })
    }

    pub fn from_fn(bounds: Interval<N>, border: T, f: impl Fn(&Coord<N>) -> T) -> Self {
        let layout = GridLayout::new(bounds);
        let data = bounds.iter().map(|p| f(&p)).collect();
        Self {
            layout,
            data,
            border,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }

    /// Value at `p`, or the border value outside the bounds.
    #[inline]
    pub fn at(&self, p: &Coord<N>) -> T {
        match self.layout.index(p) {
            Some(i) => self.data[i],
            None => self.border,
        }
    }

    pub fn set(&mut self, p: &Coord<N>, v: T) -> StorageResult<()> {
        let i = self
            .layout
            .index(p)
            .ok_or_else(|| StorageError::out_of_bounds(p))?;
        self.data[i] = v;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn border(&self) -> T {
        self.border
    }
}

impl<T: Copy + Send + Sync, const N: usize> VoxelField<T, N> for DenseGrid<T, N> {
    fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }

    fn get(&self, p: &Coord<N>) -> StorageResult<T> {
        Ok(self.at(p))
    }
}

/// In-memory ray-length volume: `k` lengths per voxel, zero outside.
#[derive(Clone, Debug)]
pub struct RayGrid<const N: usize> {
    layout: GridLayout<N>,
    k: usize,
    data: Vec<f32>,
}

impl<const N: usize> RayGrid<N> {
    pub fn new(bounds: Interval<N>, k: usize) -> Self {
        let layout = GridLayout::new(bounds);
        Self {
            data: vec![0.0; layout.len() * k],
            layout,
            k,
        }
    }

    pub fn from_fn(bounds: Interval<N>, k: usize, f: impl Fn(&Coord<N>, &mut [f32])) -> Self {
        let mut grid = Self::new(bounds, k);
        for (i, p) in bounds.iter().enumerate() {
            f(&p, &mut grid.data[i * k..(i + 1) * k]);
        }
        grid
    }

    /// Same lengths at every voxel.
    pub fn uniform(bounds: Interval<N>, lengths: &[f32]) -> Self {
        Self::from_fn(bounds, lengths.len(), |_, out| out.copy_from_slice(lengths))
    }

    pub fn set_lengths(&mut self, p: &Coord<N>, lengths: &[f32]) -> StorageResult<()> {
        if lengths.len() != self.k {
            return Err(StorageError::ShapeMismatch {
                expected: self.k,
                found: lengths.len(),
            });
        }
        let i = self
            .layout
            .index(p)
            .ok_or_else(|| StorageError::out_of_bounds(p))?;
        self.data[i * self.k..(i + 1) * self.k].copy_from_slice(lengths);
        Ok(())
    }
}

impl<const N: usize> RayField<N> for RayGrid<N> {
    fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }

    fn ray_count(&self) -> usize {
        self.k
    }

    fn read_lengths(&self, p: &Coord<N>, out: &mut [f32]) -> StorageResult<()> {
        if out.len() != self.k {
            return Err(StorageError::ShapeMismatch {
                expected: self.k,
                found: out.len(),
            });
        }
        match self.layout.index(p) {
            Some(i) => out.copy_from_slice(&self.data[i * self.k..(i + 1) * self.k]),
            None => out.fill(0.0),
        }
        Ok(())
    }
}

fn read_pair<const N: usize, R: RayField<N> + ?Sized>(
    field: &R,
    a: &Coord<N>,
    b: &Coord<N>,
) -> StorageResult<(Vec<f32>, Vec<f32>)> {
    let k = field.ray_count();
    let mut la = vec![0.0; k];
    let mut lb = vec![0.0; k];
    field.read_lengths(a, &mut la)?;
    field.read_lengths(b, &mut lb)?;
    Ok((la, lb))
}

/// Sum of absolute per-ray length differences between two voxels.
pub fn ray_absolute_diff<const N: usize, R: RayField<N> + ?Sized>(
    field: &R,
    a: &Coord<N>,
    b: &Coord<N>,
) -> StorageResult<f64> {
    let (la, lb) = read_pair(field, a, b)?;
    Ok(la
        .iter()
        .zip(&lb)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
        .sum())
}

pub fn ray_avg_absolute_diff<const N: usize, R: RayField<N> + ?Sized>(
    field: &R,
    a: &Coord<N>,
    b: &Coord<N>,
) -> StorageResult<f64> {
    let k = field.ray_count();
    if k == 0 {
        return Ok(0.0);
    }
    Ok(ray_absolute_diff(field, a, b)? / k as f64)
}

pub fn ray_square_diff<const N: usize, R: RayField<N> + ?Sized>(
    field: &R,
    a: &Coord<N>,
    b: &Coord<N>,
) -> StorageResult<f64> {
    let (la, lb) = read_pair(field, a, b)?;
    Ok(la
        .iter()
        .zip(&lb)
        .map(|(x, y)| {
            let diff = f64::from(*x) - f64::from(*y);
            diff * diff
        })
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_grid_border_and_set() {
        let mut g = DenseGrid::new(Interval::from_dims([3, 2]), 0u8, 7u8);
        assert_eq!(g.at(&[-1, 0]), 7);
        g.set(&[2, 1], 5).unwrap();
        assert_eq!(g.get(&[2, 1]).unwrap(), 5);
        assert!(matches!(g.set(&[3, 0], 1), Err(StorageError::OutOfBounds { .. })));
    }

    #[test]
    fn from_vec_checks_length() {
        let err = DenseGrid::from_vec(Interval::from_dims([2, 2]), vec![0.0f32; 3], 0.0).unwrap_err();
        assert!(matches!(err, StorageError::ShapeMismatch { expected: 4, found: 3 }));
    }

    #[test]
    fn ray_grid_reads_zero_outside() {
        let g = RayGrid::uniform(Interval::from_dims([4, 4]), &[1.0, 2.0, 3.0]);
        let mut out = [9.0f32; 3];
        g.read_lengths(&[1, 1], &mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);
        g.read_lengths(&[4, 1], &mut out).unwrap();
        assert_eq!(out, [0.0; 3]);
        let mut short = [0.0f32; 2];
        assert!(g.read_lengths(&[0, 0], &mut short).is_err());
    }

    #[test]
    fn ray_diffs() {
        let mut g = RayGrid::new(Interval::from_dims([2, 1]), 2);
        g.set_lengths(&[0, 0], &[1.0, 4.0]).unwrap();
        g.set_lengths(&[1, 0], &[3.0, 1.0]).unwrap();
        assert_eq!(ray_absolute_diff(&g, &[0, 0], &[1, 0]).unwrap(), 5.0);
        assert_eq!(ray_avg_absolute_diff(&g, &[0, 0], &[1, 0]).unwrap(), 2.5);
        assert_eq!(ray_square_diff(&g, &[0, 0], &[1, 0]).unwrap(), 13.0);
    }
}
