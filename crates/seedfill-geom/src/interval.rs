use crate::Coord;

/// Inclusive integer box `[min, max]` per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Interval<const N: usize> {
    pub min: Coord<N>,
    pub max: Coord<N>,
}

impl<const N: usize> Interval<N> {
    #[inline]
    pub const fn new(min: Coord<N>, max: Coord<N>) -> Self {
        Self { min, max }
    }

    /// Box anchored at the origin with the given extent per axis.
    pub fn from_dims(dims: [usize; N]) -> Self {
        let min = [0i64; N];
        let mut max = [0i64; N];
        for d in 0..N {
            max[d] = dims[d] as i64 - 1;
        }
        Self { min, max }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..N).any(|d| self.max[d] < self.min[d])
    }

    #[inline]
    pub fn dim(&self, d: usize) -> usize {
        if self.max[d] < self.min[d] {
            0
        } else {
            (self.max[d] - self.min[d] + 1) as usize
        }
    }

    pub fn dims(&self) -> [usize; N] {
        let mut out = [0usize; N];
        for d in 0..N {
            out[d] = self.dim(d);
        }
        out
    }

    /// Number of voxels covered.
    pub fn size(&self) -> usize {
        (0..N).map(|d| self.dim(d)).product()
    }

    #[inline]
    pub fn contains(&self, p: &Coord<N>) -> bool {
        (0..N).all(|d| p[d] >= self.min[d] && p[d] <= self.max[d])
    }

    pub fn intersect(&self, other: &Interval<N>) -> Interval<N> {
        let mut min = self.min;
        let mut max = self.max;
        for d in 0..N {
            min[d] = min[d].max(other.min[d]);
            max[d] = max[d].min(other.max[d]);
        }
        Interval { min, max }
    }

    /// Iterates all positions, first axis fastest.
    pub fn iter(&self) -> IntervalIter<N> {
        IntervalIter {
            bounds: *self,
            next: if self.is_empty() { None } else { Some(self.min) },
        }
    }
}

impl<const N: usize> IntoIterator for Interval<N> {
    type Item = Coord<N>;
    type IntoIter = IntervalIter<N>;
    fn into_iter(self) -> IntervalIter<N> {
        self.iter()
    }
}

pub struct IntervalIter<const N: usize> {
    bounds: Interval<N>,
    next: Option<Coord<N>>,
}

impl<const N: usize> Iterator for IntervalIter<N> {
    type Item = Coord<N>;

    fn next(&mut self) -> Option<Coord<N>> {
        let cur = self.next?;
        let mut p = cur;
        let mut d = 0;
        loop {
            if d == N {
                self.next = None;
                break;
            }
            if p[d] < self.bounds.max[d] {
                p[d] += 1;
                self.next = Some(p);
                break;
            }
            p[d] = self.bounds.min[d];
            d += 1;
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_covers_box_first_axis_fastest() {
        let b = Interval::new([1, -1], [2, 0]);
        let all: Vec<_> = b.iter().collect();
        assert_eq!(all, vec![[1, -1], [2, -1], [1, 0], [2, 0]]);
        assert_eq!(b.size(), 4);
    }

    #[test]
    fn empty_box_yields_nothing() {
        let b = Interval::new([0, 0, 0], [3, -1, 3]);
        assert!(b.is_empty());
        assert_eq!(b.size(), 0);
        assert_eq!(b.iter().count(), 0);
    }
}
