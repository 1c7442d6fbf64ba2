use seedfill_geom::{Coord, Interval};

/// Linear indexing of an n-dimensional box, first axis fastest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout<const N: usize> {
    bounds: Interval<N>,
    strides: [usize; N],
    len: usize,
}

impl<const N: usize> GridLayout<N> {
    pub fn new(bounds: Interval<N>) -> Self {
        let mut strides = [0usize; N];
        let mut acc = 1usize;
        for d in 0..N {
            strides[d] = acc;
            acc *= bounds.dim(d);
        }
        Self {
            bounds,
            strides,
            len: bounds.size(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Interval<N> {
        self.bounds
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Linear index of `p`, or `None` outside the bounds.
    #[inline]
    pub fn index(&self, p: &Coord<N>) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let mut i = 0usize;
        for d in 0..N {
            i += (p[d] - self.bounds.min[d]) as usize * self.strides[d];
        }
        Some(i)
    }

    /// Inverse of [`GridLayout::index`].
    pub fn coord(&self, mut i: usize) -> Coord<N> {
        let mut p = self.bounds.min;
        for d in (0..N).rev() {
            let s = self.strides[d];
            p[d] += (i / s) as i64;
            i %= s;
        }
        p
    }
}
