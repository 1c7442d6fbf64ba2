//! Minimal n-dimensional geometry for the fill crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Sub, SubAssign};

mod interval;
mod rays;

pub use interval::{Interval, IntervalIter};
pub use rays::RaySet;

/// Integer voxel position; also used as array index.
pub type Coord<const N: usize> = [i64; N];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VecN<const N: usize>(pub [f64; N]);

impl<const N: usize> Default for VecN<N> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const N: usize> VecN<N> {
    pub const ZERO: VecN<N> = VecN([0.0; N]);

    #[inline]
    pub const fn new(v: [f64; N]) -> Self {
        Self(v)
    }

    #[inline]
    pub fn from_coord(c: &Coord<N>) -> Self {
        let mut v = [0.0; N];
        for d in 0..N {
            v[d] = c[d] as f64;
        }
        Self(v)
    }

    /// Nearest integer position (half away from zero).
    #[inline]
    pub fn round(self) -> Coord<N> {
        let mut c = [0i64; N];
        for d in 0..N {
            c[d] = self.0[d].round() as i64;
        }
        c
    }

    #[inline]
    pub fn dot(self, rhs: VecN<N>) -> f64 {
        let mut s = 0.0;
        for d in 0..N {
            s += self.0[d] * rhs.0[d];
        }
        s
    }

    #[inline]
    pub fn length_sq(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn normalized(self) -> VecN<N> {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Euclidean distance between two integer positions.
#[inline]
pub fn coord_distance<const N: usize>(a: &Coord<N>, b: &Coord<N>) -> f64 {
    let mut s = 0.0;
    for d in 0..N {
        let diff = (b[d] - a[d]) as f64;
        s += diff * diff;
    }
    s.sqrt()
}

/// Componentwise `a + b` on integer positions.
#[inline]
pub fn coord_offset<const N: usize>(a: &Coord<N>, b: &Coord<N>) -> Coord<N> {
    let mut c = *a;
    for d in 0..N {
        c[d] += b[d];
    }
    c
}

impl<const N: usize> Index<usize> for VecN<N> {
    type Output = f64;
    #[inline]
    fn index(&self, d: usize) -> &f64 {
        &self.0[d]
    }
}

impl<const N: usize> IndexMut<usize> for VecN<N> {
    #[inline]
    fn index_mut(&mut self, d: usize) -> &mut f64 {
        &mut self.0[d]
    }
}

impl<const N: usize> Add for VecN<N> {
    type Output = VecN<N>;
    #[inline]
    fn add(mut self, rhs: VecN<N>) -> VecN<N> {
        self += rhs;
        self
    }
}

impl<const N: usize> AddAssign for VecN<N> {
    #[inline]
    fn add_assign(&mut self, rhs: VecN<N>) {
        for d in 0..N {
            self.0[d] += rhs.0[d];
        }
    }
}

impl<const N: usize> Sub for VecN<N> {
    type Output = VecN<N>;
    #[inline]
    fn sub(mut self, rhs: VecN<N>) -> VecN<N> {
        self -= rhs;
        self
    }
}

impl<const N: usize> SubAssign for VecN<N> {
    #[inline]
    fn sub_assign(&mut self, rhs: VecN<N>) {
        for d in 0..N {
            self.0[d] -= rhs.0[d];
        }
    }
}

impl<const N: usize> Mul<f64> for VecN<N> {
    type Output = VecN<N>;
    #[inline]
    fn mul(mut self, rhs: f64) -> VecN<N> {
        for d in 0..N {
            self.0[d] *= rhs;
        }
        self
    }
}

impl<const N: usize> Div<f64> for VecN<N> {
    type Output = VecN<N>;
    #[inline]
    fn div(mut self, rhs: f64) -> VecN<N> {
        for d in 0..N {
            self.0[d] /= rhs;
        }
        self
    }
}

impl<const N: usize> From<[f64; N]> for VecN<N> {
    fn from(value: [f64; N]) -> Self {
        Self(value)
    }
}

/// 3-D cross product on the first three components.
#[inline]
pub fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
