use crate::{VecN, cross3};

const HULL_EPS: f64 = 1e-9;

/// Fixed ray directions shared by a whole volume.
///
/// In 3-D the rays also carry a triangulation of the direction sphere
/// (`faces`), the convex hull of the normalized directions, which turns a
/// vector of ray lengths into a closed star-shaped polyhedron.
#[derive(Clone, Debug, PartialEq)]
pub struct RaySet<const N: usize> {
    dirs: Vec<VecN<N>>,
    faces: Vec<[usize; 3]>,
}

impl<const N: usize> RaySet<N> {
    pub fn new(dirs: Vec<VecN<N>>) -> Self {
        let faces = if N == 3 { hull_faces(&dirs) } else { Vec::new() };
        Self { dirs, faces }
    }

    /// `+e_0, …, +e_{N-1}, -e_0, …, -e_{N-1}`; in 2-D this walks the polygon
    /// counter-clockwise.
    pub fn axes() -> Self {
        let mut dirs = Vec::with_capacity(2 * N);
        for sign in [1.0, -1.0] {
            for d in 0..N {
                let mut v = VecN::<N>::ZERO;
                v[d] = sign;
                dirs.push(v);
            }
        }
        Self::new(dirs)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    #[inline]
    pub fn dir(&self, i: usize) -> VecN<N> {
        self.dirs[i]
    }

    pub fn dirs(&self) -> &[VecN<N>] {
        &self.dirs
    }

    /// Hull triangles over ray indices (3-D only; empty otherwise).
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }
}

impl RaySet<2> {
    /// `k` unit rays at angles `2πi/k`.
    pub fn equiangular(k: usize) -> Self {
        let dirs = (0..k)
            .map(|i| {
                let phi = std::f64::consts::TAU / k as f64 * i as f64;
                VecN::new([phi.cos(), phi.sin()])
            })
            .collect();
        Self::new(dirs)
    }
}

impl RaySet<3> {
    /// `k` near-uniform unit rays on a Fibonacci lattice.
    pub fn fibonacci(k: usize) -> Self {
        let golden = std::f64::consts::PI * (3.0 - 5.0f64.sqrt());
        let dirs = (0..k)
            .map(|i| {
                let z = 1.0 - 2.0 * (i as f64 + 0.5) / k as f64;
                let r = (1.0 - z * z).max(0.0).sqrt();
                let phi = golden * i as f64;
                VecN::new([r * phi.cos(), r * phi.sin(), z])
            })
            .collect();
        Self::new(dirs)
    }
}

fn to3<const N: usize>(v: VecN<N>) -> [f64; 3] {
    [v[0], v[1], v[2]]
}

// Brute-force hull over normalized directions: a triple is a face when every
// other direction lies on one side of its plane. Faces are oriented outward.
fn hull_faces<const N: usize>(dirs: &[VecN<N>]) -> Vec<[usize; 3]> {
    let pts: Vec<[f64; 3]> = dirs.iter().map(|v| to3(v.normalized())).collect();
    let k = pts.len();
    let mut faces = Vec::new();
    for i in 0..k {
        for j in (i + 1)..k {
            for l in (j + 1)..k {
                let (a, b, c) = (pts[i], pts[j], pts[l]);
                let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
                let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
                let n = cross3(ab, ac);
                let nl = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
                if nl < HULL_EPS {
                    continue;
                }
                let off = n[0] * a[0] + n[1] * a[1] + n[2] * a[2];
                let (mut above, mut below) = (false, false);
                for (m, p) in pts.iter().enumerate() {
                    if m == i || m == j || m == l {
                        continue;
                    }
                    let s = (n[0] * p[0] + n[1] * p[1] + n[2] * p[2] - off) / nl;
                    if s > HULL_EPS {
                        above = true;
                    } else if s < -HULL_EPS {
                        below = true;
                    }
                    if above && below {
                        break;
                    }
                }
                match (above, below) {
                    (false, _) => faces.push([i, j, l]),
                    (true, false) => faces.push([i, l, j]),
                    _ => {}
                }
            }
        }
    }
    faces
}
