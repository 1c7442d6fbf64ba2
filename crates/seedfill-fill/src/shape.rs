//! Integer rasterization of ball and star shapes.

use seedfill_geom::{Coord, Interval, IntervalIter, RaySet, VecN};

use crate::error::ShapeError;

const EDGE_EPS: f64 = 1e-9;
const BARY_EPS: f64 = 1e-9;
const DEGENERATE_EPS: f64 = 1e-12;

/// Every integer position within `radius` of `center`, in box order.
pub struct BallIter<const N: usize> {
    inner: IntervalIter<N>,
    center: VecN<N>,
    r2: f64,
}

impl<const N: usize> Iterator for BallIter<N> {
    type Item = Coord<N>;

    fn next(&mut self) -> Option<Coord<N>> {
        loop {
            let p = self.inner.next()?;
            if (VecN::from_coord(&p) - self.center).length_sq() <= self.r2 {
                return Some(p);
            }
        }
    }
}

/// Closed ball with an exact distance test.
pub fn sample_ball<const N: usize>(center: VecN<N>, radius: f64) -> Result<BallIter<N>, ShapeError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(ShapeError::InvalidShapeParameter(format!("ball radius {radius}")));
    }
    if !center.is_finite() {
        return Err(ShapeError::InvalidShapeParameter(format!("ball center {:?}", center.0)));
    }
    let mut min = [0i64; N];
    let mut max = [0i64; N];
    for d in 0..N {
        min[d] = (center[d] - radius).floor() as i64;
        max[d] = (center[d] + radius).ceil() as i64;
    }
    Ok(BallIter {
        inner: Interval::new(min, max).iter(),
        center,
        r2: radius * radius,
    })
}

/// Integer positions inside the star shape with vertices
/// `center + rays[i] * lengths[i]`.
///
/// 2-D: closed polygon in ray order, boundary included.
/// 3-D: union of the tetrahedra spanned by the center and each hull face of
/// the ray directions.
pub fn sample_star<const N: usize>(
    center: VecN<N>,
    rays: &RaySet<N>,
    lengths: &[f64],
) -> Result<Vec<Coord<N>>, ShapeError> {
    if lengths.len() != rays.len() {
        return Err(ShapeError::InvalidShapeParameter(format!(
            "{} ray lengths for {} rays",
            lengths.len(),
            rays.len()
        )));
    }
    if let Some(l) = lengths.iter().find(|l| !l.is_finite() || **l < 0.0) {
        return Err(ShapeError::InvalidShapeParameter(format!("ray length {l}")));
    }
    if !center.is_finite() {
        return Err(ShapeError::InvalidShapeParameter(format!("star center {:?}", center.0)));
    }
    if lengths.iter().all(|l| *l == 0.0) {
        return Ok(vec![center.round()]);
    }
    let verts: Vec<VecN<N>> = (0..rays.len())
        .map(|i| center + rays.dir(i) * lengths[i])
        .collect();
    let bounds = vertex_bounds(center, &verts);
    match N {
        2 => Ok(bounds
            .iter()
            .filter(|p| in_polygon(VecN::from_coord(p), &verts))
            .collect()),
        3 => {
            if rays.faces().is_empty() {
                return Err(ShapeError::InvalidShapeParameter(
                    "ray set has no hull faces".into(),
                ));
            }
            let tets: Vec<Tetra> = rays
                .faces()
                .iter()
                .filter_map(|f| Tetra::new(to3(center), to3(verts[f[0]]), to3(verts[f[1]]), to3(verts[f[2]])))
                .collect();
            Ok(bounds
                .iter()
                .filter(|p| {
                    let q = to3(VecN::from_coord(p));
                    tets.iter().any(|t| t.contains(q))
                })
                .collect())
        }
        _ => Err(ShapeError::InvalidShapeParameter(format!(
            "star shapes need 2 or 3 dimensions, got {N}"
        ))),
    }
}

fn vertex_bounds<const N: usize>(center: VecN<N>, verts: &[VecN<N>]) -> Interval<N> {
    let mut lo = center;
    let mut hi = center;
    for v in verts {
        for d in 0..N {
            lo[d] = lo[d].min(v[d]);
            hi[d] = hi[d].max(v[d]);
        }
    }
    let mut min = [0i64; N];
    let mut max = [0i64; N];
    for d in 0..N {
        min[d] = lo[d].floor() as i64;
        max[d] = hi[d].ceil() as i64;
    }
    Interval::new(min, max)
}

fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let cross = ab[0] * ap[1] - ab[1] * ap[0];
    let len = (ab[0] * ab[0] + ab[1] * ab[1]).sqrt();
    if cross.abs() > EDGE_EPS * len.max(1.0) {
        return false;
    }
    p[0] >= a[0].min(b[0]) - EDGE_EPS
        && p[0] <= a[0].max(b[0]) + EDGE_EPS
        && p[1] >= a[1].min(b[1]) - EDGE_EPS
        && p[1] <= a[1].max(b[1]) + EDGE_EPS
}

// even-odd crossing number, boundary counts as inside
fn in_polygon<const N: usize>(p: VecN<N>, verts: &[VecN<N>]) -> bool {
    let (x, y) = (p[0], p[1]);
    let n = verts.len();
    let mut inside = false;
    for i in 0..n {
        let a = [verts[i][0], verts[i][1]];
        let b = [verts[(i + 1) % n][0], verts[(i + 1) % n][1]];
        if on_segment([x, y], a, b) {
            return true;
        }
        if (a[1] > y) != (b[1] > y) {
            let x_cross = a[0] + (y - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
            if x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn to3<const N: usize>(v: VecN<N>) -> [f64; 3] {
    [v[0], v[1], v[2]]
}

fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn triple(u: [f64; 3], v: [f64; 3], w: [f64; 3]) -> f64 {
    let c = seedfill_geom::cross3(v, w);
    u[0] * c[0] + u[1] * c[1] + u[2] * c[2]
}

struct Tetra {
    origin: [f64; 3],
    e: [[f64; 3]; 3],
    det: f64,
}

impl Tetra {
    fn new(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> Option<Self> {
        let e = [sub3(b, a), sub3(c, a), sub3(d, a)];
        let det = triple(e[0], e[1], e[2]);
        (det.abs() > DEGENERATE_EPS).then_some(Tetra { origin: a, e, det })
    }

    fn contains(&self, p: [f64; 3]) -> bool {
        let q = sub3(p, self.origin);
        let l1 = triple(q, self.e[1], self.e[2]) / self.det;
        let l2 = triple(self.e[0], q, self.e[2]) / self.det;
        let l3 = triple(self.e[0], self.e[1], q) / self.det;
        l1 >= -BARY_EPS && l2 >= -BARY_EPS && l3 >= -BARY_EPS && l1 + l2 + l3 <= 1.0 + BARY_EPS
    }
}

/// One position visited by a [`RayWalk`]. The center is reported once with
/// `dist == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaySample<const N: usize> {
    pub ray: usize,
    pub dist: u32,
    pub coord: Coord<N>,
}

/// Sample order of a star around an integer center: the center, then for
/// each ray `round(center + dir * d)` for `d = 1, 2, ..` while
/// `d < min(max_dist, length)`.
pub struct RayWalk<'a, const N: usize> {
    center: Coord<N>,
    origin: VecN<N>,
    rays: &'a RaySet<N>,
    lengths: &'a [f64],
    max_dist: f64,
    ray: usize,
    dist: u32,
    started: bool,
}

impl<'a, const N: usize> RayWalk<'a, N> {
    pub fn new(
        center: Coord<N>,
        rays: &'a RaySet<N>,
        lengths: &'a [f64],
        max_dist: f64,
    ) -> Result<Self, ShapeError> {
        if lengths.len() != rays.len() {
            return Err(ShapeError::InvalidShapeParameter(format!(
                "{} ray lengths for {} rays",
                lengths.len(),
                rays.len()
            )));
        }
        Ok(Self {
            center,
            origin: VecN::from_coord(&center),
            rays,
            lengths,
            max_dist,
            ray: 0,
            dist: 0,
            started: false,
        })
    }

    fn limit(&self, ray: usize) -> f64 {
        self.max_dist.min(self.lengths[ray])
    }
}

impl<const N: usize> Iterator for RayWalk<'_, N> {
    type Item = RaySample<N>;

    fn next(&mut self) -> Option<RaySample<N>> {
        if !self.started {
            self.started = true;
            return Some(RaySample {
                ray: 0,
                dist: 0,
                coord: self.center,
            });
        }
        while self.ray < self.rays.len() {
            let d = self.dist + 1;
            if f64::from(d) < self.limit(self.ray) {
                self.dist = d;
                let p = self.origin + self.rays.dir(self.ray) * f64::from(d);
                return Some(RaySample {
                    ray: self.ray,
                    dist: d,
                    coord: p.round(),
                });
            }
            self.ray += 1;
            self.dist = 0;
        }
        None
    }
}
