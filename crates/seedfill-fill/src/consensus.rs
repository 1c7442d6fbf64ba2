//! Admission scores: ball overlap and per-ray star consensus.

use seedfill_geom::{Coord, VecN, coord_distance};
use seedfill_volume::CountField;
use serde::Deserialize;

use crate::error::FillResult;
use crate::shape::sample_ball;

/// Floor for a single ray score, so one noisy ray cannot zero a whole
/// geometric mean.
pub const RAY_EPSILON: f64 = 0.01;

/// Consensus value of a candidate, or `Undefined` when nothing was sampled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    Defined(f64),
    Undefined,
}

impl Score {
    /// Strictly above `threshold`. `Undefined` never passes.
    #[inline]
    pub fn passes(self, threshold: f64) -> bool {
        match self {
            Score::Defined(v) => v > threshold,
            Score::Undefined => false,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Score::Defined(v) => Some(v),
            Score::Undefined => None,
        }
    }
}

/// Fraction of the ball around `center` whose counts are already positive.
pub fn ball_overlap<const N: usize, C>(counts: &C, center: &Coord<N>, radius: f64) -> FillResult<Score>
where
    C: CountField<N> + ?Sized,
{
    let (mut hit, mut total) = (0u64, 0u64);
    for p in sample_ball(VecN::from_coord(center), radius)? {
        if counts.count(&p)? > 0 {
            hit += 1;
        }
        total += 1;
    }
    Ok(if total == 0 {
        Score::Undefined
    } else {
        Score::Defined(hit as f64 / total as f64)
    })
}

/// Per-ray comparison formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayScore {
    /// `1 - |ref - other| / ref`
    #[default]
    RelativeDeviation,
    /// `min(ref - sep, other) / max(ref - sep, other)`
    IntersectionOverUnion,
}

/// Parameters shared by every ray comparison of one fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayConsensusParams {
    pub max_dist: f64,
    pub tolerance: f64,
    pub score: RayScore,
}

/// Agreement along one ray between the prediction at `reference` and the
/// prediction at `other`, in `[RAY_EPSILON, 1]`.
pub fn ray_consensus<const N: usize>(
    reference: &Coord<N>,
    ref_len: f64,
    other: &Coord<N>,
    other_len: f64,
    params: &RayConsensusParams,
) -> f64 {
    let sep = coord_distance(reference, other);
    if sep > params.max_dist {
        return RAY_EPSILON;
    }
    let ref_dist = params.max_dist.min(ref_len);
    let other_dist = (params.max_dist - sep).min(other_len);
    match params.score {
        RayScore::RelativeDeviation => {
            if ref_dist <= 0.0 {
                return RAY_EPSILON;
            }
            let diff = (ref_dist - other_dist).abs();
            if diff < params.tolerance {
                1.0
            } else {
                RAY_EPSILON.max(1.0 - diff / ref_dist)
            }
        }
        RayScore::IntersectionOverUnion => {
            let reach = ref_dist - sep;
            let union = reach.max(other_dist);
            if union <= 0.0 {
                return RAY_EPSILON;
            }
            RAY_EPSILON.max(reach.min(other_dist) / union)
        }
    }
}

/// Running geometric mean of ray scores.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeometricMean {
    log_sum: f64,
    n: u32,
}

impl GeometricMean {
    #[inline]
    pub fn push(&mut self, v: f64) {
        self.log_sum += v.ln();
        self.n += 1;
    }

    pub fn len(&self) -> u32 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn score(&self) -> Score {
        if self.n == 0 {
            Score::Undefined
        } else {
            Score::Defined((self.log_sum / f64::from(self.n)).exp())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfill_geom::Interval;
    use seedfill_volume::AtomicCounts;

    fn params(tolerance: f64) -> RayConsensusParams {
        RayConsensusParams {
            max_dist: 20.0,
            tolerance,
            score: RayScore::RelativeDeviation,
        }
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!Score::Defined(0.5).passes(0.5));
        assert!(Score::Defined(0.5000001).passes(0.5));
        assert!(!Score::Undefined.passes(-1.0));
    }

    #[test]
    fn overlap_ratio() {
        let counts = AtomicCounts::new(Interval::from_dims([5, 5]));
        counts.increment(&[2, 2]).unwrap();
        counts.increment(&[1, 2]).unwrap();
        let s = ball_overlap(&counts, &[2, 2], 1.0).unwrap();
        assert_eq!(s, Score::Defined(2.0 / 5.0));
        // out-of-bounds voxels still count as sampled
        let s = ball_overlap(&counts, &[0, 0], 1.0).unwrap();
        assert_eq!(s, Score::Defined(0.0));
    }

    #[test]
    fn overlap_rejects_negative_radius() {
        let counts = AtomicCounts::new(Interval::from_dims([3, 3]));
        assert!(ball_overlap(&counts, &[1, 1], -1.0).is_err());
    }

    #[test]
    fn relative_deviation() {
        let p = params(0.0);
        assert_eq!(ray_consensus(&[0, 0], 10.0, &[3, 0], 10.0, &p), 1.0);
        assert!((ray_consensus(&[0, 0], 10.0, &[3, 0], 7.0, &p) - 0.7).abs() < 1e-12);
        assert_eq!(ray_consensus(&[0, 0], 10.0, &[3, 0], 0.0, &p), RAY_EPSILON);
        assert_eq!(ray_consensus(&[0, 0], 0.0, &[1, 0], 5.0, &p), RAY_EPSILON);
        assert_eq!(ray_consensus(&[0, 0], 10.0, &[21, 0], 10.0, &p), RAY_EPSILON);
    }

    #[test]
    fn tolerance_dead_band() {
        let p = params(1.0);
        assert_eq!(ray_consensus(&[0, 0], 10.0, &[2, 0], 9.5, &p), 1.0);
        assert!((ray_consensus(&[0, 0], 10.0, &[2, 0], 9.0, &p) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn intersection_over_union() {
        let p = RayConsensusParams {
            score: RayScore::IntersectionOverUnion,
            ..params(0.0)
        };
        // reach = 10 - 4 = 6, other = 6
        assert_eq!(ray_consensus(&[0, 0], 10.0, &[4, 0], 6.0, &p), 1.0);
        assert!((ray_consensus(&[0, 0], 10.0, &[4, 0], 3.0, &p) - 0.5).abs() < 1e-12);
        assert_eq!(ray_consensus(&[0, 0], 2.0, &[4, 0], 3.0, &p), RAY_EPSILON);
    }

    #[test]
    fn geometric_mean() {
        let mut g = GeometricMean::default();
        assert_eq!(g.score(), Score::Undefined);
        g.push(0.25);
        g.push(1.0);
        let v = g.score().value().unwrap();
        assert!((v - 0.5).abs() < 1e-12);
    }
}
