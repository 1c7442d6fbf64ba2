//! Ball-overlap admission: a voxel grows the fill when enough of the ball
//! predicted at it is already counted.

use std::sync::Arc;

use seedfill_geom::{Coord, VecN, coord_offset};
use seedfill_volume::{CountField, StateField, VoxelField};

use crate::config::{BallParams, WorklistParams};
use crate::consensus::ball_overlap;
use crate::engine::{AdmissionStrategy, ConsensusFloodFill, FillContext, Verdict};
use crate::error::{FillError, FillResult};
use crate::shape::sample_ball;

pub struct BallStrategy<const N: usize> {
    source: Arc<dyn VoxelField<f32, N>>,
    params: BallParams,
    offsets: Vec<Coord<N>>,
    radius: f64,
}

impl<const N: usize> BallStrategy<N> {
    pub fn new(source: Arc<dyn VoxelField<f32, N>>, params: BallParams) -> FillResult<Self> {
        params.validate()?;
        let offsets = params.connectivity.offsets::<N>();
        Ok(Self {
            source,
            params,
            offsets,
            radius: 0.0,
        })
    }

    pub fn params(&self) -> &BallParams {
        &self.params
    }

    /// Source radius clamped to `max_radius`, then rounded per `radius_mode`.
    fn sampling_radius(&self, r: f64) -> f64 {
        let r = match self.params.max_radius {
            Some(cap) if r > cap => cap,
            _ => r,
        };
        self.params.radius_mode.apply(r)
    }

    fn count_ball(&self, center: &Coord<N>, radius: f64, ctx: &FillContext<'_, N>) -> FillResult<()> {
        for q in sample_ball(VecN::from_coord(center), radius)? {
            ctx.count_up(&q)?;
        }
        Ok(())
    }
}

impl<const N: usize> AdmissionStrategy<N> for BallStrategy<N> {
    fn name(&self) -> &'static str {
        "ball"
    }

    fn seed(&mut self, seed: &Coord<N>, ctx: &mut FillContext<'_, N>) -> FillResult<()> {
        let radius = self.sampling_radius(f64::from(self.source.get(seed)?));
        match self.count_ball(seed, radius, ctx) {
            Ok(()) => {}
            Err(FillError::InvalidShapeParameter(e)) => {
                // the seed itself always counts
                log::trace!(target: "fill", "seed {:?} ball not counted: {}", seed, e);
                ctx.count_up(seed)?;
            }
            Err(e) => return Err(e),
        }
        ctx.state().mark_visited(seed)?;
        ctx.push_seed(seed)?;
        Ok(())
    }

    fn evaluate(&mut self, p: &Coord<N>, ctx: &FillContext<'_, N>) -> FillResult<Verdict> {
        if ctx.counts().count(p)? > self.params.skip_count {
            return Ok(Verdict::PreAdmitted);
        }
        let r = f64::from(self.source.get(p)?);
        if r.is_nan() || r <= 0.0 {
            return Ok(Verdict::Background);
        }
        let radius = self.sampling_radius(r);
        match ball_overlap(ctx.counts(), p, radius) {
            Ok(score) if score.passes(self.params.min_overlap) => {
                self.radius = radius;
                Ok(Verdict::Admitted(score))
            }
            Ok(score) => Ok(Verdict::Rejected(score)),
            Err(FillError::InvalidShapeParameter(e)) => Ok(Verdict::InvalidShape(e)),
            Err(e) => Err(e),
        }
    }

    fn expand(&mut self, p: &Coord<N>, verdict: &Verdict, ctx: &mut FillContext<'_, N>) -> FillResult<()> {
        if let Verdict::Admitted(_) = verdict {
            self.count_ball(p, self.radius, ctx)?;
        }
        for o in &self.offsets {
            ctx.enqueue(&coord_offset(p, o))?;
        }
        Ok(())
    }
}

pub type BallFill<const N: usize> = ConsensusFloodFill<BallStrategy<N>, N>;

/// Ball fill over a radius field.
pub fn ball_fill<const N: usize>(
    source: Arc<dyn VoxelField<f32, N>>,
    counts: Arc<dyn CountField<N>>,
    state: Arc<dyn StateField<N>>,
    params: BallParams,
    worklist: &WorklistParams,
) -> FillResult<BallFill<N>> {
    Ok(ConsensusFloodFill::new(
        BallStrategy::new(source, params)?,
        counts,
        state,
        worklist,
    ))
}
