//! Star-ray consensus admission.

use std::sync::Arc;

use rayon::prelude::*;
use seedfill_geom::{Coord, Interval, RaySet, VecN};
use seedfill_volume::{CountField, RayField, StateField, StorageResult};

use crate::config::{StarParams, WorklistParams};
use crate::consensus::{GeometricMean, RayConsensusParams, ray_consensus};
use crate::engine::{AdmissionStrategy, ConsensusFloodFill, FillContext, Verdict};
use crate::error::{FillError, FillResult};
use crate::shape::{RaySample, RayWalk, sample_star};

pub struct StarStrategy<const N: usize> {
    source: Arc<dyn RayField<N>>,
    rays: Arc<RaySet<N>>,
    params: StarParams,
    ray_params: RayConsensusParams,
    raw: Vec<f32>,
    ref_len: Vec<f64>,
    other: Vec<f32>,
}

impl<const N: usize> StarStrategy<N> {
    pub fn new(source: Arc<dyn RayField<N>>, rays: Arc<RaySet<N>>, params: StarParams) -> FillResult<Self> {
        params.validate()?;
        let k = source.ray_count();
        if k != rays.len() {
            return Err(FillError::InvalidConfig(format!(
                "ray field has {k} rays per voxel, ray set has {}",
                rays.len()
            )));
        }
        Ok(Self {
            ray_params: params.ray_params(),
            source,
            rays,
            params,
            raw: vec![0.0; k],
            ref_len: vec![0.0; k],
            other: vec![0.0; k],
        })
    }

    pub fn params(&self) -> &StarParams {
        &self.params
    }

    fn load_reference(&mut self, p: &Coord<N>) -> StorageResult<()> {
        self.source.read_lengths(p, &mut self.raw)?;
        for (dst, src) in self.ref_len.iter_mut().zip(&self.raw) {
            *dst = f64::from(*src);
        }
        Ok(())
    }

    // Counts `p` and every ray sample within the enqueue radius that agrees
    // with `p`, pushing the ones nobody has claimed yet.
    fn update(&mut self, p: &Coord<N>, ctx: &mut FillContext<'_, N>) -> FillResult<()> {
        ctx.count_up(p)?;
        ctx.state().mark_visited(p)?;
        let walk = RayWalk::new(*p, &self.rays, &self.ref_len, self.params.max_dist)?;
        for s in walk.skip(1) {
            if f64::from(s.dist) >= self.params.max_enqueue_radius {
                continue;
            }
            let score = sample_score(
                &*self.source,
                &mut self.other,
                p,
                &self.ref_len,
                &s,
                &self.ray_params,
            )?;
            if score > self.params.min_consensus {
                ctx.count_up(&s.coord)?;
                ctx.enqueue(&s.coord)?;
            }
        }
        Ok(())
    }
}

fn sample_score<const N: usize>(
    source: &dyn RayField<N>,
    buf: &mut [f32],
    reference: &Coord<N>,
    ref_len: &[f64],
    s: &RaySample<N>,
    params: &RayConsensusParams,
) -> StorageResult<f64> {
    source.read_lengths(&s.coord, buf)?;
    Ok(ray_consensus(
        reference,
        ref_len[s.ray],
        &s.coord,
        f64::from(buf[s.ray]),
        params,
    ))
}

impl<const N: usize> AdmissionStrategy<N> for StarStrategy<N> {
    fn name(&self) -> &'static str {
        "star"
    }

    fn seed(&mut self, seed: &Coord<N>, ctx: &mut FillContext<'_, N>) -> FillResult<()> {
        self.load_reference(seed)?;
        self.update(seed, ctx)
    }

    fn evaluate(&mut self, p: &Coord<N>, ctx: &FillContext<'_, N>) -> FillResult<Verdict> {
        self.load_reference(p)?;
        if self.ref_len.iter().all(|l| l.is_nan() || *l <= 0.0) {
            return Ok(Verdict::Background);
        }
        let mut mean = GeometricMean::default();
        let walk = RayWalk::new(*p, &self.rays, &self.ref_len, self.params.max_dist)?;
        for s in walk.skip(1) {
            if ctx.counts().count(&s.coord)? == 0 {
                continue;
            }
            mean.push(sample_score(
                &*self.source,
                &mut self.other,
                p,
                &self.ref_len,
                &s,
                &self.ray_params,
            )?);
        }
        let score = mean.score();
        Ok(if score.passes(self.params.min_consensus) {
            Verdict::Admitted(score)
        } else {
            Verdict::Rejected(score)
        })
    }

    fn expand(&mut self, p: &Coord<N>, verdict: &Verdict, ctx: &mut FillContext<'_, N>) -> FillResult<()> {
        match verdict {
            Verdict::Admitted(_) => self.update(p, ctx),
            _ => Ok(()),
        }
    }
}

pub type StarFill<const N: usize> = ConsensusFloodFill<StarStrategy<N>, N>;

/// Star-consensus fill over a ray-length field.
pub fn star_fill<const N: usize>(
    source: Arc<dyn RayField<N>>,
    rays: Arc<RaySet<N>>,
    counts: Arc<dyn CountField<N>>,
    state: Arc<dyn StateField<N>>,
    params: StarParams,
    worklist: &WorklistParams,
) -> FillResult<StarFill<N>> {
    Ok(ConsensusFloodFill::new(
        StarStrategy::new(source, rays, params)?,
        counts,
        state,
        worklist,
    ))
}

/// Rasterizes the star predicted at every voxel of `region` into `counts`,
/// lengths clipped to `max_dist`. Voxels without a positive length are
/// skipped. Returns the number of shapes drawn.
pub fn accumulate_star_shapes<const N: usize>(
    source: &dyn RayField<N>,
    rays: &RaySet<N>,
    counts: &dyn CountField<N>,
    region: Interval<N>,
    max_dist: f64,
) -> FillResult<usize> {
    if source.ray_count() != rays.len() {
        return Err(FillError::InvalidConfig(format!(
            "ray field has {} rays per voxel, ray set has {}",
            source.ray_count(),
            rays.len()
        )));
    }
    let coords: Vec<Coord<N>> = region.iter().collect();
    coords
        .par_iter()
        .map_init(
            || vec![0.0f32; rays.len()],
            |raw, p| -> FillResult<usize> {
                source.read_lengths(p, raw)?;
                let lengths: Vec<f64> = raw.iter().map(|l| f64::from(*l).min(max_dist)).collect();
                if lengths.iter().all(|l| l.is_nan() || *l <= 0.0) {
                    return Ok(0);
                }
                match sample_star(VecN::from_coord(p), rays, &lengths) {
                    Ok(shape) => {
                        for q in shape {
                            counts.increment(&q)?;
                        }
                        Ok(1)
                    }
                    Err(e) => {
                        log::trace!(target: "fill", "star at {:?} skipped: {}", p, e);
                        Ok(0)
                    }
                }
            },
        )
        .try_reduce(|| 0, |a, b| Ok(a + b))
}
