use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::consensus::{RayConsensusParams, RayScore};
use crate::error::{FillError, FillResult};
use crate::neighborhood::Neighborhood;

/// How the ball fill turns a source radius into a sampling radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadiusMode {
    /// Nearest integer.
    #[default]
    Rounded,
    Exact,
}

impl RadiusMode {
    #[inline]
    pub fn apply(self, r: f64) -> f64 {
        match self {
            RadiusMode::Rounded => r.round(),
            RadiusMode::Exact => r,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FillConfig {
    #[serde(default)]
    pub ball: BallParams,
    #[serde(default)]
    pub star: StarParams,
    #[serde(default)]
    pub worklist: WorklistParams,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BallParams {
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f64,
    /// Voxels counted more often than this are expanded without a test.
    #[serde(default = "default_skip_count")]
    pub skip_count: u32,
    #[serde(default)]
    pub connectivity: Neighborhood,
    #[serde(default)]
    pub radius_mode: RadiusMode,
    /// Source radii above this are clamped before sampling.
    #[serde(default)]
    pub max_radius: Option<f64>,
}
fn default_min_overlap() -> f64 {
    0.5
}
fn default_skip_count() -> u32 {
    50
}
impl Default for BallParams {
    fn default() -> Self {
        Self {
            min_overlap: default_min_overlap(),
            skip_count: default_skip_count(),
            connectivity: Neighborhood::default(),
            radius_mode: RadiusMode::default(),
            max_radius: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StarParams {
    #[serde(default = "default_max_dist")]
    pub max_dist: f64,
    #[serde(default = "default_min_consensus")]
    pub min_consensus: f64,
    /// Length differences below this count as full agreement; 0 disables.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_enqueue_radius")]
    pub max_enqueue_radius: f64,
    #[serde(default)]
    pub ray_score: RayScore,
}
fn default_max_dist() -> f64 {
    20.0
}
fn default_min_consensus() -> f64 {
    0.75
}
fn default_tolerance() -> f64 {
    1.0
}
fn default_max_enqueue_radius() -> f64 {
    10.0
}
impl Default for StarParams {
    fn default() -> Self {
        Self {
            max_dist: default_max_dist(),
            min_consensus: default_min_consensus(),
            tolerance: default_tolerance(),
            max_enqueue_radius: default_max_enqueue_radius(),
            ray_score: RayScore::default(),
        }
    }
}

impl StarParams {
    pub fn ray_params(&self) -> RayConsensusParams {
        RayConsensusParams {
            max_dist: self.max_dist,
            tolerance: self.tolerance,
            score: self.ray_score,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorklistParams {
    /// Processed entries kept before the worklist is compacted.
    #[serde(default = "default_cleanup_threshold")]
    pub cleanup_threshold: usize,
}
fn default_cleanup_threshold() -> usize {
    100_000
}
impl Default for WorklistParams {
    fn default() -> Self {
        Self {
            cleanup_threshold: default_cleanup_threshold(),
        }
    }
}

fn check_unit(name: &str, v: f64) -> FillResult<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(FillError::InvalidConfig(format!("{name} must be in [0, 1], got {v}")))
    }
}

fn check_non_negative(name: &str, v: f64) -> FillResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(FillError::InvalidConfig(format!("{name} must be finite and >= 0, got {v}")))
    }
}

impl BallParams {
    pub fn validate(&self) -> FillResult<()> {
        check_unit("ball.min_overlap", self.min_overlap)?;
        match self.max_radius {
            Some(cap) => check_non_negative("ball.max_radius", cap),
            None => Ok(()),
        }
    }
}

impl StarParams {
    pub fn validate(&self) -> FillResult<()> {
        check_unit("star.min_consensus", self.min_consensus)?;
        check_non_negative("star.max_dist", self.max_dist)?;
        check_non_negative("star.tolerance", self.tolerance)?;
        check_non_negative("star.max_enqueue_radius", self.max_enqueue_radius)
    }
}

impl FillConfig {
    pub fn validate(&self) -> FillResult<()> {
        self.ball.validate()?;
        self.star.validate()?;
        if self.worklist.cleanup_threshold == 0 {
            return Err(FillError::InvalidConfig(
                "worklist.cleanup_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}

pub fn load_params_from_path(path: &Path) -> Result<FillConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: FillConfig = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}
