//! Consensus-gated seeded flood fill.
//!
//! A fill starts at one seed and grows over a volume only where a per-voxel
//! shape prediction agrees with what has been counted so far. Two
//! predictions are supported: a ball radius per voxel ([`ball`]) and a set
//! of star ray lengths per voxel ([`star`]). Both run on the same worklist
//! engine ([`engine`]) and write into a shared count field, so several fills
//! may grow the same label at once.
#![forbid(unsafe_code)]

pub mod ball;
pub mod config;
pub mod consensus;
pub mod engine;
mod error;
pub mod neighborhood;
pub mod shape;
pub mod star;
pub mod worklist;

pub use ball::{BallFill, BallStrategy, ball_fill};
pub use config::{BallParams, FillConfig, RadiusMode, StarParams, WorklistParams, load_params_from_path};
pub use consensus::{RAY_EPSILON, RayConsensusParams, RayScore, Score, ball_overlap, ray_consensus};
pub use engine::{
    AdmissionStrategy, CancelToken, ConsensusFloodFill, FillContext, FillPhase, FillReport, PhaseWatch,
    SeedConsumer, Verdict,
};
pub use error::{FillError, FillResult, ShapeError};
pub use neighborhood::Neighborhood;
pub use shape::{BallIter, RaySample, RayWalk, sample_ball, sample_star};
pub use star::{StarFill, StarStrategy, accumulate_star_shapes, star_fill};
pub use worklist::Worklist;
