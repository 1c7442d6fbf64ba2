use thiserror::Error;

use crate::labels::LabelId;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build fill worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// Job channel closed; the runtime is shutting down.
    #[error("fill runtime is closed")]
    Closed,

    /// Seed addressed to a label that does not exist (or was removed).
    #[error("unknown label {0}")]
    UnknownLabel(LabelId),
}
