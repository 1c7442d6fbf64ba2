//! Error types for shape sampling and fills.

use seedfill_volume::StorageError;
use thiserror::Error;

/// Shape parameters that cannot be rasterized.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("invalid shape parameter: {0}")]
    InvalidShapeParameter(String),
}

/// Failure of a fill or of a direct metric evaluation.
#[derive(Debug, Error)]
pub enum FillError {
    /// Shape could not be sampled. Inside a fill this only discards a voxel.
    #[error(transparent)]
    InvalidShapeParameter(#[from] ShapeError),

    /// Backing store failed; aborts the fill.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Parameters rejected before a fill starts.
    #[error("invalid fill configuration: {0}")]
    InvalidConfig(String),
}

pub type FillResult<T> = std::result::Result<T, FillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_conversion() {
        let err: FillError = ShapeError::InvalidShapeParameter("radius -1".into()).into();
        assert_eq!(err.to_string(), "invalid shape parameter: radius -1");

        let err: FillError = StorageError::Backend("disk gone".into()).into();
        assert!(matches!(err, FillError::Storage(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
