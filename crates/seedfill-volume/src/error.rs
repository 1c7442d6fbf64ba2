//! Errors raised by volume storage backends.

use thiserror::Error;

/// Failure to read or write the backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write addressed a voxel outside the addressable region.
    #[error("write outside addressable region at {coord:?}")]
    OutOfBounds {
        /// Offending position, one component per axis.
        coord: Vec<i64>,
    },

    /// Buffer or vector length does not match the grid layout.
    #[error("shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// IO error from a paged or file-backed store.
    #[error("storage io failed while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Result type for storage access.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn out_of_bounds<const N: usize>(coord: &[i64; N]) -> Self {
        StorageError::OutOfBounds {
            coord: coord.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StorageError::out_of_bounds(&[3, -1]);
        assert_eq!(format!("{err}"), "write outside addressable region at [3, -1]");

        let err = StorageError::ShapeMismatch { expected: 8, found: 7 };
        assert!(format!("{err}").contains("expected 8"));
    }
}
