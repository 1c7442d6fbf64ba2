use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use seedfill_geom::Interval;
use seedfill_volume::{GridLayout, StorageError, StorageResult, VolumeSink};

/// Raw little-endian `u32` volume file laid out like the in-memory grids
/// (first axis fastest). Blocks land at their final offsets, so they can be
/// written in any order.
pub struct RawFileSink<const N: usize> {
    layout: GridLayout<N>,
    file: Mutex<File>,
}

fn io_err(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> StorageError {
    let context = context.into();
    move |source| StorageError::Io { context, source }
}

impl<const N: usize> RawFileSink<N> {
    /// Creates (or truncates) `path` sized for the whole of `bounds`.
    pub fn create(path: &Path, bounds: Interval<N>) -> StorageResult<Self> {
        let layout = GridLayout::new(bounds);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_err(format!("creating {}", path.display())))?;
        file.set_len((layout.len() * 4) as u64)
            .map_err(io_err(format!("sizing {}", path.display())))?;
        Ok(Self {
            layout,
            file: Mutex::new(file),
        })
    }

    pub fn bounds(&self) -> Interval<N> {
        self.layout.bounds()
    }
}

impl<const N: usize> VolumeSink<N> for RawFileSink<N> {
    fn write_block(&self, block: Interval<N>, data: &[u32]) -> StorageResult<()> {
        if data.len() != block.size() {
            return Err(StorageError::ShapeMismatch {
                expected: block.size(),
                found: data.len(),
            });
        }
        if block.is_empty() {
            return Ok(());
        }
        // one contiguous run per line along the first axis
        let run = block.dim(0);
        let mut file = self
            .file
            .lock()
            .map_err(|_| StorageError::Backend("raw sink lock poisoned".into()))?;
        let mut line_max = block.max;
        line_max[0] = block.min[0];
        let lines = Interval::new(block.min, line_max);
        let mut bytes = Vec::with_capacity(run * 4);
        for (start, values) in lines.iter().zip(data.chunks(run)) {
            let index = self
                .layout
                .index(&start)
                .ok_or_else(|| StorageError::out_of_bounds(&start))?;
            bytes.clear();
            for v in values {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            file.seek(SeekFrom::Start((index * 4) as u64))
                .map_err(io_err("seeking raw volume"))?;
            file.write_all(&bytes).map_err(io_err("writing raw volume"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfill_volume::{AtomicCounts, CountField, write_counts};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("seedfill-{}-{}", std::process::id(), name))
    }

    #[test]
    fn blocks_land_at_row_major_offsets() {
        let bounds = Interval::from_dims([5, 3, 2]);
        let counts = AtomicCounts::new(bounds);
        for (i, p) in bounds.iter().enumerate() {
            for _ in 0..(i % 7) {
                counts.increment(&p).unwrap();
            }
        }
        let path = temp_path("raw.u32");
        let sink = RawFileSink::create(&path, bounds).unwrap();
        let blocks = write_counts(&counts, &sink, [2, 2, 1]).unwrap();
        assert_eq!(blocks, 3 * 2 * 2);
        drop(sink);

        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let values: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(values, counts.snapshot());
    }

    #[test]
    fn wrong_block_length_is_rejected() {
        let bounds = Interval::from_dims([4, 4]);
        let path = temp_path("short.u32");
        let sink = RawFileSink::create(&path, bounds).unwrap();
        let err = sink.write_block(Interval::from_dims([2, 2]), &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, StorageError::ShapeMismatch { expected: 4, found: 3 }));
        std::fs::remove_file(&path).ok();
    }
}
