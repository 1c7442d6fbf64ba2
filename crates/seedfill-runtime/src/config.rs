use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RuntimeParams {
    /// Worker threads; 0 picks the available parallelism.
    #[serde(default)]
    pub workers: usize,
}

impl RuntimeParams {
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8)
        }
    }
}
