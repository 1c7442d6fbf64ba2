//! Glue between viewer seed events and the fill runtime.

use hashbrown::HashMap;
use seedfill_fill::WorklistParams;
use seedfill_geom::Coord;

use crate::labels::{LabelId, LabelSet};
use crate::{FillJob, FillKind, FillRuntime, JobOut, JobTicket, RuntimeError};

/// Maps a screen event to a volume coordinate.
pub trait SeedTransform<const N: usize> {
    fn to_volume(&self, x: f64, y: f64) -> Coord<N>;
}

/// Screen `(x, y)` scaled and offset onto two volume axes; the other axes
/// stay at `slice`.
#[derive(Clone, Debug)]
pub struct AffineSeedTransform<const N: usize> {
    pub axes: [usize; 2],
    pub scale: [f64; 2],
    pub offset: [f64; 2],
    pub slice: Coord<N>,
}

impl<const N: usize> AffineSeedTransform<N> {
    /// Identity on the first two axes.
    pub fn identity(slice: Coord<N>) -> Self {
        Self {
            axes: [0, 1],
            scale: [1.0, 1.0],
            offset: [0.0, 0.0],
            slice,
        }
    }
}

impl<const N: usize> SeedTransform<N> for AffineSeedTransform<N> {
    fn to_volume(&self, x: f64, y: f64) -> Coord<N> {
        let mut c = self.slice;
        for (i, v) in [x, y].into_iter().enumerate() {
            let axis = self.axes[i];
            if axis < N {
                c[axis] = (v * self.scale[i] + self.offset[i]).round() as i64;
            }
        }
        c
    }
}

/// Owns the labels and the runtime; each seed event becomes one fill job on
/// the current label.
pub struct SeedController<T, const N: usize> {
    transform: T,
    labels: LabelSet<N>,
    runtime: FillRuntime<N>,
    kind: FillKind<N>,
    worklist: WorklistParams,
    pending: HashMap<u64, LabelId>,
}

impl<T: SeedTransform<N>, const N: usize> SeedController<T, N> {
    pub fn new(
        transform: T,
        labels: LabelSet<N>,
        runtime: FillRuntime<N>,
        kind: FillKind<N>,
        worklist: WorklistParams,
    ) -> Self {
        Self {
            transform,
            labels,
            runtime,
            kind,
            worklist,
            pending: HashMap::new(),
        }
    }

    pub fn on_seed_event(&mut self, x: f64, y: f64) -> Result<JobTicket, RuntimeError> {
        let seed = self.transform.to_volume(x, y);
        self.seed_at(seed)
    }

    /// Dispatches a fill from `seed` on the current label, creating one if
    /// none is current.
    pub fn seed_at(&mut self, seed: Coord<N>) -> Result<JobTicket, RuntimeError> {
        let label = self.labels.current_or_create();
        self.seed_on(label, seed)
    }

    /// Dispatches a fill from `seed` on `label`, current or not.
    pub fn seed_on(&mut self, label: LabelId, seed: Coord<N>) -> Result<JobTicket, RuntimeError> {
        let fields = self
            .labels
            .fields(label)
            .ok_or(RuntimeError::UnknownLabel(label))?;
        let ticket = self.runtime.submit(FillJob {
            label,
            seed,
            kind: self.kind.clone(),
            counts: fields.counts,
            state: fields.state,
            worklist: self.worklist.clone(),
        })?;
        log::debug!(
            target: "runtime",
            "{} fill queued job={} label={} seed={:?}",
            self.kind.name(),
            ticket.job_id,
            label,
            seed
        );
        self.pending.insert(ticket.job_id, label);
        Ok(ticket)
    }

    /// Collects finished jobs and bumps the revision of every label they
    /// touched.
    pub fn poll(&mut self) -> Vec<JobOut<N>> {
        let outs = self.runtime.drain_results();
        for out in &outs {
            self.finish(out);
        }
        outs
    }

    /// Waits for every dispatched job, bumping revisions as they land.
    pub fn wait_all(&mut self, per_job: std::time::Duration) -> Vec<JobOut<N>> {
        let mut outs = Vec::new();
        while !self.pending.is_empty() {
            match self.runtime.wait_result(per_job) {
                Some(out) => {
                    self.finish(&out);
                    outs.push(out);
                }
                None => break,
            }
        }
        outs
    }

    fn finish(&mut self, out: &JobOut<N>) {
        self.pending.remove(&out.job_id);
        let rev = self.labels.bump(out.label);
        match &out.result {
            Ok(report) => log::info!(
                target: "runtime",
                "{} fill job={} label={} rev={} admitted={} popped={} cancelled={} ms={}",
                out.kind,
                out.job_id,
                out.label,
                rev,
                report.admitted,
                report.popped,
                report.cancelled,
                out.t_total_ms
            ),
            Err(e) => log::warn!(
                target: "runtime",
                "{} fill job={} label={} failed: {}",
                out.kind,
                out.job_id,
                out.label,
                e
            ),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn labels(&self) -> &LabelSet<N> {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelSet<N> {
        &mut self.labels
    }

    pub fn runtime(&self) -> &FillRuntime<N> {
        &self.runtime
    }
}
