//! Worker pool that runs seeded fills, plus label sessions and the seed
//! controller that feeds it.
#![forbid(unsafe_code)]

mod config;
mod controller;
mod error;
mod labels;
mod worklist_pool;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use seedfill_fill::{
    AdmissionStrategy, BallParams, BallStrategy, ConsensusFloodFill, FillReport, FillResult, StarParams,
    StarStrategy, WorklistParams,
};
use seedfill_geom::{Coord, RaySet};
use seedfill_volume::{CountField, RayField, StateField, VoxelField};

pub use config::RuntimeParams;
pub use controller::{AffineSeedTransform, SeedController, SeedTransform};
pub use error::RuntimeError;
pub use labels::{LabelFields, LabelId, LabelSet};
pub use seedfill_fill::CancelToken;
pub use worklist_pool::WorklistPool;

/// Which admission test a job runs, with its read-only source.
#[derive(Clone)]
pub enum FillKind<const N: usize> {
    Ball {
        source: Arc<dyn VoxelField<f32, N>>,
        params: BallParams,
    },
    Star {
        source: Arc<dyn RayField<N>>,
        rays: Arc<RaySet<N>>,
        params: StarParams,
    },
}

impl<const N: usize> FillKind<N> {
    pub fn name(&self) -> &'static str {
        match self {
            FillKind::Ball { .. } => "ball",
            FillKind::Star { .. } => "star",
        }
    }
}

pub struct FillJob<const N: usize> {
    pub label: LabelId,
    pub seed: Coord<N>,
    pub kind: FillKind<N>,
    pub counts: Arc<dyn CountField<N>>,
    pub state: Arc<dyn StateField<N>>,
    pub worklist: WorklistParams,
}

#[derive(Clone, Debug)]
pub struct JobTicket {
    pub job_id: u64,
    pub cancel: CancelToken,
}

#[derive(Debug)]
pub struct JobOut<const N: usize> {
    pub label: LabelId,
    pub job_id: u64,
    pub seed: Coord<N>,
    pub kind: &'static str,
    pub result: FillResult<FillReport>,
    pub t_total_ms: u32,
}

struct Queued<const N: usize> {
    job_id: u64,
    cancel: CancelToken,
    job: FillJob<N>,
}

fn run_fill<S: AdmissionStrategy<N>, const N: usize>(
    strategy: FillResult<S>,
    job: &FillJob<N>,
    cancel: CancelToken,
    buffers: &WorklistPool,
) -> FillResult<FillReport> {
    let strategy = strategy?;
    let buf = buffers.acquire();
    let mut fill = ConsensusFloodFill::new(strategy, job.counts.clone(), job.state.clone(), &job.worklist)
        .with_worklist_buffer(buf, &job.worklist)
        .with_cancel(cancel);
    let out = fill.fill(&job.seed);
    buffers.release(fill.into_worklist_buffer());
    out
}

fn process_fill_job<const N: usize>(queued: Queued<N>, buffers: &WorklistPool, tx: &Sender<JobOut<N>>) {
    let Queued { job_id, cancel, job } = queued;
    let t0 = Instant::now();
    let result = match &job.kind {
        FillKind::Ball { source, params } => run_fill(
            BallStrategy::new(source.clone(), params.clone()),
            &job,
            cancel,
            buffers,
        ),
        FillKind::Star {
            source,
            rays,
            params,
        } => run_fill(
            StarStrategy::new(source.clone(), rays.clone(), params.clone()),
            &job,
            cancel,
            buffers,
        ),
    };
    let t_total_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    let _ = tx.send(JobOut {
        label: job.label,
        job_id,
        seed: job.seed,
        kind: job.kind.name(),
        result,
        t_total_ms,
    });
}

/// Bounded pool running one fill per worker at a time.
pub struct FillRuntime<const N: usize> {
    job_tx: Option<Sender<Queued<N>>>,
    res_rx: Receiver<JobOut<N>>,
    _pool: Arc<ThreadPool>,
    q_fill: Arc<AtomicUsize>,
    inflight_fill: Arc<AtomicUsize>,
    next_job: AtomicU64,
    buffers: Arc<WorklistPool>,
    pub workers: usize,
}

impl<const N: usize> FillRuntime<N> {
    pub fn new(params: &RuntimeParams) -> Result<Self, RuntimeError> {
        let workers = params.worker_count();
        let (job_tx, job_rx) = unbounded::<Queued<N>>();
        let (res_tx, res_rx) = unbounded::<JobOut<N>>();
        let buffers = WorklistPool::with_capacity_from_workers(workers);
        let q_fill = Arc::new(AtomicUsize::new(0));
        let inflight_fill = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("seedfill-fill-{i}"))
                .build()?,
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let q_fill = q_fill.clone();
            let inflight_fill = inflight_fill.clone();
            let buffers = buffers.clone();
            pool.spawn(move || {
                while let Ok(queued) = rx.recv() {
                    inflight_fill.fetch_add(1, Ordering::Relaxed);
                    q_fill.fetch_sub(1, Ordering::Relaxed);
                    process_fill_job(queued, buffers.as_ref(), &tx);
                    inflight_fill.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }
        log::debug!(target: "runtime", "fill runtime started workers={}", workers);

        Ok(Self {
            job_tx: Some(job_tx),
            res_rx,
            _pool: pool,
            q_fill,
            inflight_fill,
            next_job: AtomicU64::new(1),
            buffers,
            workers,
        })
    }

    pub fn submit(&self, job: FillJob<N>) -> Result<JobTicket, RuntimeError> {
        let tx = self.job_tx.as_ref().ok_or(RuntimeError::Closed)?;
        let job_id = self.next_job.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::new();
        self.q_fill.fetch_add(1, Ordering::Relaxed);
        let queued = Queued {
            job_id,
            cancel: cancel.clone(),
            job,
        };
        if tx.send(queued).is_err() {
            self.q_fill.fetch_sub(1, Ordering::Relaxed);
            return Err(RuntimeError::Closed);
        }
        Ok(JobTicket { job_id, cancel })
    }

    pub fn drain_results(&self) -> Vec<JobOut<N>> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks until one result arrives or `timeout` passes.
    pub fn wait_result(&self, timeout: Duration) -> Option<JobOut<N>> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(out) => Some(out),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// `(queued, in flight)`
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.q_fill.load(Ordering::Relaxed),
            self.inflight_fill.load(Ordering::Relaxed),
        )
    }

    pub fn is_idle(&self) -> bool {
        let (q, inflight) = self.queue_debug_counts();
        q == 0 && inflight == 0
    }

    pub fn worklist_pool(&self) -> Arc<WorklistPool> {
        Arc::clone(&self.buffers)
    }
}

impl<const N: usize> Drop for FillRuntime<N> {
    fn drop(&mut self) {
        // workers exit once the channel is closed and drained
        self.job_tx.take();
    }
}
