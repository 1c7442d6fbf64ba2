//! Worklist-driven region growing shared by every admission strategy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use seedfill_geom::Coord;
use seedfill_volume::{CountField, StateField, StorageResult};

use crate::config::WorklistParams;
use crate::consensus::Score;
use crate::error::{FillResult, ShapeError};
use crate::worklist::Worklist;

/// Cooperative cancellation flag, checked once per popped coordinate.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPhase {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

/// Shared view of a fill's phase, readable from other threads.
#[derive(Clone, Debug, Default)]
pub struct PhaseWatch(Arc<AtomicU8>);

impl PhaseWatch {
    pub fn get(&self) -> FillPhase {
        match self.0.load(Ordering::Acquire) {
            1 => FillPhase::Running,
            2 => FillPhase::Completed,
            3 => FillPhase::Cancelled,
            _ => FillPhase::Idle,
        }
    }

    fn set(&self, phase: FillPhase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillReport {
    pub popped: u64,
    pub admitted: u64,
    pub pre_admitted: u64,
    pub rejected: u64,
    /// Background source values.
    pub discarded: u64,
    /// Shapes that could not be sampled.
    pub invalid: u64,
    pub pushed: u64,
    pub compactions: u64,
    pub peak_worklist: usize,
    /// Seed was already visited; nothing ran.
    pub reseeded: bool,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Outcome of testing one popped coordinate.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Admitted(Score),
    /// Already counted often enough; expand without a test.
    PreAdmitted,
    Rejected(Score),
    /// Non-positive source value.
    Background,
    InvalidShape(ShapeError),
}

/// What a strategy sees of the running fill.
pub struct FillContext<'a, const N: usize> {
    counts: &'a dyn CountField<N>,
    state: &'a dyn StateField<N>,
    worklist: &'a mut Worklist<N>,
    report: &'a mut FillReport,
}

impl<const N: usize> FillContext<'_, N> {
    #[inline]
    pub fn counts(&self) -> &dyn CountField<N> {
        self.counts
    }

    #[inline]
    pub fn state(&self) -> &dyn StateField<N> {
        self.state
    }

    #[inline]
    pub fn count_up(&self, p: &Coord<N>) -> StorageResult<()> {
        self.counts.increment(p)
    }

    /// Pushes `p` if this fill wins its enqueued flag.
    pub fn enqueue(&mut self, p: &Coord<N>) -> StorageResult<bool> {
        if self.state.try_enqueue(p)? {
            self.worklist.push(p);
            self.report.pushed += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Pushes the seed whether or not another fill already flagged it.
    pub fn push_seed(&mut self, p: &Coord<N>) -> StorageResult<()> {
        self.state.try_enqueue(p)?;
        self.worklist.push(p);
        self.report.pushed += 1;
        Ok(())
    }
}

/// The per-variant part of a consensus fill.
pub trait AdmissionStrategy<const N: usize>: Send {
    fn name(&self) -> &'static str;

    /// Unconditional admission of an unvisited seed.
    fn seed(&mut self, seed: &Coord<N>, ctx: &mut FillContext<'_, N>) -> FillResult<()>;

    /// Tests `p`, already marked visited. Storage errors abort the fill.
    fn evaluate(&mut self, p: &Coord<N>, ctx: &FillContext<'_, N>) -> FillResult<Verdict>;

    /// Writes counts for an admitted `p` and pushes what grows from it.
    fn expand(&mut self, p: &Coord<N>, verdict: &Verdict, ctx: &mut FillContext<'_, N>) -> FillResult<()>;
}

/// Single-argument "consume a seed" entry point.
pub trait SeedConsumer<const N: usize> {
    fn accept(&mut self, seed: &Coord<N>) -> FillResult<FillReport>;
}

/// One seeded fill over a shared count field and fill state.
pub struct ConsensusFloodFill<S, const N: usize> {
    strategy: S,
    counts: Arc<dyn CountField<N>>,
    state: Arc<dyn StateField<N>>,
    worklist: Worklist<N>,
    cancel: CancelToken,
    phase: PhaseWatch,
    report: FillReport,
}

impl<S: AdmissionStrategy<N>, const N: usize> ConsensusFloodFill<S, N> {
    pub fn new(
        strategy: S,
        counts: Arc<dyn CountField<N>>,
        state: Arc<dyn StateField<N>>,
        params: &WorklistParams,
    ) -> Self {
        Self {
            strategy,
            counts,
            state,
            worklist: Worklist::new(params.cleanup_threshold),
            cancel: CancelToken::new(),
            phase: PhaseWatch::default(),
            report: FillReport::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reuses a worklist allocation, e.g. one handed back by a pool.
    pub fn with_worklist_buffer(mut self, buf: Vec<i64>, params: &WorklistParams) -> Self {
        self.worklist = Worklist::with_buffer(buf, params.cleanup_threshold);
        self
    }

    pub fn into_worklist_buffer(self) -> Vec<i64> {
        self.worklist.into_buffer()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> FillPhase {
        self.phase.get()
    }

    pub fn phase_watch(&self) -> PhaseWatch {
        self.phase.clone()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Report of the last finished run.
    pub fn report(&self) -> &FillReport {
        &self.report
    }

    /// Runs one fill from `seed` to completion or cancellation. A previous
    /// run's worklist is discarded first.
    pub fn fill(&mut self, seed: &Coord<N>) -> FillResult<FillReport> {
        self.worklist.clear();
        self.report = FillReport::default();
        self.phase.set(FillPhase::Running);
        log::debug!(target: "fill", "{} fill start seed={:?}", self.strategy.name(), seed);
        let start = Instant::now();
        let outcome = self.run(seed);
        self.report.elapsed = start.elapsed();
        self.report.peak_worklist = self.worklist.peak_len();
        match outcome {
            Ok(cancelled) => {
                self.report.cancelled = cancelled;
                self.phase.set(if cancelled {
                    FillPhase::Cancelled
                } else {
                    FillPhase::Completed
                });
                log::debug!(
                    target: "fill",
                    "{} fill {} seed={:?} ms={} {:?}",
                    self.strategy.name(),
                    if cancelled { "cancelled" } else { "done" },
                    seed,
                    self.report.elapsed.as_millis(),
                    self.report
                );
                Ok(self.report.clone())
            }
            Err(e) => {
                self.report.cancelled = true;
                self.phase.set(FillPhase::Cancelled);
                log::warn!(target: "fill", "{} fill aborted seed={:?}: {}", self.strategy.name(), seed, e);
                Err(e)
            }
        }
    }

    // Ok(true) when cancelled.
    fn run(&mut self, seed: &Coord<N>) -> FillResult<bool> {
        let Self {
            strategy,
            counts,
            state,
            worklist,
            cancel,
            report,
            ..
        } = self;
        let mut ctx = FillContext {
            counts: &**counts,
            state: &**state,
            worklist,
            report,
        };

        if ctx.state.flags(seed)?.visited() {
            ctx.report.reseeded = true;
            return Ok(false);
        }
        strategy.seed(seed, &mut ctx)?;

        loop {
            if ctx.worklist.is_empty() {
                return Ok(false);
            }
            if cancel.is_cancelled() {
                return Ok(true);
            }
            let Some(p) = ctx.worklist.pop() else {
                return Ok(false);
            };
            ctx.report.popped += 1;
            ctx.state.mark_visited(&p)?;

            let verdict = strategy.evaluate(&p, &ctx)?;
            match &verdict {
                Verdict::Admitted(_) => {
                    ctx.report.admitted += 1;
                    strategy.expand(&p, &verdict, &mut ctx)?;
                }
                Verdict::PreAdmitted => {
                    ctx.report.pre_admitted += 1;
                    strategy.expand(&p, &verdict, &mut ctx)?;
                }
                Verdict::Rejected(_) => ctx.report.rejected += 1,
                Verdict::Background => ctx.report.discarded += 1,
                Verdict::InvalidShape(e) => {
                    log::trace!(target: "fill", "discard {:?}: {}", p, e);
                    ctx.report.invalid += 1;
                }
            }

            if ctx.worklist.should_compact() {
                let before = ctx.worklist.stored_components();
                ctx.worklist.compact();
                ctx.report.compactions += 1;
                log::trace!(
                    target: "fill",
                    "worklist compacted {} -> {} components",
                    before,
                    ctx.worklist.stored_components()
                );
            }
        }
    }
}

impl<S: AdmissionStrategy<N>, const N: usize> SeedConsumer<N> for ConsensusFloodFill<S, N> {
    fn accept(&mut self, seed: &Coord<N>) -> FillResult<FillReport> {
        self.fill(seed)
    }
}
