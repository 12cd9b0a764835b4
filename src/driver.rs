//! Batch execution: one DP pass per pair, serially or on a worker pool.
//!
//! Workers pull pairs from a bounded channel and push finished results into a
//! reorder buffer addressed by pair index. The consumer drains the buffer in
//! input order; workers block once they run too far ahead of it.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use log::{debug, error, trace, warn};

use crate::alphabet::Sequence;
use crate::config::{AlignConfig, Execution};
use crate::matrix::DpMatrix;
use crate::result::{AlignmentResult, Computed};
use crate::scoring::ScoringScheme;
use crate::traceback::trace_back;
use crate::{AlignError, REORDER_SLACK};

type PairResult<A> = Result<AlignmentResult<A>, AlignError>;

/// Aligns single pairs under one shared configuration.
#[derive(Debug, Clone)]
pub struct PairwiseAligner<Sc> {
    config: AlignConfig<Sc>,
}

impl<Sc> PairwiseAligner<Sc> {
    pub fn new(config: AlignConfig<Sc>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignConfig<Sc> {
        &self.config
    }

    /// Runs the DP engine, traceback and result assembly for one pair.
    pub fn align<S1, S2>(
        &self,
        pair_index: usize,
        seq1: &S1,
        seq2: &S2,
    ) -> Result<AlignmentResult<S1::Symbol>, AlignError>
    where
        S1: Sequence + ?Sized,
        S2: Sequence<Symbol = S1::Symbol> + ?Sized,
        Sc: ScoringScheme<S1::Symbol>,
    {
        let config = &self.config;
        if let Some(limit) = config.max_cells() {
            let cells = (seq1.len() + 1).saturating_mul(seq2.len() + 1);
            if cells > limit {
                return Err(AlignError::SequenceTooLarge { cells, limit });
            }
        }

        let outputs = config.outputs();
        let with_trace = outputs.needs_traceback();
        let run = DpMatrix::new(config).fill(seq1, seq2, with_trace);

        let optimum = match (run.optimum, config.min_score()) {
            (Some(o), Some(min)) if o.score < min => {
                debug!("pair {pair_index}: score {} below minimum {min}", o.score);
                None
            }
            (optimum, _) => optimum,
        };
        if optimum.is_none() {
            warn!("pair {pair_index}: no valid alignment");
        }

        let computed = optimum.map(|o| {
            let (alignment, begin) = match run.trace.as_ref() {
                Some(matrix) => {
                    let (alignment, begin) = trace_back(
                        seq1,
                        seq2,
                        matrix,
                        o.end,
                        o.state,
                        config.method(),
                        config.end_gaps(),
                    );
                    (Some(alignment), Some(begin))
                }
                None => (None, None),
            };
            Computed {
                score: o.score,
                end: o.end,
                begin,
                alignment,
            }
        });

        let id = |seq: Option<&str>| seq.map_or_else(|| pair_index.to_string(), str::to_string);
        let ids = (id(seq1.id()), id(seq2.id()));
        Ok(AlignmentResult::assemble(pair_index, outputs, computed, ids))
    }

    /// Like [`align`](Self::align), but a panic inside the pass becomes a
    /// per-pair failure.
    fn align_guarded<S1, S2>(
        &self,
        pair_index: usize,
        seq1: &S1,
        seq2: &S2,
    ) -> PairResult<S1::Symbol>
    where
        S1: Sequence + ?Sized,
        S2: Sequence<Symbol = S1::Symbol> + ?Sized,
        Sc: ScoringScheme<S1::Symbol>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.align(pair_index, seq1, seq2)));
        let result = outcome.unwrap_or_else(|payload| {
            Err(AlignError::WorkerFailed {
                pair: pair_index,
                reason: panic_reason(payload.as_ref()),
            })
        });
        match &result {
            Ok(_) => trace!("pair {pair_index} aligned"),
            Err(e) => warn!("pair {pair_index} failed: {e}"),
        }
        result
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

/// Aligns one pair with `config`, reporting it as pair 0.
pub fn align_pair<S1, S2, Sc>(
    seq1: &S1,
    seq2: &S2,
    config: &AlignConfig<Sc>,
) -> Result<AlignmentResult<S1::Symbol>, AlignError>
where
    S1: Sequence + ?Sized,
    S2: Sequence<Symbol = S1::Symbol> + ?Sized,
    Sc: ScoringScheme<S1::Symbol> + Clone,
{
    PairwiseAligner::new(config.clone()).align(0, seq1, seq2)
}

struct Job<S1, S2> {
    index: usize,
    seq1: S1,
    seq2: S2,
}

/// Aligns every pair and yields results lazily, in input order.
///
/// Under parallel execution the input is consumed on a background thread.
/// Dropping the returned iterator stops dispatching; alignments already
/// running finish and are discarded.
pub fn align_pairwise<I, S1, S2, Sc>(
    pairs: I,
    config: AlignConfig<Sc>,
) -> Result<AlignmentResults<S1::Symbol>, AlignError>
where
    I: IntoIterator<Item = (S1, S2)>,
    I::IntoIter: Send + 'static,
    S1: Sequence + Send + 'static,
    S2: Sequence<Symbol = S1::Symbol> + Send + 'static,
    Sc: ScoringScheme<S1::Symbol> + 'static,
{
    let aligner = PairwiseAligner::new(config);
    match aligner.config().execution() {
        Execution::Serial => {
            let iter = pairs
                .into_iter()
                .enumerate()
                .map(move |(index, (seq1, seq2))| aligner.align_guarded(index, &seq1, &seq2));
            Ok(AlignmentResults {
                inner: Inner::Serial(Box::new(iter)),
            })
        }
        Execution::Parallel { threads } => {
            ParallelResults::spawn(pairs.into_iter(), Arc::new(aligner), threads).map(|p| {
                AlignmentResults {
                    inner: Inner::Parallel(p),
                }
            })
        }
    }
}

/// Aligns every pair and hands each result to `on_result` as soon as it is
/// ready, in completion order. Returns once every callback has run.
///
/// Pairs may borrow from the caller: workers are scoped to this call.
pub fn align_pairwise_with<I, S1, S2, Sc, F>(
    pairs: I,
    config: AlignConfig<Sc>,
    on_result: F,
) -> Result<(), AlignError>
where
    I: IntoIterator<Item = (S1, S2)>,
    S1: Sequence + Send,
    S2: Sequence<Symbol = S1::Symbol> + Send,
    Sc: ScoringScheme<S1::Symbol>,
    F: Fn(PairResult<S1::Symbol>) + Sync,
{
    let aligner = PairwiseAligner::new(config);
    let threads = match aligner.config().execution() {
        Execution::Serial => {
            for (index, (seq1, seq2)) in pairs.into_iter().enumerate() {
                on_result(aligner.align_guarded(index, &seq1, &seq2));
            }
            return Ok(());
        }
        Execution::Parallel { threads } => threads,
    };

    debug!("starting {threads} alignment workers (callback mode)");
    let aligner = &aligner;
    let on_result = &on_result;
    thread::scope(|scope| {
        let (work_tx, work_rx) = bounded::<Job<S1, S2>>(threads);
        for id in 0..threads {
            let work_rx = work_rx.clone();
            thread::Builder::new()
                .name(format!("pairalign-worker-{id}"))
                .spawn_scoped(scope, move || {
                    while let Ok(job) = work_rx.recv() {
                        on_result(aligner.align_guarded(job.index, &job.seq1, &job.seq2));
                    }
                })?;
        }
        drop(work_rx);

        let mut dispatched = 0;
        for (index, (seq1, seq2)) in pairs.into_iter().enumerate() {
            if work_tx.send(Job { index, seq1, seq2 }).is_err() {
                break;
            }
            dispatched += 1;
        }
        debug!("dispatched {dispatched} pairs");
        Ok(())
    })
}

/// Results of a batch, in input order.
pub struct AlignmentResults<A> {
    inner: Inner<A>,
}

enum Inner<A> {
    Serial(Box<dyn Iterator<Item = PairResult<A>> + Send>),
    Parallel(ParallelResults<A>),
}

impl<A> Iterator for AlignmentResults<A> {
    type Item = PairResult<A>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Serial(iter) => iter.next(),
            Inner::Parallel(p) => p.next(),
        }
    }
}

/// Index-addressed slots for results that finished ahead of their turn.
struct ReorderBuffer<T> {
    state: Mutex<ReorderState<T>>,
    ready: Condvar,
    space: Condvar,
    capacity: usize,
}

struct ReorderState<T> {
    /// `slots[k]` holds the result for pair `next + k`.
    slots: VecDeque<Option<T>>,
    next: usize,
    /// Number of pairs dispatched, known once the input is exhausted.
    total: Option<usize>,
    closed: bool,
}

impl<T> ReorderBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ReorderState {
                slots: VecDeque::with_capacity(capacity),
                next: 0,
                total: None,
                closed: false,
            }),
            ready: Condvar::new(),
            space: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReorderState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stores the result for `index`, waiting while it is too far ahead of the
    /// consumer. Returns false if the consumer has gone away.
    fn insert(&self, index: usize, value: T) -> bool {
        let mut state = self.lock();
        while !state.closed && index >= state.next + self.capacity {
            state = self.space.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return false;
        }
        let offset = index - state.next;
        if state.slots.len() <= offset {
            state.slots.resize_with(offset + 1, || None);
        }
        state.slots[offset] = Some(value);
        self.ready.notify_one();
        true
    }

    /// Waits for the next result in order; `None` once every pair was taken.
    fn take_next(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(Some(_)) = state.slots.front() {
                let value = state.slots.pop_front().flatten();
                state.next += 1;
                self.space.notify_all();
                return value;
            }
            if state.closed || state.total == Some(state.next) {
                return None;
            }
            state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish(&self, total: usize) {
        self.lock().total = Some(total);
        self.ready.notify_all();
    }

    fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.slots.clear();
        self.space.notify_all();
        self.ready.notify_all();
    }
}

struct ParallelResults<A> {
    buffer: Arc<ReorderBuffer<PairResult<A>>>,
    dispatcher: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl<A: Send + 'static> ParallelResults<A> {
    fn spawn<It, S1, S2, Sc>(
        pairs: It,
        aligner: Arc<PairwiseAligner<Sc>>,
        threads: usize,
    ) -> Result<Self, AlignError>
    where
        It: Iterator<Item = (S1, S2)> + Send + 'static,
        S1: Sequence<Symbol = A> + Send + 'static,
        S2: Sequence<Symbol = A> + Send + 'static,
        Sc: ScoringScheme<A> + 'static,
    {
        debug!("starting {threads} alignment workers");
        let buffer = Arc::new(ReorderBuffer::new(threads + REORDER_SLACK));
        let mut results = Self {
            buffer: Arc::clone(&buffer),
            dispatcher: None,
            workers: Vec::with_capacity(threads),
        };
        // Declared after `results` so an early return disconnects the workers
        // before `results` joins them.
        let (work_tx, work_rx) = bounded::<Job<S1, S2>>(threads);

        for id in 0..threads {
            let worker = Worker {
                aligner: Arc::clone(&aligner),
                buffer: Arc::clone(&buffer),
                work_rx: work_rx.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("pairalign-worker-{id}"))
                .spawn(move || worker.run())?;
            results.workers.push(handle);
        }
        drop(work_rx);

        let dispatcher = thread::Builder::new()
            .name("pairalign-dispatch".to_string())
            .spawn(move || {
                let mut dispatched = 0;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    for (index, (seq1, seq2)) in pairs.enumerate() {
                        if buffer.is_closed() || work_tx.send(Job { index, seq1, seq2 }).is_err() {
                            break;
                        }
                        dispatched = index + 1;
                    }
                }));
                drop(work_tx);
                let total = match outcome {
                    Ok(()) => dispatched,
                    Err(payload) => {
                        // The pair the input failed to produce takes the next slot.
                        let reason = panic_reason(payload.as_ref());
                        error!("input iterator panicked at pair {dispatched}: {reason}");
                        let failure = Err(AlignError::WorkerFailed {
                            pair: dispatched,
                            reason,
                        });
                        buffer.insert(dispatched, failure);
                        dispatched + 1
                    }
                };
                debug!("dispatched {dispatched} pairs");
                buffer.finish(total);
            })?;
        results.dispatcher = Some(dispatcher);
        Ok(results)
    }
}

impl<A> ParallelResults<A> {
    fn next(&mut self) -> Option<PairResult<A>> {
        self.buffer.take_next()
    }
}

impl<A> Drop for ParallelResults<A> {
    fn drop(&mut self) {
        self.buffer.close();
        if let Some(dispatcher) = self.dispatcher.take() {
            let _ = dispatcher.join();
        }
        while let Some(worker) = self.workers.pop() {
            let _ = worker.join();
        }
        debug!("alignment workers stopped");
    }
}

struct Worker<S1, S2, Sc, A> {
    aligner: Arc<PairwiseAligner<Sc>>,
    buffer: Arc<ReorderBuffer<PairResult<A>>>,
    work_rx: Receiver<Job<S1, S2>>,
}

impl<S1, S2, Sc, A> Worker<S1, S2, Sc, A>
where
    S1: Sequence<Symbol = A>,
    S2: Sequence<Symbol = A>,
    Sc: ScoringScheme<A>,
{
    fn run(self) {
        while let Ok(job) = self.work_rx.recv() {
            if self.buffer.is_closed() {
                break;
            }
            let result = self.aligner.align_guarded(job.index, &job.seq1, &job.seq2);
            if !self.buffer.insert(job.index, result) {
                break;
            }
        }
    }
}
