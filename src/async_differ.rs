//! Reconciliation off the owning thread.
//!
//! [`AsyncDiffer`] hands diff requests to one dedicated worker thread and
//! applies the results back on the thread that owns the presented list.
//!
//! # Protocol
//!
//! 1. `submit` moves the coordinator to `Computing(n + 1)`. Leaving `Idle`
//!    pauses the mirror updater: direct notifications are dropped until every
//!    in-flight request has been applied.
//! 2. The request is parked in a single-slot cell. A request still sitting
//!    there unstarted is displaced by the newer one and never computed; a
//!    request the worker already took always runs to completion.
//! 3. The worker reconciles the shared mirror into a private
//!    [`BufferingSink`] and sends the batch back over a FIFO channel.
//! 4. `poll` / `wait_idle` run on the owning thread: call the request's
//!    commit (the consumer swaps its collection), flush the batch into the
//!    presentation, then step the counter down. Reaching `Idle` resumes the
//!    updater.
//!
//! The worker runs requests one at a time, so completions always arrive in
//! submission order.

use crate::config::ReconcilerConfig;
use crate::diff_engine::{self, DiffSummary};
use crate::errors::{ReconcileError, Result};
use crate::mirror::Mirror;
use crate::sink::{BufferingSink, OperationSink, Presentation};
use crate::types::{Item, RequestId, SequenceSource, next_request_id};
use crate::updater::{self, ListChange};
use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Whether background diffs currently own the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// Requests submitted but not yet applied, superseded ones excluded.
    Computing(NonZeroUsize),
}

impl CoordinatorState {
    pub fn running(&self) -> usize {
        match self {
            CoordinatorState::Idle => 0,
            CoordinatorState::Computing(n) => n.get(),
        }
    }

    /// Direct notifications only reach the mirror while idle.
    pub fn updater_enabled(&self) -> bool {
        matches!(self, CoordinatorState::Idle)
    }

    fn begin(self) -> Self {
        match self {
            CoordinatorState::Idle => CoordinatorState::Computing(NonZeroUsize::MIN),
            CoordinatorState::Computing(n) => CoordinatorState::Computing(n.saturating_add(1)),
        }
    }

    fn finish(self) -> Self {
        match self {
            CoordinatorState::Idle => {
                panic!("diff completion without a matching submission")
            }
            CoordinatorState::Computing(n) => match NonZeroUsize::new(n.get() - 1) {
                Some(left) => CoordinatorState::Computing(left),
                None => CoordinatorState::Idle,
            },
        }
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::Computing(n) => write!(f, "computing({})", n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub submitted: u64,
    /// Displaced from the slot before the worker started them.
    pub superseded: u64,
    pub computed: u64,
    pub applied: u64,
}

struct Job<S> {
    request: RequestId,
    source: S,
}

struct Completion {
    request: RequestId,
    outcome: Result<(BufferingSink, DiffSummary)>,
}

struct Slot<S> {
    next: Option<Job<S>>,
    shutdown: bool,
}

/// Single-slot "latest pending request" cell shared with the worker.
struct WorkQueue<S> {
    slot: Mutex<Slot<S>>,
    ready: Condvar,
}

impl<S> WorkQueue<S> {
    fn new() -> Self {
        WorkQueue {
            slot: Mutex::new(Slot {
                next: None,
                shutdown: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Parks `job` as the next to run and returns the unstarted job it displaced.
    fn offer(&self, job: Job<S>) -> Result<Option<Job<S>>> {
        let mut slot = self.slot.lock()?;
        let displaced = slot.next.replace(job);
        self.ready.notify_one();
        Ok(displaced)
    }

    /// Blocks until a job is parked; `None` once shut down.
    fn take(&self) -> Option<Job<S>> {
        let mut slot = self.slot.lock().ok()?;
        loop {
            if slot.shutdown {
                return None;
            }
            if let Some(job) = slot.next.take() {
                return Some(job);
            }
            slot = self.ready.wait(slot).ok()?;
        }
    }

    fn shutdown(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.shutdown = true;
        drop(slot);
        self.ready.notify_all();
    }
}

fn run_worker<S: SequenceSource>(
    queue: Arc<WorkQueue<S>>,
    mirror: Arc<Mutex<Mirror>>,
    config: Arc<ReconcilerConfig>,
    completions: Sender<Completion>,
) {
    while let Some(job) = queue.take() {
        trace!("AsyncDiffer worker: computing {}", job.request);
        let outcome = compute(&mirror, &job.source, &config);
        let completion = Completion {
            request: job.request,
            outcome,
        };
        if completions.send(completion).is_err() {
            break;
        }
    }
    debug!("AsyncDiffer worker: exiting");
}

fn compute<S: SequenceSource>(
    mirror: &Mutex<Mirror>,
    source: &S,
    config: &ReconcilerConfig,
) -> Result<(BufferingSink, DiffSummary)> {
    let mut mirror = mirror.lock()?;
    let mut sink = BufferingSink::new();
    let summary = diff_engine::reconcile(&mut mirror, source, &mut sink, config)?;
    Ok((sink, summary))
}

struct PendingCommit<P: ?Sized> {
    request: RequestId,
    commit: Box<dyn FnOnce(&mut P)>,
}

/// Coordinates background diffs for one presented list of type `P`, fed by
/// new-sequence snapshots of type `S`.
pub struct AsyncDiffer<S, P: ?Sized> {
    mirror: Arc<Mutex<Mirror>>,
    config: Arc<ReconcilerConfig>,
    state: CoordinatorState,
    queue: Arc<WorkQueue<S>>,
    completions: Receiver<Completion>,
    worker: Option<JoinHandle<()>>,
    pending: VecDeque<PendingCommit<P>>,
    stats: CoordinatorStats,
}

impl<S, P> AsyncDiffer<S, P>
where
    S: SequenceSource + Send + 'static,
    P: Presentation + ?Sized,
{
    pub fn new(config: ReconcilerConfig) -> Result<Self> {
        let mirror = Mirror::new(config.growth);
        Self::with_mirror(config, mirror)
    }

    /// Starts from a list that is already presented.
    pub fn with_current<C: SequenceSource + ?Sized>(
        config: ReconcilerConfig,
        current: &C,
    ) -> Result<Self> {
        let mirror = Mirror::from_source(current, config.growth);
        Self::with_mirror(config, mirror)
    }

    fn with_mirror(config: ReconcilerConfig, mirror: Mirror) -> Result<Self> {
        let mirror = Arc::new(Mutex::new(mirror));
        let config = Arc::new(config);
        let queue = Arc::new(WorkQueue::new());
        let (tx, rx) = mpsc::channel();

        let worker = {
            let queue = Arc::clone(&queue);
            let mirror = Arc::clone(&mirror);
            let config = Arc::clone(&config);
            thread::Builder::new()
                .name(config.worker_thread_name.clone())
                .spawn(move || run_worker(queue, mirror, config, tx))?
        };

        Ok(AsyncDiffer {
            mirror,
            config,
            state: CoordinatorState::Idle,
            queue,
            completions: rx,
            worker: Some(worker),
            pending: VecDeque::new(),
            stats: CoordinatorStats::default(),
        })
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Queues a diff against `new`.
    ///
    /// `commit` runs on the owning thread right before the operations are
    /// applied and must swap the consumer's collection to `new`. Until then
    /// the consumer must leave its collection and the presentation alone.
    pub fn submit<F>(&mut self, new: S, commit: F) -> Result<RequestId>
    where
        F: FnOnce(&mut P) + 'static,
    {
        let request = next_request_id();
        // Parked first: a failed offer leaves the coordinator untouched.
        let displaced = self.queue.offer(Job { request, source: new })?;

        if self.state.updater_enabled() {
            debug!("AsyncDiffer: pausing mirror updater");
        }
        self.state = self.state.begin();
        self.stats.submitted += 1;
        self.pending.push_back(PendingCommit {
            request,
            commit: Box::new(commit),
        });

        if let Some(displaced) = displaced {
            // Never started: forget its commit and its share of the counter.
            self.pending.retain(|p| p.request != displaced.request);
            self.state = self.state.finish();
            self.stats.superseded += 1;
            debug!("AsyncDiffer: {} superseded by {}", displaced.request, request);
        }

        debug!("AsyncDiffer: submitted {} ({})", request, self.state);
        Ok(request)
    }

    /// Applies every completion that is already available without blocking.
    pub fn poll(&mut self, presentation: &mut P) -> Result<usize> {
        let mut applied = 0;
        loop {
            match self.completions.try_recv() {
                Ok(completion) => {
                    self.complete(completion, presentation)?;
                    applied += 1;
                }
                Err(TryRecvError::Empty) => return Ok(applied),
                Err(TryRecvError::Disconnected) => {
                    if self.state.updater_enabled() {
                        return Ok(applied);
                    }
                    return Err(self.abandon_pending());
                }
            }
        }
    }

    /// Blocks until every submitted request has been applied.
    pub fn wait_idle(&mut self, presentation: &mut P) -> Result<usize> {
        let mut applied = 0;
        while !self.state.updater_enabled() {
            let completion = match self.completions.recv() {
                Ok(completion) => completion,
                Err(_) => return Err(self.abandon_pending()),
            };
            self.complete(completion, presentation)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// The worker is gone: nothing in flight will ever complete, so drop
    /// the owed commits and hand the mirror back to the updater.
    fn abandon_pending(&mut self) -> ReconcileError {
        warn!(
            "AsyncDiffer: worker disconnected, abandoning {} request(s)",
            self.pending.len()
        );
        self.pending.clear();
        self.state = CoordinatorState::Idle;
        ReconcileError::WorkerDisconnected
    }

    fn complete(&mut self, completion: Completion, presentation: &mut P) -> Result<()> {
        self.stats.computed += 1;
        let pending = self.pending.pop_front();
        debug_assert_eq!(
            pending.as_ref().map(|p| p.request),
            Some(completion.request),
            "completions must arrive in submission order"
        );

        let outcome = match completion.outcome {
            Ok((mut batch, summary)) => {
                if let Some(pending) = pending {
                    (pending.commit)(&mut *presentation);
                }
                batch.flush(presentation);
                self.stats.applied += 1;
                debug!(
                    "AsyncDiffer: applied {} ({} operation(s))",
                    completion.request, summary.operations
                );
                Ok(())
            }
            Err(err) => {
                warn!("AsyncDiffer: {} failed: {}", completion.request, err);
                Err(err)
            }
        };

        self.state = self.state.finish();
        if self.state.updater_enabled() {
            debug!("AsyncDiffer: resuming mirror updater");
        }
        outcome
    }

    /// Records a change the consumer applied directly to the presented list.
    ///
    /// Dropped while diffs are in flight; returns whether it was applied.
    pub fn notify<C: SequenceSource + ?Sized>(&mut self, change: ListChange, current: &C) -> Result<bool> {
        if !self.state.updater_enabled() {
            warn!("AsyncDiffer: dropping {:?} while {}", change, self.state);
            return Ok(false);
        }
        let mut mirror = self.mirror.lock()?;
        updater::apply_change(&mut mirror, change, current);
        Ok(true)
    }

    /// Reconciles synchronously on the calling thread.
    ///
    /// Fails with [`ReconcileError::MirrorBusy`] while background diffs own
    /// the mirror.
    pub fn diff_now<C, K>(&mut self, new: &C, sink: &mut K) -> Result<DiffSummary>
    where
        C: SequenceSource + ?Sized,
        K: OperationSink + ?Sized,
    {
        if let CoordinatorState::Computing(running) = self.state {
            return Err(ReconcileError::MirrorBusy {
                running: running.get(),
            });
        }
        let mut mirror = self.mirror.lock()?;
        diff_engine::reconcile(&mut mirror, new, sink, &self.config)
    }

    /// Copy of the mirror's current contents.
    pub fn mirror_snapshot(&self) -> Result<Vec<Item>> {
        Ok(self.mirror.lock()?.to_vec())
    }
}

impl<S, P: ?Sized> Drop for AsyncDiffer<S, P> {
    fn drop(&mut self) {
        self.queue.shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("AsyncDiffer: worker panicked");
            }
        }
    }
}
