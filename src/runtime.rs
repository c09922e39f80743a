//! Background solver runtime.
//!
//! Solves can take long enough to stall an interactive caller, so the
//! runtime runs them on a small pool of named worker threads fed by a bounded
//! queue. Every submission is tagged with a generation; a newer submission
//! supersedes older ones. Superseded work still runs to completion, but its
//! result is discarded when joined.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error};

use crate::error::{ExecutionError, GagError, GagResult};
use crate::solver::{self, FillOption, FillRequest};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of solver threads.
    pub workers: usize,
    /// Maximum queued solves.
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 16,
        }
    }
}

type SolveFn = fn(&FillRequest) -> Vec<FillOption>;

enum Job {
    Solve {
        request: Box<FillRequest>,
        generation: u64,
        solve: SolveFn,
        reply: Sender<Vec<FillOption>>,
    },

    #[cfg(test)]
    Block {
        started: Sender<()>,
        release: Receiver<()>,
    },
}

fn run_solve(request: &FillRequest, generation: u64, solve: SolveFn) -> Vec<FillOption> {
    match panic::catch_unwind(AssertUnwindSafe(|| solve(request))) {
        Ok(options) => {
            debug!(generation, options = options.len(), "solve finished");
            options
        }
        Err(_) => {
            error!(generation, "solve panicked; returning no options");
            Vec::new()
        }
    }
}

struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(workers: usize, queue_capacity: usize) -> GagResult<Self> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("gagsolve-worker-{idx}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        match job {
                            Job::Solve {
                                request,
                                generation,
                                solve,
                                reply,
                            } => {
                                let options = run_solve(&request, generation, solve);
                                let _ = reply.send(options);
                            }

                            #[cfg(test)]
                            Job::Block { started, release } => {
                                let _ = started.send(());
                                let _ = release.recv();
                            }
                        }
                    }
                })
                .map_err(|e| GagError::internal(format!("failed to spawn solver worker: {e}")))?;
            handles.push(handle);
        }

        Ok(Self {
            tx: Some(tx),
            workers: handles,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> Result<(), ExecutionError> {
        let Some(tx) = &self.tx else {
            return Err(ExecutionError::Disconnected);
        };
        tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            },
            TrySendError::Disconnected(_) => ExecutionError::Disconnected,
        })
    }

    fn shutdown(&mut self) {
        // Workers drain the queue, then see the closed channel and exit.
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// A pending solve.
#[derive(Debug)]
pub struct SolveHandle {
    generation: u64,
    latest: Arc<AtomicU64>,
    rx: Receiver<Vec<FillOption>>,
}

impl SolveHandle {
    /// Generation of this submission.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer solve has been submitted since this one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    fn accept(&self, options: Vec<FillOption>) -> GagResult<Vec<FillOption>> {
        let latest = self.latest.load(Ordering::SeqCst);
        if latest != self.generation {
            return Err(ExecutionError::Superseded {
                generation: self.generation,
                latest,
            }
            .into());
        }
        Ok(options)
    }

    /// Waits for the solve to finish.
    ///
    /// # Errors
    ///
    /// `Superseded` if a newer solve was submitted, `Disconnected` if the
    /// worker went away.
    pub fn join(self) -> GagResult<Vec<FillOption>> {
        let options = self.rx.recv().map_err(|_| ExecutionError::Disconnected)?;
        self.accept(options)
    }

    /// Waits for the solve to finish, up to `timeout`.
    ///
    /// # Errors
    ///
    /// As [`SolveHandle::join`], plus `Timeout`.
    pub fn join_timeout(self, timeout: Duration) -> GagResult<Vec<FillOption>> {
        let options = self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => ExecutionError::Disconnected,
        })?;
        self.accept(options)
    }
}

/// Runs solves off the caller's thread.
pub struct SolverRuntime {
    pool: WorkerPool,
    next: AtomicU64,
    latest: Arc<AtomicU64>,
}

impl SolverRuntime {
    /// Starts the worker threads.
    ///
    /// # Errors
    ///
    /// `Internal` if a worker thread cannot be spawned.
    pub fn new(config: RuntimeConfig) -> GagResult<Self> {
        Ok(Self {
            pool: WorkerPool::start(config.workers, config.queue_capacity)?,
            next: AtomicU64::new(0),
            latest: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Queues a solve; it supersedes every earlier submission.
    ///
    /// # Errors
    ///
    /// `QueueFull` when the queue is at capacity. A rejected submission does
    /// not supersede anything.
    pub fn submit(&self, request: FillRequest) -> GagResult<SolveHandle> {
        self.submit_with(request, solver::solve)
    }

    fn submit_with(&self, request: FillRequest, solve: SolveFn) -> GagResult<SolveHandle> {
        let generation = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let (reply, rx) = bounded::<Vec<FillOption>>(1);
        self.pool.try_submit(Job::Solve {
            request: Box::new(request),
            generation,
            solve,
            reply,
        })?;
        self.latest.fetch_max(generation, Ordering::SeqCst);

        Ok(SolveHandle {
            generation,
            latest: Arc::clone(&self.latest),
            rx,
        })
    }

    /// Submits and waits.
    ///
    /// # Errors
    ///
    /// As [`SolverRuntime::submit`] and [`SolveHandle::join`].
    pub fn solve(&self, request: FillRequest) -> GagResult<Vec<FillOption>> {
        self.submit(request)?.join()
    }

    /// Generation of the most recent accepted submission.
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn block_worker(&self) -> Sender<()> {
        let (started_tx, started_rx) = bounded::<()>(1);
        let (release_tx, release_rx) = bounded::<()>(1);
        self.pool
            .try_submit(Job::Block {
                started: started_tx,
                release: release_rx,
            })
            .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        release_tx
    }
}

impl Drop for SolverRuntime {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}
