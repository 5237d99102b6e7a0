//! A bounded worker pool with work-stealing deques, cooperative cancellation and graceful shutdown.
//!
//! Every operation that runs concurrently creates one [`TaskPool`], submits work through its [`PoolHandle`], and shuts it down before returning.
//! Work submitted from outside lands on a shared injector queue. A running task forks children through its [`Scope`];
//! they go onto the running worker's own LIFO deque, so each worker walks its part of a task tree depth first
//! while idle workers steal the oldest, shallowest branches.
//!
//! No task ever blocks on another. A task tree is complete when the pool has drained, which is what [`TaskPool::shutdown`] waits for.

use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_deque::{Injector, Steal, Stealer, Worker};
use itertools::Itertools;
use tracing::{debug, error, trace, warn};

use crate::config::SolverConfig;
use crate::error::ConcurrencyFailure;

type Job = Box<dyn FnOnce(&Scope<'_>) -> Result<(), ConcurrencyFailure> + Send + 'static>;

struct Ledger {
    outstanding: usize,
    accepting: bool,
    stopping: bool,
}

struct Shared {
    name: &'static str,
    injector: Injector<Job>,
    stealers: Vec<Stealer<Job>>,
    // every push onto any queue happens under this lock, so an idle worker re-checking the queues under it cannot miss one
    ledger: Mutex<Ledger>,
    work: Condvar,
    drained: Condvar,
    cancelled: AtomicBool,
    failure: Mutex<Option<ConcurrencyFailure>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().expect("pool ledger mutex poisoned")
    }

    fn enqueue(&self, job: Job) -> Result<(), ConcurrencyFailure> {
        {
            let mut ledger = self.lock();
            if !ledger.accepting {
                return Err(ConcurrencyFailure::Rejected);
            }
            ledger.outstanding += 1;
            self.injector.push(job);
        }
        self.work.notify_one();
        Ok(())
    }

    // forks belong to work already accepted, so they are taken even while shutting down
    fn enqueue_local(&self, job: Job, local: &Worker<Job>) {
        if self.cancelled.load(Ordering::Acquire) {
            trace!(pool = self.name, "dropping fork from cancelled pool");
            return;
        }

        {
            let mut ledger = self.lock();
            ledger.outstanding += 1;
            local.push(job);
        }
        self.work.notify_one();
    }

    fn find_job(&self, local: &Worker<Job>) -> Option<Job> {
        local.pop().or_else(|| {
            iter::repeat_with(|| {
                self.injector
                    .steal_batch_and_pop(local)
                    .or_else(|| self.stealers.iter().map(Stealer::steal).collect())
            })
            .find(|steal| !steal.is_retry())
            .and_then(Steal::success)
        })
    }

    fn has_queued(&self) -> bool {
        !self.injector.is_empty() || self.stealers.iter().any(|stealer| !stealer.is_empty())
    }

    fn run(&self, job: Job, scope: &Scope<'_>) {
        if self.cancelled.load(Ordering::Acquire) {
            trace!(pool = self.name, "dropping job from cancelled pool");
            drop(job);
        } else if let Err(failure) = job(scope) {
            error!(pool = self.name, %failure, "task failed");
            self.failure.lock().expect("pool failure mutex poisoned").get_or_insert(failure);
        }
        self.finish_one();
    }

    fn discard_queued(&self) {
        loop {
            match self.injector.steal().or_else(|| self.stealers.iter().map(Stealer::steal).collect()) {
                Steal::Success(job) => {
                    drop(job);
                    self.finish_one();
                }
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }
    }

    fn finish_one(&self) {
        let mut ledger = self.lock();
        ledger.outstanding -= 1;
        if ledger.outstanding == 0 {
            self.drained.notify_all();
        }
    }
}

fn catch(work: impl FnOnce()) -> Result<(), ConcurrencyFailure> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| ConcurrencyFailure::from_panic(&*payload))
}

fn work_loop(local: Worker<Job>, shared: Arc<Shared>) {
    let scope = Scope { local: &local, shared: &shared };

    loop {
        if let Some(job) = shared.find_job(&local) {
            shared.run(job, &scope);
            continue;
        }

        let mut ledger = shared.lock();
        while !shared.has_queued() {
            if ledger.stopping {
                return;
            }
            ledger = shared.work.wait(ledger).expect("pool ledger mutex poisoned");
        }
    }
}

/// Handed to every running task, for forking further tasks onto the same worker.
pub(crate) struct Scope<'a> {
    local: &'a Worker<Job>,
    shared: &'a Shared,
}

impl Scope<'_> {
    /// Fork `work` onto the current worker. It runs before anything this worker took on earlier, unless another worker steals it.
    pub(crate) fn spawn<F>(&self, work: F)
    where
        F: FnOnce(&Scope<'_>) + Send + 'static,
    {
        self.shared.enqueue_local(Box::new(move |scope: &Scope<'_>| catch(|| work(scope))), self.local);
    }
}

/// Submits work to a [`TaskPool`]. Clones refer to the same pool.
#[derive(Clone)]
pub(crate) struct PoolHandle {
    shared: Arc<Shared>,
}

impl PoolHandle {
    /// Queue `work`. A panic in `work` is recorded and reported by [`Self::failure`].
    pub(crate) fn execute<F>(&self, work: F) -> Result<(), ConcurrencyFailure>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.enqueue(Box::new(move |_: &Scope<'_>| catch(work)))
    }

    /// Queue `work` as the root of a task tree; it and its forks may [`Scope::spawn`] more.
    pub(crate) fn spawn<F>(&self, work: F) -> Result<(), ConcurrencyFailure>
    where
        F: FnOnce(&Scope<'_>) + Send + 'static,
    {
        self.shared.enqueue(Box::new(move |scope: &Scope<'_>| catch(|| work(scope))))
    }

    /// Stop running queued work. Jobs already running finish; everything still queued is dropped unrun, and so is anything they fork.
    pub(crate) fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::AcqRel) {
            warn!(pool = self.shared.name, "cancelling outstanding tasks");
        }
        self.shared.discard_queued();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// The first failure any task in this pool has reported, if any.
    pub(crate) fn failure(&self) -> Option<ConcurrencyFailure> {
        self.shared.failure.lock().expect("pool failure mutex poisoned").clone()
    }
}

/// A fixed set of named worker threads, each with its own deque, sharing one injector.
///
/// Call [`Self::shutdown`] to drain accepted work and join the workers.
/// Dropping a pool without shutting it down cancels whatever is still queued and detaches the workers.
pub(crate) struct TaskPool {
    handle: PoolHandle,
    workers: Vec<JoinHandle<()>>,
    shutdown_poll: Duration,
}

impl TaskPool {
    pub(crate) fn new(name: &'static str, config: &SolverConfig) -> Result<Self, ConcurrencyFailure> {
        let locals = (0..config.worker_count()).map(|_| Worker::new_lifo()).collect_vec();
        let shared = Arc::new(Shared {
            name,
            injector: Injector::new(),
            stealers: locals.iter().map(Worker::stealer).collect(),
            ledger: Mutex::new(Ledger { outstanding: 0, accepting: true, stopping: false }),
            work: Condvar::new(),
            drained: Condvar::new(),
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
        });

        let mut pool = Self {
            handle: PoolHandle { shared },
            workers: Vec::with_capacity(locals.len()),
            shutdown_poll: config.shutdown_poll,
        };

        for (id, local) in locals.into_iter().enumerate() {
            let mut builder = thread::Builder::new().name(format!("{name}-{id}"));
            if let Some(size) = config.stack_size {
                builder = builder.stack_size(size);
            }

            let shared = Arc::clone(&pool.handle.shared);
            match builder.spawn(move || work_loop(local, shared)) {
                Ok(worker) => pool.workers.push(worker),
                // the partially built pool's Drop stops whatever did start
                Err(e) => return Err(ConcurrencyFailure::WorkerLost(e.to_string())),
            }
        }

        debug!(pool = name, workers = pool.workers.len(), "started task pool");
        Ok(pool)
    }

    pub(crate) fn handle(&self) -> &PoolHandle {
        &self.handle
    }

    /// Stop accepting submissions, wait for accepted work and everything it forks to finish, then join the workers.
    ///
    /// Waits in intervals of the configured shutdown poll, retrying until the queues have drained.
    pub(crate) fn shutdown(mut self) -> Result<(), ConcurrencyFailure> {
        let shared = Arc::clone(&self.handle.shared);
        {
            let mut ledger = shared.lock();
            ledger.accepting = false;
            while ledger.outstanding > 0 {
                let (guard, wait) = shared.drained
                    .wait_timeout(ledger, self.shutdown_poll)
                    .expect("pool ledger mutex poisoned");
                ledger = guard;
                if wait.timed_out() && ledger.outstanding > 0 {
                    debug!(pool = shared.name, outstanding = ledger.outstanding, "still draining, waiting again");
                }
            }
            ledger.stopping = true;
        }
        shared.work.notify_all();

        for worker in self.workers.drain(..) {
            worker.join().map_err(|payload| ConcurrencyFailure::WorkerLost(
                ConcurrencyFailure::from_panic(&*payload).to_string()))?;
        }

        debug!(pool = shared.name, "task pool shut down");
        Ok(())
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        let shared = &self.handle.shared;
        {
            let mut ledger = shared.lock();
            if ledger.stopping {
                return;
            }
            ledger.accepting = false;
            ledger.stopping = true;
        }

        self.handle.cancel();
        shared.work.notify_all();
        trace!(pool = shared.name, "task pool dropped without shutdown, workers detached");
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn config(workers: usize) -> SolverConfig {
        SolverConfig::default()
            .workers(NonZero::new(workers).expect("nonzero workers"))
            .shutdown_poll(Duration::from_millis(50))
    }

    fn fork(scope: &Scope<'_>, depth: u32, leaves: Arc<AtomicUsize>) {
        if depth == 0 {
            leaves.fetch_add(1, Ordering::SeqCst);
            return;
        }

        for _ in 0..2 {
            let leaves = Arc::clone(&leaves);
            scope.spawn(move |scope| fork(scope, depth - 1, leaves));
        }
    }

    #[test]
    fn accepted_work_finishes_before_shutdown_returns() {
        let pool = TaskPool::new("test", &config(4)).expect("pool starts");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            let counter = Arc::clone(&counter);
            pool.handle().execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }).expect("pool accepts work");
        }

        pool.shutdown().expect("clean shutdown");
        assert_eq!(counter.load(Ordering::SeqCst), 200);
    }

    #[test]
    fn wide_task_tree_completes_on_a_single_worker() {
        let pool = TaskPool::new("test", &config(1)).expect("pool starts");
        let leaves = Arc::new(AtomicUsize::new(0));

        let root = Arc::clone(&leaves);
        pool.handle().spawn(move |scope| fork(scope, 16, root)).expect("pool accepts work");

        pool.shutdown().expect("clean shutdown");
        assert_eq!(leaves.load(Ordering::SeqCst), 1 << 16);
    }

    #[test]
    fn forks_are_accepted_while_shutting_down() {
        let pool = TaskPool::new("test", &config(4)).expect("pool starts");
        let leaves = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let root = Arc::clone(&leaves);
            pool.handle().spawn(move |scope| fork(scope, 10, root)).expect("pool accepts work");
        }

        // shutdown begins while the trees are still forking
        pool.shutdown().expect("clean shutdown");
        assert_eq!(leaves.load(Ordering::SeqCst), 4 << 10);
    }

    #[test]
    fn panicking_task_surfaces_as_failure() {
        let pool = TaskPool::new("test", &config(2)).expect("pool starts");
        let handle = pool.handle().clone();

        handle.execute(|| panic!("boom")).expect("pool accepts work");
        pool.shutdown().expect("panics do not take workers down");

        assert_eq!(handle.failure(), Some(ConcurrencyFailure::TaskPanicked("boom".to_string())));
    }

    #[test]
    fn work_queued_after_cancel_never_runs() {
        let pool = TaskPool::new("test", &config(2)).expect("pool starts");
        let counter = Arc::new(AtomicUsize::new(0));
        pool.handle().cancel();
        assert!(pool.handle().is_cancelled());

        let ran = Arc::clone(&counter);
        pool.handle().execute(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        }).expect("pool still accepts work");

        pool.shutdown().expect("clean shutdown");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn submissions_after_shutdown_are_rejected() {
        let pool = TaskPool::new("test", &config(2)).expect("pool starts");
        let handle = pool.handle().clone();
        pool.shutdown().expect("clean shutdown");

        assert_eq!(handle.execute(|| {}), Err(ConcurrencyFailure::Rejected));
    }
}
