use std::num::NonZero;
use std::thread;
use std::time::Duration;

/// Tuning knobs for the worker pools a [`GridSolver`](crate::GridSolver) creates, one pool per call.
///
/// Setters chain, as on the builders:
///
/// ```
/// # use std::num::NonZero;
/// # use std::time::Duration;
/// # use kingsgrid::SolverConfig;
/// let config = SolverConfig::default()
///     .workers(NonZero::new(2).unwrap())
///     .shutdown_poll(Duration::from_secs(5));
/// assert_eq!(config.worker_count(), 2);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SolverConfig {
    pub(crate) workers: NonZero<usize>,
    pub(crate) shutdown_poll: Duration,
    pub(crate) stack_size: Option<usize>,
}

impl SolverConfig {
    /// Default wait between checks while a pool drains during shutdown.
    pub const DEFAULT_SHUTDOWN_POLL: Duration = Duration::from_secs(30);

    /// Number of worker threads per pool.
    pub fn workers(mut self, workers: NonZero<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// How long shutdown waits before re-checking whether accepted work has drained.
    /// Shutdown keeps retrying; this only bounds each individual wait.
    pub fn shutdown_poll(mut self, poll: Duration) -> Self {
        self.shutdown_poll = poll;
        self
    }

    /// Worker thread stack size in bytes, or `None` for the platform default.
    pub fn stack_size(mut self, stack_size: Option<usize>) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// See [`Self::workers`].
    pub fn worker_count(&self) -> usize {
        self.workers.get()
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN),
            shutdown_poll: Self::DEFAULT_SHUTDOWN_POLL,
            stack_size: None,
        }
    }
}
