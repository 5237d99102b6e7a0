use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::components::find_components;
use crate::config::SolverConfig;
use crate::error::SubmarineError;
use crate::grid::Grid;
use crate::pool::TaskPool;
use crate::Component;

// upper bound on one coordinator wait; a panicked validator never publishes, so the pool is re-checked this often
const OUTCOME_POLL: Duration = Duration::from_millis(100);

/// Verdict on one component, tagged with the component's position in the list being validated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct ValidationOutcome {
    component: usize,
    valid: bool,
}

/// Outcomes published by validation tasks, waiting for the coordinator to drain them.
struct OutcomeQueue {
    pending: Mutex<VecDeque<ValidationOutcome>>,
    published: Condvar,
}

impl OutcomeQueue {
    fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            published: Condvar::new(),
        }
    }

    fn publish(&self, outcome: ValidationOutcome) {
        let mut pending = self.pending.lock().expect("outcome queue mutex poisoned");
        pending.push_back(outcome);
        self.published.notify_one();
    }
}

/// Whether `component` is a submarine: more than one cell, exactly filling its own bounding rectangle.
pub fn is_valid_submarine(component: &Component) -> bool {
    if component.len() <= 1 {
        return false;
    }

    let rows = component.iter().map(|index| index.row).minmax().into_option();
    let cols = component.iter().map(|index| index.col).minmax().into_option();
    let (Some((top, bottom)), Some((left, right))) = (rows, cols) else {
        return false;
    };

    // members are distinct and all inside the rectangle, so it is filled exactly when the counts agree
    (bottom - top + 1) * (right - left + 1) == component.len()
}

/// Count the submarines in `grid`, failing as soon as any component is not one.
pub(crate) fn count_submarines(grid: &Arc<Grid>, config: &SolverConfig) -> Result<usize, SubmarineError> {
    let components = find_components(grid, config)?;
    validate_all(components, config, is_valid_submarine)
}

/// Check every component with `verdict`, returning how many there are if all pass.
///
/// Components are validated concurrently, one task each. The calling thread coordinates: it drains verdicts as they
/// are published and, on the first invalid one, cancels whatever validation has not yet run.
fn validate_all<V>(components: Vec<Component>, config: &SolverConfig, verdict: V) -> Result<usize, SubmarineError>
where
    V: Fn(&Component) -> bool + Send + Sync + 'static,
{
    let total = components.len();
    debug!(total, "validating submarines");
    if total == 0 {
        return Ok(0);
    }

    let verdict = Arc::new(verdict);
    let outcomes = Arc::new(OutcomeQueue::new());
    let pool = TaskPool::new("submarines", config)?;
    let handle = pool.handle().clone();

    for (component, cells) in components.into_iter().enumerate() {
        let verdict = Arc::clone(&verdict);
        let outcomes = Arc::clone(&outcomes);
        let inner = handle.clone();
        handle.execute(move || {
            if inner.is_cancelled() {
                return;
            }
            outcomes.publish(ValidationOutcome { component, valid: (*verdict)(&cells) });
        })?;
    }

    let mut seen = 0;
    let mut pending = outcomes.pending.lock().expect("outcome queue mutex poisoned");
    // a wake may carry any number of outcomes, including none
    while seen < total {
        let drained = pending.drain(..).collect_vec();
        for outcome in drained {
            seen += 1;
            trace!(component = outcome.component, valid = outcome.valid, seen, "validation outcome");

            if !outcome.valid {
                // validators still running publish on their way out
                drop(pending);
                warn!(component = outcome.component, "invalid submarine, abandoning validation");
                handle.cancel();
                pool.shutdown()?;
                return Err(SubmarineError::InvalidSubmarineMatrix);
            }
        }

        if seen == total {
            break;
        }
        if let Some(failure) = handle.failure() {
            drop(pending);
            handle.cancel();
            pool.shutdown()?;
            return Err(failure.into());
        }

        pending = outcomes.published
            .wait_timeout(pending, OUTCOME_POLL)
            .expect("outcome queue mutex poisoned")
            .0;
    }
    drop(pending);

    pool.shutdown()?;
    debug!(total, "all components are submarines");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::iter;
    use std::num::NonZero;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::error::ConcurrencyFailure;
    use crate::index::GridIndex;

    fn config(workers: usize) -> SolverConfig {
        SolverConfig::default()
            .workers(NonZero::new(workers).expect("nonzero workers"))
            .shutdown_poll(Duration::from_millis(50))
    }

    // a two-cell submarine on its own row, or a lone cell when `valid` is false
    fn submarine(row: usize, valid: bool) -> Component {
        let cells = if valid { 0..2 } else { 0..1 };
        cells.map(|col| GridIndex::new(2 * row, col)).collect()
    }

    #[test]
    fn invalid_verdict_cancels_queued_validation() {
        let components = iter::once(submarine(0, false))
            .chain((1..=100).map(|row| submarine(row, true)))
            .collect_vec();
        let checked = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&checked);
        let started = Instant::now();
        let result = validate_all(components, &config(1), move |component| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            is_valid_submarine(component)
        });

        assert_eq!(result, Err(SubmarineError::InvalidSubmarineMatrix));
        // a full run takes a second; cancelling leaves at most the validation in flight
        assert!(started.elapsed() < Duration::from_millis(500), "took {:?}", started.elapsed());
        assert!(checked.load(Ordering::SeqCst) < 100, "checked {} components", checked.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_validator_surfaces_as_concurrency_failure() {
        let components = (0..8).map(|row| submarine(row, true)).collect_vec();

        let result = validate_all(components, &config(2), |component| {
            if component.contains(&GridIndex::new(6, 0)) {
                panic!("validator gave up");
            }
            true
        });

        assert_eq!(
            result,
            Err(SubmarineError::Concurrency(ConcurrencyFailure::TaskPanicked("validator gave up".to_string())))
        );
    }

    #[test]
    fn every_verdict_counted() {
        let components = (0..50).map(|row| submarine(row, true)).collect_vec();
        assert_eq!(validate_all(components, &config(4), is_valid_submarine), Ok(50));
    }
}
