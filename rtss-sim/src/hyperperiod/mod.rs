//! Hyperperiod calculation for a periodic task set.
//!
//! The hyperperiod is the Least Common Multiple of all periodic task periods:
//! the smallest window after which the whole schedule repeats.  Aperiodic and
//! idle tasks do not contribute.
//!
//! Periods are reduced at nanosecond resolution, so any mix of millisecond
//! and sub-millisecond periods is exact.
//!
//! | Failure | Variant |
//! |---|---|
//! | no periodic task with a non-zero period | [`HyperperiodError::NoValidPeriods`] |
//! | LCM does not fit in `u64` nanoseconds | [`HyperperiodError::Overflow`] |
//! | LCM exceeds the configured limit | [`HyperperiodError::TooLarge`] |

pub mod math;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::task::Task;
use crate::time::{self, TimeDuration};
use math::lcm_all;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Default upper limit on the hyperperiod: one hour.
pub const DEFAULT_HYPERPERIOD_LIMIT: TimeDuration = Duration::from_secs(3_600);

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, PartialEq, Eq)]
pub enum HyperperiodError {
    /// No periodic task with a non-zero period.
    NoValidPeriods,

    /// LCM calculation overflowed (operands in nanoseconds).
    Overflow { a: u64, b: u64 },

    /// The hyperperiod exceeded the configured limit.
    TooLarge {
        value: TimeDuration,
        limit: TimeDuration,
    },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoValidPeriods => {
                write!(f, "no periodic task with a valid (non-zero) period")
            }
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}ns, {b}ns)")
            }
            HyperperiodError::TooLarge { value, limit } => write!(
                f,
                "hyperperiod {}ms ({:.1}s) exceeds limit {}ms ({:.1}s)",
                time::to_ms(*value),
                value.as_secs_f64(),
                time::to_ms(*limit),
                limit.as_secs_f64(),
            ),
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Result of one hyperperiod calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperperiodInfo {
    pub hyperperiod: TimeDuration,

    /// Distinct periods in the task set, ascending.
    pub unique_periods: Vec<TimeDuration>,

    /// Number of periodic tasks that contributed.
    pub task_count: usize,
}

// ── HyperperiodCalculator ─────────────────────────────────────────────────────

/// Computes the hyperperiod of a task list, bounded by a configurable limit.
///
/// # Example
/// ```rust
/// use rtss_sim::hyperperiod::HyperperiodCalculator;
/// use rtss_sim::task::Task;
/// use rtss_sim::time::from_ms;
///
/// let tasks = vec![
///     Task::periodic(from_ms(0), from_ms(4), from_ms(1), None),
///     Task::periodic(from_ms(0), from_ms(6), from_ms(2), None),
/// ];
/// let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
/// assert_eq!(info.hyperperiod, from_ms(12));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HyperperiodCalculator {
    limit: TimeDuration,
}

impl HyperperiodCalculator {
    /// Calculator with the default one-hour limit.
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_HYPERPERIOD_LIMIT,
        }
    }

    pub fn with_limit(limit: TimeDuration) -> Self {
        Self { limit }
    }

    /// Calculate the hyperperiod of the periodic tasks in `tasks`.
    ///
    /// # Errors
    /// See the module-level table.
    pub fn calculate(&self, tasks: &[Task]) -> Result<HyperperiodInfo, HyperperiodError> {
        let periods: Vec<TimeDuration> = tasks
            .iter()
            .filter_map(Task::period)
            .filter(|p| !p.is_zero())
            .collect();

        if periods.is_empty() {
            warn!("No periodic tasks with valid periods found");
            return Err(HyperperiodError::NoValidPeriods);
        }

        let unique_periods: Vec<TimeDuration> = {
            let mut v = periods.clone();
            v.sort_unstable();
            v.dedup();
            v
        };

        let nanos: Vec<u64> = unique_periods.iter().map(|p| as_nanos_u64(*p)).collect();
        let hyperperiod = Duration::from_nanos(lcm_all(&nanos)?);

        if hyperperiod > self.limit {
            warn!(
                hyperperiod_ms = time::to_ms(hyperperiod),
                limit_ms = time::to_ms(self.limit),
                "Hyperperiod exceeds configured limit"
            );
            return Err(HyperperiodError::TooLarge {
                value: hyperperiod,
                limit: self.limit,
            });
        }

        info!(
            task_count = periods.len(),
            unique_count = unique_periods.len(),
            hyperperiod_ms = time::to_ms(hyperperiod),
            "Calculated hyperperiod"
        );
        for p in &unique_periods {
            debug!(period_ms = time::to_ms(*p), "  unique period");
        }

        Ok(HyperperiodInfo {
            hyperperiod,
            unique_periods,
            task_count: periods.len(),
        })
    }
}

impl Default for HyperperiodCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Nanoseconds as `u64`, saturating for durations beyond ~584 years.
fn as_nanos_u64(d: TimeDuration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::from_ms;

    fn periodic(period_ms: u64) -> Task {
        Task::periodic(from_ms(0), from_ms(period_ms), from_ms(1), None)
    }

    #[test]
    fn hyperperiod_of_two_periods() {
        let tasks = vec![periodic(4), periodic(6)];
        let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
        assert_eq!(info.hyperperiod, from_ms(12));
        assert_eq!(info.task_count, 2);
    }

    #[test]
    fn hyperperiod_of_classic_four_task_set() {
        let tasks = vec![periodic(5), periodic(6), periodic(10), periodic(15)];
        let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
        assert_eq!(info.hyperperiod, from_ms(30));
    }

    #[test]
    fn aperiodic_tasks_do_not_contribute() {
        let tasks = vec![
            periodic(4),
            Task::aperiodic(from_ms(3), from_ms(7)),
            periodic(8),
        ];
        let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
        assert_eq!(info.hyperperiod, from_ms(8));
        assert_eq!(info.task_count, 2);
    }

    #[test]
    fn sub_millisecond_periods_are_exact() {
        let tasks = vec![
            Task::periodic(from_ms(0), Duration::from_micros(1_500), from_ms(0), None),
            periodic(2),
        ];
        let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
        assert_eq!(info.hyperperiod, from_ms(6));
    }

    #[test]
    fn unique_periods_sorted_and_deduped() {
        let tasks = vec![periodic(5), periodic(1), periodic(5), periodic(2)];
        let info = HyperperiodCalculator::new().calculate(&tasks).unwrap();
        assert_eq!(info.unique_periods, vec![from_ms(1), from_ms(2), from_ms(5)]);
        assert_eq!(info.task_count, 4);
    }

    #[test]
    fn no_periodic_tasks_is_an_error() {
        let tasks = vec![Task::aperiodic(from_ms(0), from_ms(1))];
        let err = HyperperiodCalculator::new().calculate(&tasks).unwrap_err();
        assert_eq!(err, HyperperiodError::NoValidPeriods);

        let err = HyperperiodCalculator::new().calculate(&[]).unwrap_err();
        assert_eq!(err, HyperperiodError::NoValidPeriods);
    }

    #[test]
    fn zero_periods_are_ignored() {
        let tasks = vec![periodic(0)];
        let err = HyperperiodCalculator::new().calculate(&tasks).unwrap_err();
        assert_eq!(err, HyperperiodError::NoValidPeriods);
    }

    #[test]
    fn exceeding_limit_returns_too_large() {
        let tasks = vec![periodic(1_000), periodic(7_000)];
        let err = HyperperiodCalculator::with_limit(from_ms(5_000))
            .calculate(&tasks)
            .unwrap_err();
        assert!(matches!(err, HyperperiodError::TooLarge { value, .. } if value == from_ms(7_000)));
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let tasks = vec![periodic(5_000)];
        let info = HyperperiodCalculator::with_limit(from_ms(5_000))
            .calculate(&tasks)
            .unwrap();
        assert_eq!(info.hyperperiod, from_ms(5_000));
    }
}
