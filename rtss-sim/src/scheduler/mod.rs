//! Scheduler engines for the simulator.
//!
//! One engine per dispatch style, all driving the same caller-owned task list
//! through a [`Dispatcher`](dispatch::Dispatcher):
//!
//! | Engine | Input | Dispatch |
//! |---|---|---|
//! | [`TableDrivenScheduler`] | TASK_BASED [`TaskTable`](crate::table::TaskTable) | entry by entry, reset on the `-1` marker |
//! | [`CyclicExecutiveScheduler`] | FRAME_BASED [`TaskTable`](crate::table::TaskTable) | frame by frame, reset when the frame cursor wraps |
//! | [`PriorityBasedScheduler`] | task list + [`PriorityPolicy`] / comparator | highest-priority ready task, run to completion |
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Time | Virtual clock owned by the run; no wall-clock reads |
//! | Idle task | Owned by each run's dispatcher, never shared |
//! | Policies | One priority engine with an injected comparator |
//! | Preemption | None: a selected task runs to completion |
//! | Failures | First invariant violation aborts the run with a [`SchedulerError`] |
//! | Deadline misses | Recorded in the [`RunReport`], logged, never fatal |
//!
//! # Example
//! ```rust
//! use rtss_sim::scheduler::{RtScheduler, TableDrivenScheduler};
//! use rtss_sim::table::{ScheduleSlot, TaskTableBuilder};
//! use rtss_sim::task::Task;
//! use rtss_sim::time::from_ms;
//!
//! let mut tasks = vec![Task::periodic(from_ms(0), from_ms(4), from_ms(2), None)];
//! tasks[0].set_id(1).unwrap();
//!
//! let mut builder = TaskTableBuilder::new();
//! builder
//!     .add_entry(ScheduleSlot::Task(1), from_ms(0))
//!     .add_entry(ScheduleSlot::Idle, from_ms(2))
//!     .add_entry(ScheduleSlot::Reset, from_ms(4));
//! let table = builder.build_task_based().unwrap();
//!
//! let mut scheduler = TableDrivenScheduler::new(&mut tasks, table).unwrap();
//! let report = scheduler.run_scheduler(3).unwrap();
//! assert_eq!(report.cycles_completed, 3);
//! assert_eq!(report.executed_by(1), from_ms(6));
//! ```

pub mod cyclic;
pub mod dispatch;
pub mod error;
pub mod feasibility;
pub mod priority;
pub mod table_driven;

pub use cyclic::CyclicExecutiveScheduler;
pub use error::SchedulerError;
pub use priority::{Comparator, PriorityBasedScheduler, PriorityContext, PriorityPolicy};
pub use table_driven::TableDrivenScheduler;

use crate::table::ScheduleSlot;
use crate::task::Task;
use crate::time::{TimeDuration, TimePoint};

// ── RtScheduler ───────────────────────────────────────────────────────────────

/// Common interface of every scheduler engine.
pub trait RtScheduler {
    /// Drive the task list for `cycles` hyperperiods (static engines) or
    /// dispatch cycles (priority engine).
    ///
    /// Each call is a fresh run: the virtual clock starts at zero and the
    /// returned report covers this call only.  Task state (`remaining`,
    /// `executed`) carries over between calls; reset it with [`reset_all`]
    /// for an independent replay.
    fn run_scheduler(&mut self, cycles: u64) -> Result<RunReport, SchedulerError>;

    /// Short engine name for logs.
    fn name(&self) -> &'static str;
}

/// Restore every task's full WCET.
pub fn reset_all(tasks: &mut [Task]) {
    tasks.iter_mut().for_each(Task::reset);
}

// ── RunReport ─────────────────────────────────────────────────────────────────

/// One executed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub start: TimePoint,
    pub slot: ScheduleSlot,
    pub duration: TimeDuration,
}

/// A periodic job that finished after its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineMiss {
    pub task_id: u16,
    pub cycle: u64,
    /// `max(release, cycle start) + relative_deadline`.
    pub deadline: TimePoint,
    pub completed_at: TimePoint,
}

/// Outcome of one [`RtScheduler::run_scheduler`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub cycles_completed: u64,
    /// Executed slots in dispatch order.  Zero-length slots are omitted.
    pub trace: Vec<ExecutionRecord>,
    pub idle_time: TimeDuration,
    pub deadline_misses: Vec<DeadlineMiss>,
    /// Virtual clock at the end of the run.
    pub end_time: TimePoint,
}

impl RunReport {
    /// Total time task `task_id` (1-based) executed during this run.
    pub fn executed_by(&self, task_id: u16) -> TimeDuration {
        self.trace
            .iter()
            .filter(|r| r.slot == ScheduleSlot::Task(task_id))
            .map(|r| r.duration)
            .sum()
    }

    /// Slots in dispatch order, idle periods included.
    pub fn execution_order(&self) -> Vec<ScheduleSlot> {
        self.trace.iter().map(|r| r.slot).collect()
    }

    pub fn busy_time(&self) -> TimeDuration {
        self.end_time.saturating_sub(self.idle_time)
    }

    pub fn has_deadline_misses(&self) -> bool {
        !self.deadline_misses.is_empty()
    }
}

impl ExecutionRecord {
    pub fn end(&self) -> TimePoint {
        self.start + self.duration
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{from_ms, ZERO_DURATION};

    fn record(start: u64, slot: ScheduleSlot, ms: u64) -> ExecutionRecord {
        ExecutionRecord {
            start: from_ms(start),
            slot,
            duration: from_ms(ms),
        }
    }

    #[test]
    fn executed_by_sums_task_slots_only() {
        let report = RunReport {
            trace: vec![
                record(0, ScheduleSlot::Task(1), 2),
                record(2, ScheduleSlot::Task(2), 1),
                record(3, ScheduleSlot::Idle, 1),
                record(4, ScheduleSlot::Task(1), 3),
            ],
            idle_time: from_ms(1),
            end_time: from_ms(7),
            ..Default::default()
        };
        assert_eq!(report.executed_by(1), from_ms(5));
        assert_eq!(report.executed_by(2), from_ms(1));
        assert_eq!(report.executed_by(3), ZERO_DURATION);
        assert_eq!(report.busy_time(), from_ms(6));
        assert_eq!(report.trace[3].end(), from_ms(7));
        assert!(!report.has_deadline_misses());
    }

    #[test]
    fn execution_order_keeps_dispatch_order() {
        let report = RunReport {
            trace: vec![
                record(0, ScheduleSlot::Task(2), 1),
                record(1, ScheduleSlot::Idle, 1),
                record(2, ScheduleSlot::Task(1), 1),
            ],
            ..Default::default()
        };
        assert_eq!(
            report.execution_order(),
            vec![ScheduleSlot::Task(2), ScheduleSlot::Idle, ScheduleSlot::Task(1)]
        );
    }

    #[test]
    fn reset_all_restores_wcet() {
        let mut tasks = vec![
            Task::periodic(from_ms(0), from_ms(5), from_ms(2), None),
            Task::aperiodic(from_ms(1), from_ms(3)),
        ];
        tasks[0].run(from_ms(2)).unwrap();
        tasks[1].run(from_ms(1)).unwrap();
        reset_all(&mut tasks);
        assert_eq!(tasks[0].remaining(), from_ms(2));
        assert_eq!(tasks[1].remaining(), from_ms(3));
        // cumulative execution survives the reset
        assert_eq!(tasks[0].executed(), from_ms(2));
    }
}
