/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-run execution context shared by all scheduler engines.
//!
//! A [`Dispatcher`] borrows the task list for the duration of one run and
//! owns everything else that run needs: the virtual clock, the run's Idle
//! task and the [`RunReport`] being filled in.
//!
//! ```text
//! dispatch(slot, d)            idle_until(t)             complete_cycle()
//!   resolve slot → task          now < t ?                 reset every task
//!   now + d fits?                record Idle [now, t)      cycles_completed += 1
//!   task.run(d)?                 now = t                   cycle_start = now
//!   record [now, now + d)
//!   now += d
//! ```

use tracing::{debug, info, warn};

use super::{DeadlineMiss, ExecutionRecord, RunReport, SchedulerError};
use crate::table::ScheduleSlot;
use crate::task::Task;
use crate::time::{self, TimeDuration, TimePoint, ZERO_DURATION};

pub struct Dispatcher<'a> {
    tasks: &'a mut [Task],
    idle: Task,
    now: TimePoint,
    /// Clock value when the current cycle began.
    cycle_start: TimePoint,
    report: RunReport,
}

impl<'a> Dispatcher<'a> {
    pub fn new(tasks: &'a mut [Task]) -> Self {
        Self {
            tasks,
            idle: Task::idle(),
            now: ZERO_DURATION,
            cycle_start: ZERO_DURATION,
            report: RunReport::default(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &*self.tasks
    }

    pub fn now(&self) -> TimePoint {
        self.now
    }

    pub fn cycles_completed(&self) -> u64 {
        self.report.cycles_completed
    }

    /// Execute `slot` for `duration` and advance the clock.
    ///
    /// # Errors
    /// * [`SchedulerError::UnknownTask`] – the slot's index is outside the list.
    /// * [`SchedulerError::NotRunnable`] – the slot is a reset marker.
    /// * [`SchedulerError::Task`] – the task has less than `duration` left.
    /// * [`SchedulerError::ClockOverflow`] – `now + duration` is not representable.
    pub fn dispatch(&mut self, slot: ScheduleSlot, duration: TimeDuration) -> Result<(), SchedulerError> {
        if self.now.checked_add(duration).is_none() {
            return Err(SchedulerError::ClockOverflow {
                now: self.now,
                duration,
            });
        }
        let task_count = self.tasks.len();
        let task = match slot {
            ScheduleSlot::Idle => &mut self.idle,
            ScheduleSlot::Reset => return Err(SchedulerError::NotRunnable(slot)),
            ScheduleSlot::Task(task_id) => usize::from(task_id)
                .checked_sub(1)
                .and_then(|i| self.tasks.get_mut(i))
                .ok_or(SchedulerError::UnknownTask {
                    task_id,
                    task_count,
                })?,
        };
        task.run(duration)?;
        self.record(slot, duration);
        Ok(())
    }

    /// Run the task at `index` (0-based) for its whole remaining time.
    pub fn run_to_completion(&mut self, index: usize) -> Result<TimeDuration, SchedulerError> {
        let slot = u16::try_from(index + 1)
            .map(ScheduleSlot::Task)
            .map_err(|_| SchedulerError::UnknownTask {
                task_id: u16::MAX,
                task_count: self.tasks.len(),
            })?;
        let remaining = self
            .tasks
            .get(index)
            .map(Task::remaining)
            .ok_or(SchedulerError::UnknownTask {
                task_id: index as u16 + 1,
                task_count: self.tasks.len(),
            })?;
        self.dispatch(slot, remaining)?;
        Ok(remaining)
    }

    /// Let the processor idle until `until`.  No effect if `until` is not
    /// in the future.
    pub fn idle_until(&mut self, until: TimePoint) {
        if let Some(gap) = until.checked_sub(self.now).filter(|d| !d.is_zero()) {
            self.record(ScheduleSlot::Idle, gap);
        }
    }

    /// Record a deadline miss for the job of task `index` in `cycle` if it
    /// completed later than `relative_deadline` after its effective release.
    ///
    /// A job released before the current cycle began counts from the cycle
    /// start.
    pub fn check_deadline(&mut self, index: usize, cycle: u64) {
        let Some(task) = self.tasks.get(index) else {
            return;
        };
        let Some(relative) = task.relative_deadline() else {
            return;
        };
        let deadline = task
            .release_at(cycle)
            .max(self.cycle_start)
            .saturating_add(relative);
        if self.now > deadline {
            warn!(
                task = task.id(),
                cycle,
                deadline_ms = time::to_ms(deadline),
                completed_ms = time::to_ms(self.now),
                "deadline missed"
            );
            self.report.deadline_misses.push(DeadlineMiss {
                task_id: task.id(),
                cycle,
                deadline,
                completed_at: self.now,
            });
        }
    }

    /// End of one hyperperiod / cycle: give every task its full WCET back.
    pub fn complete_cycle(&mut self) {
        super::reset_all(self.tasks);
        self.report.cycles_completed += 1;
        self.cycle_start = self.now;
        info!(
            cycle = self.report.cycles_completed,
            now_ms = time::to_ms(self.now),
            "cycle complete, tasks reset"
        );
    }

    pub fn finish(mut self) -> RunReport {
        self.report.end_time = self.now;
        self.report
    }

    fn record(&mut self, slot: ScheduleSlot, duration: TimeDuration) {
        if duration.is_zero() {
            return;
        }
        debug!(
            task = %slot,
            start_ms = time::to_ms(self.now),
            duration_ms = time::to_ms(duration),
            "executed slot"
        );
        if slot == ScheduleSlot::Idle {
            self.report.idle_time += duration;
        }
        self.report.trace.push(ExecutionRecord {
            start: self.now,
            slot,
            duration,
        });
        self.now += duration;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
