/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Table-driven dispatch over a TASK_BASED schedule.
//!
//! Each entry runs its slot until the next entry's start time.  The reset
//! marker closes a hyperperiod: every task is reset, the cursor steps past
//! the marker (wrapping to entry 0) and the next hyperperiod begins.

use tracing::{debug, info};

use super::dispatch::Dispatcher;
use super::{RtScheduler, RunReport, SchedulerError};
use crate::table::{ScheduleSlot, SchedulingMode, TaskTable};
use crate::task::Task;
use crate::time;

pub struct TableDrivenScheduler<'a> {
    tasks: &'a mut [Task],
    table: TaskTable,
}

impl<'a> TableDrivenScheduler<'a> {
    /// # Errors
    /// * [`SchedulerError::ModeMismatch`] – `table` is not TASK_BASED.
    /// * [`SchedulerError::MissingResetMarker`] – the last entry is not a
    ///   reset marker, so no hyperperiod would ever complete.
    pub fn new(tasks: &'a mut [Task], table: TaskTable) -> Result<Self, SchedulerError> {
        let schedule = table.schedule().ok_or(SchedulerError::ModeMismatch {
            engine: "table-driven",
            required: SchedulingMode::TaskBased,
            actual: table.mode(),
        })?;
        if schedule.last().map(|e| e.slot) != Some(ScheduleSlot::Reset) {
            return Err(SchedulerError::MissingResetMarker);
        }
        info!(
            entries = schedule.len(),
            tasks = tasks.len(),
            span_ms = time::to_ms(table.span()),
            "TableDrivenScheduler ready"
        );
        Ok(Self { tasks, table })
    }

    pub fn table(&self) -> &TaskTable {
        &self.table
    }
}

impl RtScheduler for TableDrivenScheduler<'_> {
    fn run_scheduler(&mut self, cycles: u64) -> Result<RunReport, SchedulerError> {
        self.table.reset_k();
        let mut dispatcher = Dispatcher::new(&mut *self.tasks);

        while dispatcher.cycles_completed() < cycles {
            let entry = *self.table.current_entry()?;

            if entry.slot == ScheduleSlot::Reset {
                debug!(k = self.table.k(), "reset marker reached");
                dispatcher.complete_cycle();
                self.table.increment_k();
                continue;
            }

            let next = self.table.next_entry()?;
            let duration = next.start_time.saturating_sub(entry.start_time);
            dispatcher.dispatch(entry.slot, duration)?;
            self.table.increment_k();
        }

        Ok(dispatcher.finish())
    }

    fn name(&self) -> &'static str {
        "table-driven"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
