/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the scheduler engines.
//!
//! Construction-time failures (wrong table mode, missing reset marker,
//! unknown policy name) are raised before any task executes.  Run-time
//! failures abort the run on the first occurrence:
//!
//! | Variant | Raised by |
//! |---|---|
//! | `ModeMismatch` | `TableDrivenScheduler::new`, `CyclicExecutiveScheduler::new` |
//! | `MissingResetMarker` | `TableDrivenScheduler::new` |
//! | `UnknownPolicy` | `PriorityPolicy::from_name` |
//! | `UnknownTask` | any dispatch of a slot naming a task outside the list |
//! | `NotRunnable` | a reset marker handed to the dispatcher as work |
//! | `ClockOverflow` | a dispatch that would push the virtual clock past `Duration::MAX` |
//! | `Task` | task-level invariant violations (overrun, id reuse) |
//! | `Table` | table lookups and frame execution |
//!
//! Deadline misses are not errors; they are reported in the
//! [`RunReport`](super::RunReport).

use thiserror::Error;

use crate::table::{ScheduleSlot, SchedulingMode, TableError};
use crate::task::TaskError;
use crate::time::{TimeDuration, TimePoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The engine was handed a table of the wrong mode.
    #[error("{engine} scheduler requires a {required} task table, got {actual}")]
    ModeMismatch {
        engine: &'static str,
        required: SchedulingMode,
        actual: SchedulingMode,
    },

    /// A TASK_BASED table must end with a reset marker (`-1`).
    #[error("task table does not end with a reset marker")]
    MissingResetMarker,

    /// A schedule slot names a 1-based task index outside the task list.
    #[error("schedule refers to task {task_id} but only {task_count} tasks are loaded")]
    UnknownTask { task_id: u16, task_count: usize },

    #[error("unknown priority policy: '{0}' (valid: rm, dm, edf, llf)")]
    UnknownPolicy(String),

    #[error("slot {0} cannot be executed")]
    NotRunnable(ScheduleSlot),

    /// Advancing the virtual clock by `duration` would overflow it.
    #[error("virtual clock overflow: {now:?} + {duration:?}")]
    ClockOverflow {
        now: TimePoint,
        duration: TimeDuration,
    },

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Table(#[from] TableError),
}
