/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task entities driven by the scheduler engines.
//!
//! A [`Task`] carries its static timing attributes (phase, WCET and, for
//! periodic tasks, period and relative deadline) plus two pieces of mutable
//! state:
//!
//! ```text
//!              run(d)                          reset()
//!   remaining ─────────► remaining − d   ...  ─────────► wcet
//!   executed  ─────────► executed  + d        (untouched, cumulative over the run)
//! ```
//!
//! # Ownership model
//! The caller owns the `Vec<Task>` for the whole simulation and lends it to
//! one scheduler engine at a time as `&mut [Task]`.  Only the engine's
//! execution step ([`Task::run`]) and the per-hyperperiod [`Task::reset`]
//! write to it.
//!
//! # Task kinds
//! Periodic / aperiodic / idle is a closed [`TaskKind`] variant, so the
//! schedulers ask `is_periodic()` or `period()` instead of inspecting the
//! concrete type.

use std::fmt;

use thiserror::Error;

use crate::time::{self, TimeDuration, TimePoint, ZERO_DURATION};

/// Reserved id of the Idle task.  Real tasks are numbered from 1.
pub const IDLE_TASK_ID: u16 = 0;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Invariant violations raised by a single task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// `set_id` was called on a task that already carries an id.
    #[error("task id is already set to {current}; refusing to overwrite with {requested}")]
    IdAlreadySet { current: u16, requested: u16 },

    /// Id 0 belongs to the Idle task.
    #[error("task id 0 is reserved for the idle task")]
    ReservedId,

    /// A slot asked the task to execute for longer than it has work left.
    #[error(
        "task {id} asked to run for {requested:?} but only {remaining:?} of execution time remains"
    )]
    Overrun {
        id: u16,
        requested: TimeDuration,
        remaining: TimeDuration,
    },
}

// ── TaskKind ──────────────────────────────────────────────────────────────────

/// Kind-specific attributes of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Released every `period`, starting at the task's phase.
    Periodic {
        period: TimeDuration,
        relative_deadline: TimeDuration,
    },

    /// Released once; the task's phase is its arrival time.
    Aperiodic,

    /// "No work".  Absorbs idle slots and never counts towards statistics.
    Idle,
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// A schedulable entity with mutable remaining-execution state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// `0` until [`set_id`](Self::set_id) is called.
    id: u16,
    kind: TaskKind,
    /// Release offset (periodic) or arrival time (aperiodic).
    phase: TimeDuration,
    wcet: TimeDuration,
    remaining: TimeDuration,
    /// Total execution over the whole simulation.  Not cleared by `reset`.
    executed: TimeDuration,
}

impl Task {
    /// Create a periodic task.  `relative_deadline` defaults to `period`.
    pub fn periodic(
        phase: TimeDuration,
        period: TimeDuration,
        wcet: TimeDuration,
        relative_deadline: Option<TimeDuration>,
    ) -> Self {
        Self::with_kind(
            TaskKind::Periodic {
                period,
                relative_deadline: relative_deadline.unwrap_or(period),
            },
            phase,
            wcet,
        )
    }

    /// Create an aperiodic task arriving at `arrival`.
    pub fn aperiodic(arrival: TimeDuration, wcet: TimeDuration) -> Self {
        Self::with_kind(TaskKind::Aperiodic, arrival, wcet)
    }

    /// The Idle task: zero phase, zero WCET, id 0.
    ///
    /// Each scheduling run owns its own instance.
    pub fn idle() -> Self {
        Self::with_kind(TaskKind::Idle, ZERO_DURATION, ZERO_DURATION)
    }

    fn with_kind(kind: TaskKind, phase: TimeDuration, wcet: TimeDuration) -> Self {
        Self {
            id: IDLE_TASK_ID,
            kind,
            phase,
            wcet,
            remaining: wcet,
            executed: ZERO_DURATION,
        }
    }

    // ── Identity ──────────────────────────────────────────────────────────────

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Assign the task's id.  Allowed exactly once per instance.
    ///
    /// # Errors
    /// * [`TaskError::ReservedId`] – `id == 0`.
    /// * [`TaskError::IdAlreadySet`] – the task already has an id.
    pub fn set_id(&mut self, id: u16) -> Result<(), TaskError> {
        if id == IDLE_TASK_ID {
            return Err(TaskError::ReservedId);
        }
        if self.id != IDLE_TASK_ID {
            return Err(TaskError::IdAlreadySet {
                current: self.id,
                requested: id,
            });
        }
        self.id = id;
        Ok(())
    }

    // ── Timing attributes ─────────────────────────────────────────────────────

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn phase(&self) -> TimeDuration {
        self.phase
    }

    /// Arrival time of an aperiodic task; `None` for other kinds.
    pub fn arrival(&self) -> Option<TimeDuration> {
        match self.kind {
            TaskKind::Aperiodic => Some(self.phase),
            _ => None,
        }
    }

    pub fn wcet(&self) -> TimeDuration {
        self.wcet
    }

    pub fn period(&self) -> Option<TimeDuration> {
        match self.kind {
            TaskKind::Periodic { period, .. } => Some(period),
            _ => None,
        }
    }

    pub fn relative_deadline(&self) -> Option<TimeDuration> {
        match self.kind {
            TaskKind::Periodic {
                relative_deadline, ..
            } => Some(relative_deadline),
            _ => None,
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self.kind, TaskKind::Periodic { .. })
    }

    /// A task with no execution demand.  Always true for the Idle task.
    pub fn is_idle(&self) -> bool {
        self.wcet == ZERO_DURATION
    }

    /// `wcet / period`; `0.0` for non-periodic tasks or a zero period.
    pub fn utilization(&self) -> f64 {
        match self.period() {
            Some(p) if p > ZERO_DURATION => self.wcet.as_secs_f64() / p.as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Also sets the arrival time of an aperiodic task.
    pub fn set_phase(&mut self, phase: TimeDuration) {
        self.phase = phase;
    }

    /// Changes the WCET.  `remaining` picks the new value up on the next
    /// [`reset`](Self::reset).
    pub fn set_wcet(&mut self, wcet: TimeDuration) {
        self.wcet = wcet;
    }

    /// No effect on non-periodic tasks.
    pub fn set_period(&mut self, new_period: TimeDuration) {
        if let TaskKind::Periodic { period, .. } = &mut self.kind {
            *period = new_period;
        }
    }

    /// No effect on non-periodic tasks.
    pub fn set_relative_deadline(&mut self, deadline: TimeDuration) {
        if let TaskKind::Periodic {
            relative_deadline, ..
        } = &mut self.kind
        {
            *relative_deadline = deadline;
        }
    }

    // ── Per-cycle timing ──────────────────────────────────────────────────────

    /// Release time of the job in `cycle`: `phase + cycle × period` for a
    /// periodic task, the arrival/phase otherwise.
    pub fn release_at(&self, cycle: u64) -> TimePoint {
        match self.kind {
            TaskKind::Periodic { period, .. } => self.phase.saturating_add(scale(period, cycle)),
            _ => self.phase,
        }
    }

    /// Absolute deadline of the job in `cycle`:
    /// `phase + cycle × period + relative_deadline`.  Periodic tasks only.
    pub fn deadline_at(&self, cycle: u64) -> Option<TimePoint> {
        match self.kind {
            TaskKind::Periodic {
                period,
                relative_deadline,
            } => Some(
                self.phase
                    .saturating_add(scale(period, cycle))
                    .saturating_add(relative_deadline),
            ),
            _ => None,
        }
    }

    /// Laxity of the job in `cycle` at time `now`, in signed nanoseconds:
    /// `(deadline − now) − remaining`.  Periodic tasks only.
    pub fn laxity(&self, now: TimePoint, cycle: u64) -> Option<i128> {
        let deadline = self.deadline_at(cycle)?;
        Some(time::signed_nanos_between(deadline, now) - self.remaining.as_nanos() as i128)
    }

    // ── Execution state ───────────────────────────────────────────────────────

    pub fn remaining(&self) -> TimeDuration {
        self.remaining
    }

    pub fn executed(&self) -> TimeDuration {
        self.executed
    }

    /// Consume `duration` of the task's remaining execution time.
    ///
    /// The Idle task absorbs any duration without changing state.
    ///
    /// # Errors
    /// [`TaskError::Overrun`] if `duration` exceeds the remaining time; the
    /// task is left untouched.
    pub fn run(&mut self, duration: TimeDuration) -> Result<(), TaskError> {
        if self.kind == TaskKind::Idle {
            return Ok(());
        }
        if duration > self.remaining {
            return Err(TaskError::Overrun {
                id: self.id,
                requested: duration,
                remaining: self.remaining,
            });
        }
        self.remaining -= duration;
        self.executed += duration;
        Ok(())
    }

    /// Restore the full WCET for the next hyperperiod / cycle.
    pub fn reset(&mut self) {
        self.remaining = self.wcet;
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TaskKind::Periodic {
                period,
                relative_deadline,
            } => write!(
                f,
                "phase = {} period = {} wcet = {} rel_dl = {}",
                time::to_ms(self.phase),
                time::to_ms(period),
                time::to_ms(self.wcet),
                time::to_ms(relative_deadline),
            ),
            TaskKind::Aperiodic => write!(
                f,
                "arrival = {} wcet = {}",
                time::to_ms(self.phase),
                time::to_ms(self.wcet),
            ),
            TaskKind::Idle => write!(
                f,
                "phase = {} wcet = {}",
                time::to_ms(self.phase),
                time::to_ms(self.wcet),
            ),
        }
    }
}

/// `period × cycle`, saturating instead of panicking on overflow.
fn scale(period: TimeDuration, cycle: u64) -> TimeDuration {
    u32::try_from(cycle)
        .ok()
        .and_then(|c| period.checked_mul(c))
        .unwrap_or(TimeDuration::MAX)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
