/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Static schedule tables.
//!
//! A [`TaskTable`] is built once by a [`TaskTableBuilder`] and then walked by a
//! static scheduler engine through its cyclic cursor `k`.  It holds exactly
//! one of:
//!
//! ```text
//! TASK_BASED   [(t0, T1) (t1, T2) (t2, Idle) ... (tn, Reset)]   k → entry
//! FRAME_BASED  [Frame 0][Frame 1] ... [Frame m]                 k → frame
//!                  └─ {T1, 2ms} {T2, 1ms} ...
//! ```
//!
//! The mode is fixed at construction; accessors of the other mode fail with
//! [`TableError::WrongMode`].

pub mod builder;
pub mod frame;

pub use frame::{Frame, FrameContainer, FrameJob};

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::task::{Task, IDLE_TASK_ID};
use crate::time::{self, TimeDuration, TimePoint, ZERO_DURATION};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Construction and lookup failures of schedule tables and frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("schedule is empty")]
    EmptySchedule,

    #[error("frame duration cannot be zero")]
    ZeroFrameDuration,

    #[error("frame sequence is empty")]
    NoFrames,

    /// A frame without jobs was asked to run.
    #[error("frame has no jobs to run")]
    EmptyFrame,

    /// Start times must never decrease.
    #[error(
        "schedule entry {index} starts at {start:?}, before the previous entry at {previous:?}"
    )]
    NonChronological {
        index: usize,
        previous: TimePoint,
        start: TimePoint,
    },

    /// A reset marker may only terminate a schedule that is packed into frames.
    #[error("reset marker at entry {index} is not the last entry of the schedule")]
    MisplacedResetMarker { index: usize },

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("task table is in {actual} mode, {expected} mode required")]
    WrongMode {
        expected: SchedulingMode,
        actual: SchedulingMode,
    },

    /// Raw ids: `0` idle, `-1` reset, `1..=65535` task.
    #[error("invalid schedule task id {0}")]
    InvalidSlotId(i32),
}

// ── ScheduleSlot ──────────────────────────────────────────────────────────────

/// What occupies a schedule slot.
///
/// Replaces the raw integer convention of schedule files (`0` = Idle,
/// `-1` = reset marker, `n > 0` = 1-based task index); the integer form only
/// exists at the file boundary ([`from_raw`](Self::from_raw) /
/// [`to_raw`](Self::to_raw)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleSlot {
    Idle,
    /// End of one hyperperiod: all tasks get their full WCET back.
    Reset,
    /// 1-based index into the task list.
    Task(u16),
}

impl ScheduleSlot {
    /// Parse a raw schedule id.
    ///
    /// # Errors
    /// [`TableError::InvalidSlotId`] for ids below `-1` or above `u16::MAX`.
    pub fn from_raw(raw: i32) -> Result<Self, TableError> {
        match raw {
            0 => Ok(ScheduleSlot::Idle),
            -1 => Ok(ScheduleSlot::Reset),
            n => u16::try_from(n)
                .map(ScheduleSlot::Task)
                .map_err(|_| TableError::InvalidSlotId(raw)),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            ScheduleSlot::Idle => 0,
            ScheduleSlot::Reset => -1,
            ScheduleSlot::Task(id) => i32::from(id),
        }
    }

    /// Slot that runs `task`: the task's own id, or Idle for an id-less task.
    pub fn for_task(task: &Task) -> Self {
        match task.id() {
            IDLE_TASK_ID => ScheduleSlot::Idle,
            id => ScheduleSlot::Task(id),
        }
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleSlot::Idle => write!(f, "Idle"),
            ScheduleSlot::Reset => write!(f, "Reset"),
            ScheduleSlot::Task(id) => write!(f, "T{id}"),
        }
    }
}

// ── TaskScheduleEntry ─────────────────────────────────────────────────────────

/// One row of a chronological schedule: `slot` starts at `start_time` and
/// lasts until the next entry's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskScheduleEntry {
    pub start_time: TimePoint,
    pub slot: ScheduleSlot,
}

impl TaskScheduleEntry {
    pub fn new(start_time: TimePoint, slot: ScheduleSlot) -> Self {
        Self { start_time, slot }
    }
}

// ── SchedulingMode ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingMode {
    /// Explicit chronological list of entries (table-driven dispatch).
    TaskBased,
    /// Sequence of fixed-size frames (cyclic executive).
    FrameBased,
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMode::TaskBased => write!(f, "TASK_BASED"),
            SchedulingMode::FrameBased => write!(f, "FRAME_BASED"),
        }
    }
}

// ── TaskTable ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TableContents {
    Schedule(Vec<TaskScheduleEntry>),
    Frames(FrameContainer),
}

/// Immutable schedule (or frame sequence) plus a cyclic cursor.
#[derive(Debug, Clone)]
pub struct TaskTable {
    contents: TableContents,
    k: usize,
}

impl TaskTable {
    /// TASK_BASED table over `schedule`.
    ///
    /// # Errors
    /// [`TableError::EmptySchedule`] if `schedule` is empty.
    pub fn from_schedule(schedule: Vec<TaskScheduleEntry>) -> Result<Self, TableError> {
        if schedule.is_empty() {
            return Err(TableError::EmptySchedule);
        }
        Ok(Self {
            contents: TableContents::Schedule(schedule),
            k: 0,
        })
    }

    /// FRAME_BASED table over `frames` (non-empty by construction).
    pub fn from_frames(frames: FrameContainer) -> Self {
        Self {
            contents: TableContents::Frames(frames),
            k: 0,
        }
    }

    pub fn mode(&self) -> SchedulingMode {
        match self.contents {
            TableContents::Schedule(_) => SchedulingMode::TaskBased,
            TableContents::Frames(_) => SchedulingMode::FrameBased,
        }
    }

    /// Number of entries (TASK_BASED) or frames (FRAME_BASED).
    pub fn len(&self) -> usize {
        match &self.contents {
            TableContents::Schedule(s) => s.len(),
            TableContents::Frames(f) => f.len(),
        }
    }

    /// Always `false`; both constructors reject empty input.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Advance the cursor, wrapping to `0` after the last entry / frame.
    pub fn increment_k(&mut self) {
        self.k = (self.k + 1) % self.len();
    }

    /// Rewind the cursor to the first entry / frame.
    pub fn reset_k(&mut self) {
        self.k = 0;
    }

    // ── TASK_BASED access ─────────────────────────────────────────────────────

    pub fn schedule(&self) -> Option<&[TaskScheduleEntry]> {
        match &self.contents {
            TableContents::Schedule(s) => Some(s),
            TableContents::Frames(_) => None,
        }
    }

    fn entries(&self) -> Result<&[TaskScheduleEntry], TableError> {
        self.schedule().ok_or(TableError::WrongMode {
            expected: SchedulingMode::TaskBased,
            actual: self.mode(),
        })
    }

    pub fn get_kth_entry(&self, k: usize) -> Result<&TaskScheduleEntry, TableError> {
        let entries = self.entries()?;
        entries.get(k).ok_or(TableError::IndexOutOfRange {
            index: k,
            len: entries.len(),
        })
    }

    pub fn current_entry(&self) -> Result<&TaskScheduleEntry, TableError> {
        self.get_kth_entry(self.k)
    }

    /// Entry after the cursor, wrapping to the first one.
    pub fn next_entry(&self) -> Result<&TaskScheduleEntry, TableError> {
        let len = self.entries()?.len();
        self.get_kth_entry((self.k + 1) % len)
    }

    // ── FRAME_BASED access ────────────────────────────────────────────────────

    pub fn frames(&self) -> Option<&FrameContainer> {
        match &self.contents {
            TableContents::Frames(f) => Some(f),
            TableContents::Schedule(_) => None,
        }
    }

    fn frame_container(&self) -> Result<&FrameContainer, TableError> {
        self.frames().ok_or(TableError::WrongMode {
            expected: SchedulingMode::FrameBased,
            actual: self.mode(),
        })
    }

    pub fn get_kth_frame(&self, k: usize) -> Result<&Frame, TableError> {
        self.frame_container()?.get_kth_frame(k)
    }

    pub fn current_frame(&self) -> Result<&Frame, TableError> {
        self.get_kth_frame(self.k)
    }

    /// Frame after the cursor, wrapping to the first one.
    pub fn next_frame(&self) -> Result<&Frame, TableError> {
        let container = self.frame_container()?;
        container.get_kth_frame((self.k + 1) % container.len())
    }

    pub fn frame_duration(&self) -> Option<TimeDuration> {
        self.frames().map(FrameContainer::frame_duration)
    }

    /// Time covered by one pass over the table: first to last start time
    /// (TASK_BASED) or the sum of all frame contents (FRAME_BASED).
    pub fn span(&self) -> TimeDuration {
        match &self.contents {
            TableContents::Schedule(s) => match (s.first(), s.last()) {
                (Some(first), Some(last)) => last.start_time.saturating_sub(first.start_time),
                _ => ZERO_DURATION,
            },
            TableContents::Frames(f) => f.iter().map(Frame::total_duration).sum(),
        }
    }
}

impl fmt::Display for TaskTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contents {
            TableContents::Schedule(schedule) => {
                writeln!(f, "t_k\tT_k:")?;
                for entry in schedule {
                    writeln!(
                        f,
                        "{}\t{}",
                        time::to_ms(entry.start_time),
                        entry.slot.to_raw()
                    )?;
                }
                Ok(())
            }
            TableContents::Frames(frames) => write!(f, "{frames}"),
        }
    }
}

// ── TaskTableBuilder ──────────────────────────────────────────────────────────

/// Accumulates a chronological schedule and turns it into a [`TaskTable`].
///
/// `build*` consumes the builder, so a schedule is turned into exactly one
/// table.
#[derive(Debug, Clone, Default)]
pub struct TaskTableBuilder {
    schedule: Vec<TaskScheduleEntry>,
}

impl TaskTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, slot: ScheduleSlot, start_time: TimePoint) -> &mut Self {
        self.schedule.push(TaskScheduleEntry::new(start_time, slot));
        self
    }

    pub fn add_task_entry(&mut self, task: &Task, start_time: TimePoint) -> &mut Self {
        self.add_entry(ScheduleSlot::for_task(task), start_time)
    }

    /// Add an entry from the raw file convention (`0`, `-1`, `n > 0`).
    pub fn add_raw_entry(&mut self, raw: i32, start_time: TimePoint) -> Result<&mut Self, TableError> {
        let slot = ScheduleSlot::from_raw(raw)?;
        Ok(self.add_entry(slot, start_time))
    }

    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn entries(&self) -> &[TaskScheduleEntry] {
        &self.schedule
    }

    /// Build a table in `mode`.  `frame_duration` is required for
    /// [`SchedulingMode::FrameBased`] and ignored otherwise.
    pub fn build(
        self,
        mode: SchedulingMode,
        frame_duration: Option<TimeDuration>,
    ) -> Result<TaskTable, TableError> {
        match mode {
            SchedulingMode::TaskBased => self.build_task_based(),
            SchedulingMode::FrameBased => {
                self.build_frame_based(frame_duration.unwrap_or(ZERO_DURATION))
            }
        }
    }

    /// # Errors
    /// [`TableError::EmptySchedule`], [`TableError::NonChronological`].
    pub fn build_task_based(self) -> Result<TaskTable, TableError> {
        self.validate()?;
        info!(entries = self.schedule.len(), "Built TASK_BASED task table");
        TaskTable::from_schedule(self.schedule)
    }

    /// Pack the schedule into frames of `frame_duration` (see
    /// [`builder::pack_frames`]).
    ///
    /// # Errors
    /// Everything [`build_task_based`](Self::build_task_based) rejects, plus
    /// [`TableError::ZeroFrameDuration`], [`TableError::MisplacedResetMarker`]
    /// and [`TableError::NoFrames`].
    pub fn build_frame_based(self, frame_duration: TimeDuration) -> Result<TaskTable, TableError> {
        self.validate()?;
        let frames = builder::pack_frames(&self.schedule, frame_duration)?;
        let container = FrameContainer::new(frames, frame_duration)?;
        info!(
            entries = self.schedule.len(),
            frames = container.len(),
            frame_ms = time::to_ms(frame_duration),
            "Built FRAME_BASED task table"
        );
        Ok(TaskTable::from_frames(container))
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.schedule.is_empty() {
            return Err(TableError::EmptySchedule);
        }
        for (index, pair) in self.schedule.windows(2).enumerate() {
            if pair[1].start_time < pair[0].start_time {
                return Err(TableError::NonChronological {
                    index: index + 1,
                    previous: pair[0].start_time,
                    start: pair[1].start_time,
                });
            }
        }
        debug!(entries = self.schedule.len(), "schedule is chronological");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
