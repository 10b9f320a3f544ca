/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Frames of a cyclic-executive schedule.

use std::fmt;

use tracing::trace;

use super::{ScheduleSlot, TableError};
use crate::scheduler::dispatch::Dispatcher;
use crate::scheduler::SchedulerError;
use crate::time::{self, TimeDuration};

// ── FrameJob ──────────────────────────────────────────────────────────────────

/// A slice of one slot placed inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameJob {
    pub slot: ScheduleSlot,
    pub duration: TimeDuration,
}

impl FrameJob {
    pub fn new(slot: ScheduleSlot, duration: TimeDuration) -> Self {
        Self { slot, duration }
    }
}

impl fmt::Display for FrameJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{T{}, {}ms}}",
            self.slot.to_raw(),
            time::to_ms(self.duration)
        )
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// Ordered jobs whose durations sum to at most the frame size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    jobs: Vec<FrameJob>,
}

impl Frame {
    pub fn new(jobs: Vec<FrameJob>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[FrameJob] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn total_duration(&self) -> TimeDuration {
        self.jobs.iter().map(|j| j.duration).sum()
    }

    /// Execute every job of the frame, in order, through `dispatcher`.
    ///
    /// # Errors
    /// [`TableError::EmptyFrame`] for a frame without jobs; any dispatch
    /// failure of an individual job.
    pub fn run_frame(&self, dispatcher: &mut Dispatcher<'_>) -> Result<(), SchedulerError> {
        if self.jobs.is_empty() {
            return Err(TableError::EmptyFrame.into());
        }
        for job in &self.jobs {
            dispatcher.dispatch(job.slot, job.duration)?;
        }
        Ok(())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for job in &self.jobs {
            writeln!(f, "{job}")?;
        }
        Ok(())
    }
}

// ── FrameContainer ────────────────────────────────────────────────────────────

/// Non-empty frame sequence with a fixed frame size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameContainer {
    frames: Vec<Frame>,
    frame_duration: TimeDuration,
}

impl FrameContainer {
    /// # Errors
    /// [`TableError::NoFrames`], [`TableError::ZeroFrameDuration`], or
    /// [`TableError::EmptyFrame`] if any frame has no jobs.
    pub fn new(frames: Vec<Frame>, frame_duration: TimeDuration) -> Result<Self, TableError> {
        if frame_duration.is_zero() {
            return Err(TableError::ZeroFrameDuration);
        }
        if frames.is_empty() {
            return Err(TableError::NoFrames);
        }
        if frames.iter().any(Frame::is_empty) {
            return Err(TableError::EmptyFrame);
        }
        Ok(Self {
            frames,
            frame_duration,
        })
    }

    pub fn frame_duration(&self) -> TimeDuration {
        self.frame_duration
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn get_kth_frame(&self, k: usize) -> Result<&Frame, TableError> {
        self.frames.get(k).ok_or(TableError::IndexOutOfRange {
            index: k,
            len: self.frames.len(),
        })
    }

    /// Run frame `k` through `dispatcher`.
    pub fn run_frame(&self, k: usize, dispatcher: &mut Dispatcher<'_>) -> Result<(), SchedulerError> {
        trace!(frame = k, "running frame");
        self.get_kth_frame(k)?.run_frame(dispatcher)
    }
}

impl fmt::Display for FrameContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, frame) in self.frames.iter().enumerate() {
            writeln!(f, "Frame {k}:")?;
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
