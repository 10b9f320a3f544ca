/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Packing of a chronological schedule into fixed-size frames.
//!
//! Each entry lasts until the next entry's start time.  Slot durations are
//! poured into frames of size `F` in order; a slot that crosses a frame
//! boundary is split:
//!
//! ```text
//! F = 2     T1:2        T2:1   T3:2        Idle:1
//! schedule  |====|      |==|   |====|      |==|
//! frames    [ T1:2 ]  [ T2:1 T3:1 ]  [ T3:1 Idle:1 ]
//! ```
//!
//! The last entry only closes the previous slot.  A trailing partial frame is
//! kept, so the repacking is lossless.

use std::mem;

use tracing::debug;

use super::frame::{Frame, FrameJob};
use super::{ScheduleSlot, TableError, TaskScheduleEntry};
use crate::time::{self, TimeDuration, ZERO_DURATION};

/// Pack `schedule` into frames of `frame_duration`.
///
/// Every frame but the last sums to exactly `frame_duration`; the last sums
/// to at most `frame_duration`.  Zero-length slots (two entries with the same
/// start time) produce no job.
///
/// # Errors
/// * [`TableError::EmptySchedule`] / [`TableError::ZeroFrameDuration`].
/// * [`TableError::MisplacedResetMarker`] – a reset marker before the last entry.
/// * [`TableError::NonChronological`] – a start time earlier than its predecessor.
/// * [`TableError::NoFrames`] – the schedule covers no time at all.
pub fn pack_frames(
    schedule: &[TaskScheduleEntry],
    frame_duration: TimeDuration,
) -> Result<Vec<Frame>, TableError> {
    if schedule.is_empty() {
        return Err(TableError::EmptySchedule);
    }
    if frame_duration.is_zero() {
        return Err(TableError::ZeroFrameDuration);
    }

    let mut packer = FramePacker::new(frame_duration);
    for (index, pair) in schedule.windows(2).enumerate() {
        let (entry, next) = (&pair[0], &pair[1]);
        if entry.slot == ScheduleSlot::Reset {
            return Err(TableError::MisplacedResetMarker { index });
        }
        let duration = next.start_time.checked_sub(entry.start_time).ok_or(
            TableError::NonChronological {
                index: index + 1,
                previous: entry.start_time,
                start: next.start_time,
            },
        )?;
        packer.push(entry.slot, duration);
    }

    let frames = packer.finish();
    if frames.is_empty() {
        return Err(TableError::NoFrames);
    }
    debug!(
        frames = frames.len(),
        frame_ms = time::to_ms(frame_duration),
        "packed schedule into frames"
    );
    Ok(frames)
}

/// Accumulator of the frame currently being filled.
struct FramePacker {
    frame_duration: TimeDuration,
    filled: TimeDuration,
    jobs: Vec<FrameJob>,
    frames: Vec<Frame>,
}

impl FramePacker {
    fn new(frame_duration: TimeDuration) -> Self {
        Self {
            frame_duration,
            filled: ZERO_DURATION,
            jobs: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn push(&mut self, slot: ScheduleSlot, duration: TimeDuration) {
        if duration.is_zero() {
            return;
        }
        let filled = self.filled + duration;

        if filled < self.frame_duration {
            self.jobs.push(FrameJob::new(slot, duration));
            self.filled = filled;
            return;
        }
        if filled == self.frame_duration {
            self.jobs.push(FrameJob::new(slot, duration));
            self.flush();
            return;
        }

        // Crosses the boundary: top up the open frame, emit whole frames,
        // carry the rest into a new one.
        let head = self.frame_duration - self.filled;
        self.jobs.push(FrameJob::new(slot, head));
        self.flush();

        let mut rest = duration - head;
        while rest >= self.frame_duration {
            self.jobs.push(FrameJob::new(slot, self.frame_duration));
            self.flush();
            rest -= self.frame_duration;
        }
        if !rest.is_zero() {
            self.jobs.push(FrameJob::new(slot, rest));
            self.filled = rest;
        }
    }

    fn flush(&mut self) {
        self.frames.push(Frame::new(mem::take(&mut self.jobs)));
        self.filled = ZERO_DURATION;
    }

    fn finish(mut self) -> Vec<Frame> {
        if !self.jobs.is_empty() {
            self.flush();
        }
        self.frames
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
