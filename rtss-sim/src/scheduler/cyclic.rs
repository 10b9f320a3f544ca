/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cyclic executive over a FRAME_BASED table.
//!
//! One hyperperiod is one pass over the frame sequence: frames run in order
//! until the frame cursor wraps back to 0, then every task is reset.

use tracing::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::{RtScheduler, RunReport, SchedulerError};
use crate::hyperperiod::HyperperiodCalculator;
use crate::table::{SchedulingMode, TaskTable};
use crate::task::Task;
use crate::time;

pub struct CyclicExecutiveScheduler<'a> {
    tasks: &'a mut [Task],
    table: TaskTable,
}

impl<'a> CyclicExecutiveScheduler<'a> {
    /// # Errors
    /// [`SchedulerError::ModeMismatch`] if `table` is not FRAME_BASED.
    pub fn new(tasks: &'a mut [Task], table: TaskTable) -> Result<Self, SchedulerError> {
        let frames = table.frames().ok_or(SchedulerError::ModeMismatch {
            engine: "cyclic executive",
            required: SchedulingMode::FrameBased,
            actual: table.mode(),
        })?;

        let span = table.span();
        match HyperperiodCalculator::new().calculate(tasks) {
            Ok(info) if info.hyperperiod != span => warn!(
                frames_ms = time::to_ms(span),
                hyperperiod_ms = time::to_ms(info.hyperperiod),
                "frame sequence does not cover exactly one hyperperiod"
            ),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "hyperperiod unavailable, skipping span check"),
        }

        info!(
            frames = frames.len(),
            frame_ms = time::to_ms(frames.frame_duration()),
            tasks = tasks.len(),
            "CyclicExecutiveScheduler ready"
        );
        Ok(Self { tasks, table })
    }

    pub fn table(&self) -> &TaskTable {
        &self.table
    }
}

impl RtScheduler for CyclicExecutiveScheduler<'_> {
    fn run_scheduler(&mut self, cycles: u64) -> Result<RunReport, SchedulerError> {
        self.table.reset_k();
        let mut dispatcher = Dispatcher::new(&mut *self.tasks);

        for _ in 0..cycles {
            loop {
                debug!(frame = self.table.k(), now_ms = time::to_ms(dispatcher.now()), "frame start");
                self.table.current_frame()?.run_frame(&mut dispatcher)?;
                self.table.increment_k();
                if self.table.k() == 0 {
                    break;
                }
            }
            dispatcher.complete_cycle();
        }

        Ok(dispatcher.finish())
    }

    fn name(&self) -> &'static str {
        "cyclic executive"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
