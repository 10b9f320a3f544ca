/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! rtss-sim – single-processor real-time scheduling simulator
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── time          – virtual-clock time aliases and ms helpers
//! ├── task          – Task entity (periodic / aperiodic / idle)
//! ├── table/        – schedule entries, TaskTable, frames, frame packing
//! ├── scheduler/    – table-driven, cyclic-executive and priority engines
//! ├── hyperperiod/  – LCM / GCD helpers
//! ├── config/       – YAML simulation file
//! └── simulation    – policy → engine wiring for one run
//! ```

pub mod config;
pub mod hyperperiod;
pub mod scheduler;
pub mod simulation;
pub mod table;
pub mod task;
pub mod time;
