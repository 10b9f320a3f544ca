/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Time primitives for the simulator.
//!
//! Simulated time is a plain [`Duration`]: a [`TimePoint`] is an offset from
//! the origin of the virtual clock (the start of the simulation run), and a
//! [`TimeDuration`] is a span between two such points.  Nothing in the crate
//! reads a wall clock.
//!
//! Task sets and schedule tables are expressed in whole milliseconds, so the
//! helpers below convert at millisecond granularity.

use std::time::Duration;

/// Length of a slot, a WCET, a period, ...
pub type TimeDuration = Duration;

/// Offset from the start of the simulation.
pub type TimePoint = Duration;

pub const ZERO_DURATION: TimeDuration = Duration::ZERO;

/// Build a duration from whole milliseconds.
pub fn from_ms(ms: u64) -> TimeDuration {
    Duration::from_millis(ms)
}

/// Whole milliseconds in `d` (sub-millisecond remainder is truncated).
///
/// Saturates at `u64::MAX` instead of wrapping.
pub fn to_ms(d: TimeDuration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// `later − earlier` in nanoseconds, negative when `later < earlier`.
///
/// Used for laxity, which goes negative once a job can no longer meet its
/// deadline.
pub fn signed_nanos_between(later: TimePoint, earlier: TimePoint) -> i128 {
    later.as_nanos() as i128 - earlier.as_nanos() as i128
}

// ── Tests ─────────────────────────────────────────────────────────────────────
