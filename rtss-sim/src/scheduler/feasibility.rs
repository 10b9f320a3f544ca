/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability checks for a periodic task set.
//!
//! # Liu & Layland
//! Under Rate Monotonic priorities, `n` independent periodic tasks are
//! guaranteed schedulable on one processor if
//!
//! $$U = \sum_{i=1}^{n} \frac{C_i}{T_i} \leq n \left(2^{1/n} - 1\right)$$
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! Between the bound and 1.0 the set may or may not be schedulable.  The
//! priority engine only warns; nothing here rejects a task set.
//!
//! # Cyclic-executive frame size
//! A frame size `f` is acceptable when
//!
//! 1. `f ≥ max(Cᵢ)` – every job fits in one frame,
//! 2. `f` divides at least one period `Tᵢ`,
//! 3. `2f − gcd(Tᵢ, f) ≤ Dᵢ` for every task – a frame boundary lies between
//!    each release and its deadline.

use crate::hyperperiod::math::gcd;
use crate::task::Task;
use crate::time::{self, TimeDuration};

// ── Utilisation ───────────────────────────────────────────────────────────────

/// Liu & Layland utilisation bound for `n` tasks: `n × (2^(1/n) − 1)`.
///
/// `1.0` for `n = 1`, `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// `Some(total_utilisation)` if `tasks` exceeds the Liu & Layland bound,
/// `None` if the set is provably RM-schedulable.
///
/// Non-periodic tasks and zero periods are left out of the sum.
pub fn check_liu_layland(tasks: &[&Task]) -> Option<f64> {
    let feasible: Vec<&Task> = tasks
        .iter()
        .copied()
        .filter(|t| t.period().is_some_and(|p| !p.is_zero()))
        .collect();

    if feasible.is_empty() {
        return None;
    }

    let total_u: f64 = feasible.iter().map(|t| t.utilization()).sum();
    let bound = liu_layland_bound(feasible.len());

    if total_u > bound {
        Some(total_u)
    } else {
        None
    }
}

/// Sum of `wcet / period` over the periodic tasks.
pub fn total_utilization(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::utilization).sum()
}

// ── Frame size ────────────────────────────────────────────────────────────────

/// Whole-millisecond frame sizes satisfying all three cyclic-executive
/// constraints, ascending.  Empty if the set has no periodic task.
pub fn frame_size_candidates(tasks: &[Task]) -> Vec<TimeDuration> {
    let periodic: Vec<(u64, u64, u64)> = tasks
        .iter()
        .filter_map(|t| {
            let period = time::to_ms(t.period()?);
            let deadline = time::to_ms(t.relative_deadline()?);
            (period > 0).then(|| (period, deadline, ceil_ms(t.wcet())))
        })
        .collect();

    let Some(max_period) = periodic.iter().map(|&(p, _, _)| p).max() else {
        return Vec::new();
    };
    let max_wcet = periodic.iter().map(|&(_, _, c)| c).max().unwrap_or(0).max(1);

    (max_wcet..=max_period)
        .filter(|&f| periodic.iter().any(|&(p, _, _)| p % f == 0))
        .filter(|&f| {
            periodic
                .iter()
                .all(|&(p, d, _)| 2 * f - gcd(p, f) <= d)
        })
        .map(time::from_ms)
        .collect()
}

/// Largest acceptable frame size, if any.
pub fn select_frame_size(tasks: &[Task]) -> Option<TimeDuration> {
    frame_size_candidates(tasks).last().copied()
}

fn ceil_ms(d: TimeDuration) -> u64 {
    let ms = time::to_ms(d);
    if time::from_ms(ms) < d {
        ms + 1
    } else {
        ms
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
