/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! GCD and checked LCM over raw integer time units.
//!
//! Free functions so that both the hyperperiod calculation and the
//! cyclic-executive frame-size search can share them.

use super::HyperperiodError;

/// Iterative Euclidean GCD.  `gcd(0, x) == x`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Checked LCM.  `Ok(0)` when either input is `0`.
///
/// Divides before multiplying; the multiplication itself is still checked and
/// reported as [`HyperperiodError::Overflow`].
pub fn lcm(a: u64, b: u64) -> Result<u64, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// LCM of every value in `values`; `Ok(0)` for an empty slice.
pub fn lcm_all(values: &[u64]) -> Result<u64, HyperperiodError> {
    let Some((&first, rest)) = values.split_first() else {
        return Ok(0);
    };
    rest.iter().try_fold(first, |acc, &v| lcm(acc, v))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
