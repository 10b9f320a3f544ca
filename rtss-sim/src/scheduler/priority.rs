/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Priority-based dispatch (RM, DM, EDF, LLF).
//!
//! A single engine parameterised by a [`Comparator`].  Priorities are the
//! stable-sorted order of the task indices:
//!
//! | Policy | Key (ascending = higher priority) | Recomputed |
//! |---|---|---|
//! | RM  | period | never |
//! | DM  | relative deadline | never |
//! | EDF | absolute deadline in the current cycle | every cycle |
//! | LLF | laxity at the cycle start | every cycle |
//!
//! The comparator only decides between two periodic tasks.  A periodic task
//! always ranks ahead of a non-periodic one; two non-periodic tasks are
//! ordered by WCET, shortest first.
//!
//! # Dispatch
//! Non-preemptive.  Within a cycle the engine repeatedly picks the
//! highest-priority task that still has work and is released, and runs it to
//! completion.  If nothing is released yet the clock idles forward to the
//! next release.  The cycle ends once no task has work left; then all tasks
//! are reset.

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::feasibility::{check_liu_layland, liu_layland_bound, total_utilization};
use super::{RtScheduler, RunReport, SchedulerError};
use crate::task::Task;
use crate::time::{self, TimePoint, ZERO_DURATION};

// ── Comparator ────────────────────────────────────────────────────────────────

/// Where the simulation stands when priorities are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityContext {
    pub now: TimePoint,
    pub cycle: u64,
}

impl PriorityContext {
    pub const START: PriorityContext = PriorityContext {
        now: ZERO_DURATION,
        cycle: 0,
    };
}

/// Orders two periodic tasks; `Less` means `a` has the higher priority.
pub type Comparator = fn(&Task, &Task, &PriorityContext) -> Ordering;

pub fn rate_monotonic(a: &Task, b: &Task, _ctx: &PriorityContext) -> Ordering {
    a.period().cmp(&b.period())
}

pub fn deadline_monotonic(a: &Task, b: &Task, _ctx: &PriorityContext) -> Ordering {
    a.relative_deadline().cmp(&b.relative_deadline())
}

pub fn earliest_deadline_first(a: &Task, b: &Task, ctx: &PriorityContext) -> Ordering {
    a.deadline_at(ctx.cycle).cmp(&b.deadline_at(ctx.cycle))
}

pub fn least_laxity_first(a: &Task, b: &Task, ctx: &PriorityContext) -> Ordering {
    a.laxity(ctx.now, ctx.cycle)
        .cmp(&b.laxity(ctx.now, ctx.cycle))
}

/// Full task ordering: periodic first, then `cmp` or WCET.
fn compare_tasks(a: &Task, b: &Task, cmp: Comparator, ctx: &PriorityContext) -> Ordering {
    match (a.is_periodic(), b.is_periodic()) {
        (true, true) => cmp(a, b, ctx),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.wcet().cmp(&b.wcet()),
    }
}

/// Task indices sorted by priority, highest first.  Stable, so equal keys
/// keep their list order.
pub fn rank_tasks(tasks: &[Task], cmp: Comparator, ctx: &PriorityContext) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| compare_tasks(&tasks[a], &tasks[b], cmp, ctx));
    order
}

// ── PriorityPolicy ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityPolicy {
    RateMonotonic,
    DeadlineMonotonic,
    EarliestDeadlineFirst,
    LeastLaxityFirst,
}

impl PriorityPolicy {
    /// Parse `"rm"`, `"dm"`, `"edf"` or `"llf"` (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, SchedulerError> {
        match name.to_ascii_lowercase().as_str() {
            "rm" => Ok(PriorityPolicy::RateMonotonic),
            "dm" => Ok(PriorityPolicy::DeadlineMonotonic),
            "edf" => Ok(PriorityPolicy::EarliestDeadlineFirst),
            "llf" => Ok(PriorityPolicy::LeastLaxityFirst),
            _ => Err(SchedulerError::UnknownPolicy(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PriorityPolicy::RateMonotonic => "rm",
            PriorityPolicy::DeadlineMonotonic => "dm",
            PriorityPolicy::EarliestDeadlineFirst => "edf",
            PriorityPolicy::LeastLaxityFirst => "llf",
        }
    }

    /// EDF and LLF recompute priorities every cycle.
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            PriorityPolicy::EarliestDeadlineFirst | PriorityPolicy::LeastLaxityFirst
        )
    }

    pub fn comparator(self) -> Comparator {
        match self {
            PriorityPolicy::RateMonotonic => rate_monotonic,
            PriorityPolicy::DeadlineMonotonic => deadline_monotonic,
            PriorityPolicy::EarliestDeadlineFirst => earliest_deadline_first,
            PriorityPolicy::LeastLaxityFirst => least_laxity_first,
        }
    }
}

impl fmt::Display for PriorityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── PriorityBasedScheduler ────────────────────────────────────────────────────

pub struct PriorityBasedScheduler<'a> {
    tasks: &'a mut [Task],
    comparator: Comparator,
    dynamic: bool,
    /// Task indices, highest priority first.
    order: Vec<usize>,
}

impl<'a> PriorityBasedScheduler<'a> {
    /// Scheduler for one of the built-in policies.
    ///
    /// Logs a warning when the periodic task set is not guaranteed
    /// schedulable: above the Liu & Layland bound for RM/DM, above a total
    /// utilisation of 1.0 for EDF/LLF.  The scheduler is still returned.
    pub fn new(tasks: &'a mut [Task], policy: PriorityPolicy) -> Self {
        log_feasibility(tasks, policy);
        let scheduler = Self::with_comparator(tasks, policy.comparator(), policy.is_dynamic());
        info!(
            policy = %policy,
            order = ?scheduler.order,
            "priorities assigned"
        );
        scheduler
    }

    /// Scheduler with a custom comparator.  `dynamic` selects whether
    /// priorities are recomputed at the start of every cycle.
    pub fn with_comparator(tasks: &'a mut [Task], comparator: Comparator, dynamic: bool) -> Self {
        let order = rank_tasks(tasks, comparator, &PriorityContext::START);
        Self {
            tasks,
            comparator,
            dynamic,
            order,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Task indices, highest priority first, as of the last computation.
    pub fn priority_order(&self) -> &[usize] {
        &self.order
    }

    /// 1-based priority rank of task `index` (1 = highest).
    pub fn priority_of(&self, index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == index).map(|p| p + 1)
    }

    /// Recompute priorities for `ctx`.
    pub fn compute_priorities(&mut self, ctx: &PriorityContext) {
        self.order = rank_tasks(&*self.tasks, self.comparator, ctx);
        debug!(cycle = ctx.cycle, now_ms = time::to_ms(ctx.now), order = ?self.order, "priorities computed");
    }

    pub fn tasks(&self) -> &[Task] {
        &*self.tasks
    }
}

impl RtScheduler for PriorityBasedScheduler<'_> {
    fn run_scheduler(&mut self, cycles: u64) -> Result<RunReport, SchedulerError> {
        if self.tasks.is_empty() {
            info!("no tasks to schedule");
            return Ok(RunReport::default());
        }

        let mut dispatcher = Dispatcher::new(&mut *self.tasks);

        for cycle in 0..cycles {
            if self.dynamic {
                let ctx = PriorityContext {
                    now: dispatcher.now(),
                    cycle,
                };
                self.order = rank_tasks(dispatcher.tasks(), self.comparator, &ctx);
                debug!(cycle, order = ?self.order, "priorities recomputed");
            }

            loop {
                let now = dispatcher.now();
                let ready = self.order.iter().copied().find(|&i| {
                    let t = &dispatcher.tasks()[i];
                    has_work(t) && t.release_at(cycle) <= now
                });

                if let Some(index) = ready {
                    dispatcher.run_to_completion(index)?;
                    dispatcher.check_deadline(index, cycle);
                    continue;
                }

                let next_release = dispatcher
                    .tasks()
                    .iter()
                    .filter(|t| has_work(t))
                    .map(|t| t.release_at(cycle))
                    .min();
                match next_release {
                    Some(release) => dispatcher.idle_until(release),
                    None => break,
                }
            }

            dispatcher.complete_cycle();
        }

        Ok(dispatcher.finish())
    }

    fn name(&self) -> &'static str {
        "priority-based"
    }
}

/// Released-or-not, does the task still owe execution this cycle?
fn has_work(task: &Task) -> bool {
    !task.is_idle() && !task.remaining().is_zero()
}

fn log_feasibility(tasks: &[Task], policy: PriorityPolicy) {
    let periodic: Vec<&Task> = tasks.iter().filter(|t| t.is_periodic()).collect();
    if policy.is_dynamic() {
        let u = total_utilization(tasks);
        if u > 1.0 {
            warn!(
                policy = %policy,
                utilization = u,
                "periodic utilization exceeds 1.0, deadlines will be missed"
            );
        }
    } else if let Some(u) = check_liu_layland(&periodic) {
        warn!(
            policy = %policy,
            utilization = u,
            bound = liu_layland_bound(periodic.len()),
            task_count = periodic.len(),
            "task set may not be schedulable (utilization exceeds Liu & Layland bound)"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ScheduleSlot;
    use crate::time::from_ms;
    use std::time::Duration;

    fn numbered(mut tasks: Vec<Task>) -> Vec<Task> {
        for (i, t) in tasks.iter_mut().enumerate() {
            t.set_id(i as u16 + 1).unwrap();
        }
        tasks
    }

    fn periodic(phase: u64, period: u64, wcet: u64, deadline: Option<u64>) -> Task {
        Task::periodic(
            from_ms(phase),
            from_ms(period),
            from_ms(wcet),
            deadline.map(from_ms),
        )
    }

    // ── Policy names ──────────────────────────────────────────────────────────

    #[test]
    fn policy_from_name() {
        assert_eq!(PriorityPolicy::from_name("rm").unwrap(), PriorityPolicy::RateMonotonic);
        assert_eq!(PriorityPolicy::from_name("DM").unwrap(), PriorityPolicy::DeadlineMonotonic);
        assert_eq!(
            PriorityPolicy::from_name("edf").unwrap(),
            PriorityPolicy::EarliestDeadlineFirst
        );
        assert_eq!(PriorityPolicy::from_name("llf").unwrap(), PriorityPolicy::LeastLaxityFirst);
        assert_eq!(
            PriorityPolicy::from_name("fifo").unwrap_err(),
            SchedulerError::UnknownPolicy("fifo".to_string())
        );
    }

    #[test]
    fn only_edf_and_llf_are_dynamic() {
        assert!(!PriorityPolicy::RateMonotonic.is_dynamic());
        assert!(!PriorityPolicy::DeadlineMonotonic.is_dynamic());
        assert!(PriorityPolicy::EarliestDeadlineFirst.is_dynamic());
        assert!(PriorityPolicy::LeastLaxityFirst.is_dynamic());
    }

    // ── Ranking ───────────────────────────────────────────────────────────────

    #[test]
    fn rm_ranks_shorter_period_first() {
        let mut tasks = numbered(vec![
            periodic(0, 20, 1, None),
            periodic(0, 5, 1, None),
            periodic(0, 10, 1, None),
        ]);
        let s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        assert_eq!(s.priority_order(), &[1, 2, 0]);
        assert_eq!(s.priority_of(1), Some(1));
        assert_eq!(s.priority_of(0), Some(3));
        assert_eq!(s.priority_of(7), None);
    }

    #[test]
    fn dm_ranks_shorter_relative_deadline_first() {
        let mut tasks = numbered(vec![
            periodic(0, 5, 1, Some(5)),
            periodic(0, 20, 1, Some(3)),
        ]);
        let s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::DeadlineMonotonic);
        assert_eq!(s.priority_order(), &[1, 0]);
    }

    #[test]
    fn periodic_tasks_rank_ahead_of_aperiodic() {
        let mut tasks = numbered(vec![
            Task::aperiodic(from_ms(0), from_ms(3)),
            periodic(0, 100, 9, None),
            Task::aperiodic(from_ms(0), from_ms(1)),
        ]);
        let s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        // periodic first, then aperiodic by ascending WCET
        assert_eq!(s.priority_order(), &[1, 2, 0]);
    }

    #[test]
    fn equal_keys_keep_list_order() {
        let mut tasks = numbered(vec![
            periodic(0, 10, 3, None),
            periodic(0, 10, 1, None),
            periodic(0, 10, 2, None),
        ]);
        let s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        assert_eq!(s.priority_order(), &[0, 1, 2]);
    }

    #[test]
    fn llf_ranks_by_laxity() {
        // laxity at t=0: T1 = 10 - 6 = 4, T2 = 8 - 1 = 7
        let tasks = vec![periodic(0, 10, 6, None), periodic(0, 8, 1, None)];
        let order = rank_tasks(&tasks, least_laxity_first, &PriorityContext::START);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn custom_comparator_is_used() {
        fn longest_wcet_first(a: &Task, b: &Task, _: &PriorityContext) -> Ordering {
            b.wcet().cmp(&a.wcet())
        }
        let mut tasks = numbered(vec![periodic(0, 10, 1, None), periodic(0, 10, 4, None)]);
        let s = PriorityBasedScheduler::with_comparator(&mut tasks, longest_wcet_first, false);
        assert_eq!(s.priority_order(), &[1, 0]);
        assert!(!s.is_dynamic());
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_task_list_is_a_no_op() {
        let mut tasks: Vec<Task> = Vec::new();
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::EarliestDeadlineFirst);
        let report = s.run_scheduler(10).unwrap();
        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn rm_runs_each_task_once_per_cycle() {
        let mut tasks = numbered(vec![periodic(0, 10, 2, None), periodic(0, 5, 1, None)]);
        {
            let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
            let report = s.run_scheduler(1).unwrap();
            assert_eq!(
                report.execution_order(),
                vec![ScheduleSlot::Task(2), ScheduleSlot::Task(1)]
            );
            assert_eq!(report.cycles_completed, 1);
            assert_eq!(report.end_time, from_ms(3));
        }
        assert!(tasks.iter().all(|t| t.remaining() == t.wcet()));
    }

    #[test]
    fn idles_until_next_release() {
        let mut tasks = numbered(vec![periodic(4, 10, 2, None)]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        let report = s.run_scheduler(2).unwrap();
        // cycle 0: idle 0..4, T1 4..6; cycle 1: idle 6..14, T1 14..16
        assert_eq!(
            report.execution_order(),
            vec![
                ScheduleSlot::Idle,
                ScheduleSlot::Task(1),
                ScheduleSlot::Idle,
                ScheduleSlot::Task(1),
            ]
        );
        assert_eq!(report.idle_time, from_ms(12));
        assert_eq!(report.end_time, from_ms(16));
    }

    #[test]
    fn no_preemption_by_later_release() {
        // T2 (higher RM priority) is released at 1 while T1 runs 0..5.
        let mut tasks = numbered(vec![periodic(0, 20, 5, None), periodic(1, 10, 1, None)]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        let report = s.run_scheduler(1).unwrap();
        assert_eq!(report.trace[0].slot, ScheduleSlot::Task(1));
        assert_eq!(report.trace[0].duration, from_ms(5));
        assert_eq!(report.trace[1].slot, ScheduleSlot::Task(2));
        assert_eq!(report.trace[1].start, from_ms(5));
    }

    #[test]
    fn aperiodic_waits_for_arrival() {
        let mut tasks = numbered(vec![Task::aperiodic(from_ms(3), from_ms(2))]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::EarliestDeadlineFirst);
        let report = s.run_scheduler(1).unwrap();
        assert_eq!(report.trace[1].start, from_ms(3));
        assert_eq!(report.executed_by(1), from_ms(2));
    }

    #[test]
    fn late_completion_is_reported_not_fatal() {
        // T2 waits behind T1 and finishes at 4 ms, past its 3 ms deadline.
        let mut tasks = numbered(vec![periodic(0, 10, 3, None), periodic(0, 20, 1, Some(3))]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        let report = s.run_scheduler(1).unwrap();
        assert_eq!(report.deadline_misses.len(), 1);
        assert_eq!(report.deadline_misses[0].task_id, 2);
        assert_eq!(report.deadline_misses[0].completed_at, from_ms(4));
        assert_eq!(report.cycles_completed, 1);
    }

    #[test]
    fn short_period_jobs_are_not_late_behind_long_cycles() {
        // U = 0.11. Cycle 1 ends when T2 completes at 101 ms, so T1's cycle-2
        // job (released at 20 ms) only starts then.
        let mut tasks = numbered(vec![periodic(0, 10, 1, None), periodic(0, 100, 1, None)]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        let report = s.run_scheduler(3).unwrap();

        assert_eq!(report.cycles_completed, 3);
        let t1_starts: Vec<_> = report
            .trace
            .iter()
            .filter(|r| r.slot == ScheduleSlot::Task(1))
            .map(|r| r.start)
            .collect();
        assert_eq!(t1_starts, vec![from_ms(0), from_ms(10), from_ms(101)]);
        assert!(!report.has_deadline_misses(), "{:?}", report.deadline_misses);
    }

    #[test]
    fn saturated_release_fails_instead_of_overflowing() {
        let mut tasks = numbered(vec![Task::periodic(
            Duration::MAX,
            from_ms(10),
            from_ms(1),
            None,
        )]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        assert!(matches!(
            s.run_scheduler(1).unwrap_err(),
            SchedulerError::ClockOverflow { now, .. } if now == Duration::MAX
        ));
    }

    #[test]
    fn edf_reorders_between_cycles() {
        // cycle 0: deadlines T1 = 10, T2 = 15  → T1 first
        // cycle 1: deadlines T1 = 20, T2 = 19  → T2 first
        let mut tasks = numbered(vec![periodic(0, 10, 1, None), periodic(0, 4, 1, Some(15))]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::EarliestDeadlineFirst);
        assert_eq!(s.priority_order(), &[0, 1]);

        let report = s.run_scheduler(2).unwrap();
        assert_eq!(s.priority_order(), &[1, 0]);
        assert_eq!(
            report.execution_order(),
            vec![
                ScheduleSlot::Task(1),
                ScheduleSlot::Task(2),
                ScheduleSlot::Idle,
                ScheduleSlot::Task(2),
                ScheduleSlot::Idle,
                ScheduleSlot::Task(1),
            ]
        );
    }

    #[test]
    fn static_priorities_survive_cycles() {
        let mut tasks = numbered(vec![periodic(0, 10, 1, None), periodic(0, 4, 1, Some(15))]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic);
        let before = s.priority_order().to_vec();
        s.run_scheduler(3).unwrap();
        assert_eq!(s.priority_order(), before.as_slice());
    }

    #[test]
    fn compute_priorities_reflects_context() {
        let mut tasks = numbered(vec![periodic(0, 10, 1, None), periodic(0, 4, 1, Some(15))]);
        let mut s = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::EarliestDeadlineFirst);
        s.compute_priorities(&PriorityContext {
            now: from_ms(10),
            cycle: 1,
        });
        assert_eq!(s.priority_order(), &[1, 0]);
        assert_eq!(s.tasks().len(), 2);
    }
}
