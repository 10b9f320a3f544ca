/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One simulation run: table construction and engine selection for a loaded
//! [`SimulationConfig`].

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{SimulationConfig, SimulationPolicy};
use crate::scheduler::feasibility::select_frame_size;
use crate::scheduler::{
    CyclicExecutiveScheduler, PriorityBasedScheduler, RtScheduler, RunReport,
    TableDrivenScheduler,
};
use crate::table::TaskTable;
use crate::time;

/// Build the table the configured policy runs from; `None` for priority
/// policies.
///
/// Cyclic mode without an explicit frame size uses
/// [`select_frame_size`] on the task set.
pub fn build_table(config: &SimulationConfig) -> Result<Option<TaskTable>> {
    let table = match config.policy {
        SimulationPolicy::TableDriven => config
            .table_builder()
            .build_task_based()
            .context("Failed to build task table")?,
        SimulationPolicy::CyclicExecutive => {
            let frame = match config.frame_size {
                Some(f) => f,
                None => {
                    let f = select_frame_size(&config.tasks).context(
                        "no frame_size_ms given and no frame size satisfies the cyclic-executive constraints",
                    )?;
                    info!(frame_ms = time::to_ms(f), "frame size selected automatically");
                    f
                }
            };
            config
                .table_builder()
                .build_frame_based(frame)
                .context("Failed to build frame table")?
        }
        SimulationPolicy::Priority(_) => return Ok(None),
    };
    Ok(Some(table))
}

/// Run `config.cycles` cycles of the configured policy against
/// `config.tasks`.
///
/// With `show_table` the built table is logged before the run starts.
pub fn run(config: &mut SimulationConfig, show_table: bool) -> Result<RunReport> {
    let table = build_table(config)?;
    if let (true, Some(t)) = (show_table, &table) {
        info!("Task table ({}):\n{}", t.mode(), t);
    }

    let cycles = config.cycles;
    let tasks = config.tasks.as_mut_slice();
    let mut scheduler: Box<dyn RtScheduler + '_> = match (config.policy, table) {
        (SimulationPolicy::Priority(policy), _) => {
            Box::new(PriorityBasedScheduler::new(tasks, policy))
        }
        (SimulationPolicy::TableDriven, Some(table)) => {
            Box::new(TableDrivenScheduler::new(tasks, table)?)
        }
        (SimulationPolicy::CyclicExecutive, Some(table)) => {
            Box::new(CyclicExecutiveScheduler::new(tasks, table)?)
        }
        (policy, None) => anyhow::bail!("no table built for policy '{policy}'"),
    };

    info!(engine = scheduler.name(), cycles, "=== Simulation start ===");
    let report = scheduler
        .run_scheduler(cycles)
        .with_context(|| format!("{} scheduler aborted", scheduler.name()))?;
    info!(
        cycles = report.cycles_completed,
        end_ms = time::to_ms(report.end_time),
        idle_ms = time::to_ms(report.idle_time),
        deadline_misses = report.deadline_misses.len(),
        "=== Simulation complete ==="
    );
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SchedulingMode;
    use crate::time::from_ms;

    const TASKS: &str = r#"
tasks:
  - { kind: periodic, period_ms: 6, wcet_ms: 2 }
  - { kind: periodic, period_ms: 6, wcet_ms: 1 }
schedule:
  - { time_ms: 0, task_id: 1 }
  - { time_ms: 2, task_id: 2 }
  - { time_ms: 3, task_id: 0 }
  - { time_ms: 6, task_id: -1 }
"#;

    fn config(policy: &str, extra: &str) -> SimulationConfig {
        SimulationConfig::from_yaml_str(&format!("policy: {policy}\ncycles: 3\n{extra}{TASKS}"))
            .unwrap()
    }

    #[test]
    fn table_policy_builds_task_based_table() {
        let table = build_table(&config("table", "")).unwrap().unwrap();
        assert_eq!(table.mode(), SchedulingMode::TaskBased);
    }

    #[test]
    fn cyclic_policy_uses_given_frame_size() {
        let table = build_table(&config("cyclic", "frame_size_ms: 3\n"))
            .unwrap()
            .unwrap();
        assert_eq!(table.frame_duration(), Some(from_ms(3)));
    }

    #[test]
    fn cyclic_policy_selects_frame_size() {
        let table = build_table(&config("cyclic", "")).unwrap().unwrap();
        // candidates for (6, 2), (6, 1): 2, 3, 6 → largest
        assert_eq!(table.frame_duration(), Some(from_ms(6)));
    }

    #[test]
    fn priority_policy_has_no_table() {
        assert!(build_table(&config("edf", "")).unwrap().is_none());
    }

    #[test]
    fn every_policy_runs_to_completion() {
        for policy in ["table", "cyclic", "rm", "dm", "edf", "llf"] {
            let mut cfg = config(policy, "");
            let report = run(&mut cfg, true).unwrap();
            assert_eq!(report.cycles_completed, 3, "{policy}");
            assert_eq!(report.executed_by(1), from_ms(6), "{policy}");
            assert_eq!(report.executed_by(2), from_ms(3), "{policy}");
        }
    }
}
