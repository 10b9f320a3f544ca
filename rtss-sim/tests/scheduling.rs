/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end scheduling scenarios across table construction, the three
//! engines and the simulation file.

use std::io::Write;

use tempfile::NamedTempFile;

use rtss_sim::config::SimulationConfig;
use rtss_sim::scheduler::{
    reset_all, CyclicExecutiveScheduler, PriorityBasedScheduler, PriorityPolicy, RtScheduler,
    TableDrivenScheduler,
};
use rtss_sim::simulation;
use rtss_sim::table::{ScheduleSlot, TaskTable, TaskTableBuilder};
use rtss_sim::task::Task;
use rtss_sim::time::from_ms;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Periodic tasks with period 6 ms, ids 1.. in order.
fn task_set(wcets_ms: &[u64]) -> Vec<Task> {
    wcets_ms
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let mut t = Task::periodic(from_ms(0), from_ms(6), from_ms(c), None);
            t.set_id(i as u16 + 1).unwrap();
            t
        })
        .collect()
}

fn builder(raw: &[(u64, i32)]) -> TaskTableBuilder {
    let mut b = TaskTableBuilder::new();
    for &(t, id) in raw {
        b.add_raw_entry(id, from_ms(t)).unwrap();
    }
    b
}

fn frame_jobs(table: &TaskTable) -> Vec<Vec<(ScheduleSlot, u64)>> {
    table
        .frames()
        .unwrap()
        .iter()
        .map(|f| {
            f.jobs()
                .iter()
                .map(|j| (j.slot, j.duration.as_millis() as u64))
                .collect()
        })
        .collect()
}

const THREE_TASK_SCHEDULE: &[(u64, i32)] = &[(0, 1), (2, 2), (3, 3), (5, 0), (6, -1)];

// ── Frame packing ─────────────────────────────────────────────────────────────

#[test]
fn long_slots_are_split_across_frames() {
    let table = builder(THREE_TASK_SCHEDULE)
        .build_frame_based(from_ms(2))
        .unwrap();
    assert_eq!(
        frame_jobs(&table),
        vec![
            vec![(ScheduleSlot::Task(1), 2)],
            vec![(ScheduleSlot::Task(2), 1), (ScheduleSlot::Task(3), 1)],
            vec![(ScheduleSlot::Task(3), 1), (ScheduleSlot::Idle, 1)],
        ]
    );
    assert_eq!(table.span(), from_ms(6));
}

#[test]
fn unit_slots_pack_two_per_frame() {
    let table = builder(&[(0, 1), (1, 2), (2, 3), (3, 0), (4, -1)])
        .build_frame_based(from_ms(2))
        .unwrap();
    assert_eq!(
        frame_jobs(&table),
        vec![
            vec![(ScheduleSlot::Task(1), 1), (ScheduleSlot::Task(2), 1)],
            vec![(ScheduleSlot::Task(3), 1), (ScheduleSlot::Idle, 1)],
        ]
    );
}

// ── Static engines ────────────────────────────────────────────────────────────

#[test]
fn cyclic_executive_conserves_execution_time() {
    let mut tasks = task_set(&[2, 1, 2]);
    let table = builder(THREE_TASK_SCHEDULE)
        .build_frame_based(from_ms(2))
        .unwrap();
    let report = CyclicExecutiveScheduler::new(&mut tasks, table)
        .unwrap()
        .run_scheduler(5)
        .unwrap();

    assert_eq!(report.cycles_completed, 5);
    assert_eq!(report.idle_time, from_ms(5));
    assert_eq!(report.end_time, from_ms(30));
    for t in &tasks {
        assert_eq!(t.executed(), t.wcet() * 5, "T{}", t.id());
        assert_eq!(t.remaining(), t.wcet(), "T{} reset after cycle", t.id());
    }
}

#[test]
fn table_replay_is_deterministic() {
    let run = || {
        let mut tasks = task_set(&[2, 1, 2]);
        let table = builder(THREE_TASK_SCHEDULE).build_task_based().unwrap();
        let report = TableDrivenScheduler::new(&mut tasks, table)
            .unwrap()
            .run_scheduler(3)
            .unwrap();
        (report, tasks)
    };
    let (first, first_tasks) = run();
    let (second, second_tasks) = run();
    assert_eq!(first, second);
    assert_eq!(first_tasks, second_tasks);
}

#[test]
fn table_driven_and_cyclic_agree_on_totals() {
    let mut tasks = task_set(&[2, 1, 2]);
    let table = builder(THREE_TASK_SCHEDULE).build_task_based().unwrap();
    let by_table = TableDrivenScheduler::new(&mut tasks, table)
        .unwrap()
        .run_scheduler(4)
        .unwrap();

    reset_all(&mut tasks);
    let frames = builder(THREE_TASK_SCHEDULE)
        .build_frame_based(from_ms(2))
        .unwrap();
    let by_frames = CyclicExecutiveScheduler::new(&mut tasks, frames)
        .unwrap()
        .run_scheduler(4)
        .unwrap();

    for id in 1..=3 {
        assert_eq!(by_table.executed_by(id), by_frames.executed_by(id), "T{id}");
    }
    assert_eq!(by_table.idle_time, by_frames.idle_time);
    assert_eq!(by_table.end_time, by_frames.end_time);
}

// ── Priority engine ───────────────────────────────────────────────────────────

#[test]
fn rm_and_edf_differ_when_deadlines_and_periods_disagree() {
    let fresh = || {
        let mut tasks = vec![
            Task::periodic(from_ms(0), from_ms(10), from_ms(1), None),
            Task::periodic(from_ms(0), from_ms(4), from_ms(1), Some(from_ms(15))),
        ];
        for (i, t) in tasks.iter_mut().enumerate() {
            t.set_id(i as u16 + 1).unwrap();
        }
        tasks
    };

    let mut tasks = fresh();
    let rm = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::RateMonotonic)
        .run_scheduler(1)
        .unwrap();
    assert_eq!(
        rm.execution_order(),
        vec![ScheduleSlot::Task(2), ScheduleSlot::Task(1)]
    );

    let mut tasks = fresh();
    let edf = PriorityBasedScheduler::new(&mut tasks, PriorityPolicy::EarliestDeadlineFirst)
        .run_scheduler(1)
        .unwrap();
    assert_eq!(
        edf.execution_order(),
        vec![ScheduleSlot::Task(1), ScheduleSlot::Task(2)]
    );
    assert!(!rm.has_deadline_misses() && !edf.has_deadline_misses());
}

// ── Simulation file ───────────────────────────────────────────────────────────

#[test]
fn simulation_file_runs_end_to_end() {
    let yaml = r#"
policy: cyclic
cycles: 2
frame_size_ms: 2
tasks:
  - { kind: periodic, period_ms: 6, wcet_ms: 2 }
  - { kind: periodic, period_ms: 6, wcet_ms: 1 }
  - { kind: periodic, period_ms: 6, wcet_ms: 2 }
schedule:
  - { time_ms: 0, task_id: 1 }
  - { time_ms: 2, task_id: 2 }
  - { time_ms: 3, task_id: 3 }
  - { time_ms: 5, task_id: 0 }
  - { time_ms: 6, task_id: -1 }
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let mut config = SimulationConfig::load_from_file(file.path()).unwrap();
    let report = simulation::run(&mut config, false).unwrap();

    assert_eq!(report.cycles_completed, 2);
    assert_eq!(report.executed_by(3), from_ms(4));
    assert_eq!(config.tasks[0].executed(), from_ms(4));
    assert_eq!(report.end_time, from_ms(12));
}

#[test]
fn unknown_task_in_schedule_fails_the_run() {
    let yaml = r#"
policy: table
tasks:
  - { kind: periodic, period_ms: 4, wcet_ms: 1 }
schedule:
  - { time_ms: 0, task_id: 5 }
  - { time_ms: 1, task_id: -1 }
"#;
    let mut config = SimulationConfig::from_yaml_str(yaml).unwrap();
    let err = simulation::run(&mut config, false).unwrap_err();
    assert!(format!("{err:#}").contains("task 5"), "{err:#}");
}
