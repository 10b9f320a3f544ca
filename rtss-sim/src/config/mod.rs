//! Simulation file loading.
//!
//! One YAML file describes a whole simulation run:
//! ```yaml
//! policy: cyclic          # rm | dm | edf | llf | table | cyclic
//! cycles: 2
//! frame_size_ms: 2        # cyclic only; chosen automatically when absent
//! tasks:
//!   - { kind: periodic, phase_ms: 0, period_ms: 6, wcet_ms: 2 }
//!   - { kind: periodic, period_ms: 6, wcet_ms: 1, relative_deadline_ms: 4 }
//!   - { kind: aperiodic, arrival_ms: 3, wcet_ms: 2 }
//! schedule:               # table / cyclic only
//!   - { time_ms: 0, task_id: 1 }
//!   - { time_ms: 2, task_id: 2 }
//!   - { time_ms: 3, task_id: 0 }
//!   - { time_ms: 6, task_id: -1 }
//! ```
//!
//! Tasks get 1-based ids in file order, so `task_id: n` in the schedule
//! refers to the n-th task record.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::scheduler::PriorityPolicy;
use crate::table::{ScheduleSlot, TaskScheduleEntry, TaskTableBuilder};
use crate::task::Task;
use crate::time::{self, TimeDuration};

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SimulationFile {
    policy: Option<String>,
    #[serde(default = "default_cycles")]
    cycles: u64,
    frame_size_ms: Option<u64>,
    #[serde(default)]
    tasks: Vec<TaskRecord>,
    #[serde(default)]
    schedule: Vec<ScheduleRecord>,
}

fn default_cycles() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum TaskRecord {
    Periodic {
        #[serde(default)]
        phase_ms: u64,
        /// Required; checked after parsing for a clearer error message.
        period_ms: Option<u64>,
        wcet_ms: u64,
        relative_deadline_ms: Option<u64>,
    },
    Aperiodic {
        #[serde(default, alias = "phase_ms")]
        arrival_ms: u64,
        wcet_ms: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ScheduleRecord {
    time_ms: u64,
    task_id: i32,
}

// ── SimulationPolicy ──────────────────────────────────────────────────────────

/// Which engine drives the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPolicy {
    TableDriven,
    CyclicExecutive,
    Priority(PriorityPolicy),
}

impl SimulationPolicy {
    /// `"table"`, `"cyclic"`, or any [`PriorityPolicy`] name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" => Ok(SimulationPolicy::TableDriven),
            "cyclic" => Ok(SimulationPolicy::CyclicExecutive),
            other => PriorityPolicy::from_name(other)
                .map(SimulationPolicy::Priority)
                .with_context(|| {
                    format!("unknown policy '{name}' (valid: table, cyclic, rm, dm, edf, llf)")
                }),
        }
    }

    pub fn needs_schedule(self) -> bool {
        !matches!(self, SimulationPolicy::Priority(_))
    }
}

impl std::fmt::Display for SimulationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationPolicy::TableDriven => write!(f, "table"),
            SimulationPolicy::CyclicExecutive => write!(f, "cyclic"),
            SimulationPolicy::Priority(p) => write!(f, "{p}"),
        }
    }
}

// ── SimulationConfig ──────────────────────────────────────────────────────────

/// A parsed simulation file, converted to domain types.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub policy: SimulationPolicy,
    pub cycles: u64,
    pub frame_size: Option<TimeDuration>,
    /// Ids `1..=n` in file order.
    pub tasks: Vec<Task>,
    pub schedule: Vec<TaskScheduleEntry>,
}

impl SimulationConfig {
    /// Read and parse `path`.
    ///
    /// # Errors
    /// Unreadable file, malformed YAML, or any validation failure of
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading simulation from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open simulation file: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid simulation file: {}", path.display()))
    }

    /// Parse a simulation from YAML text.
    ///
    /// When `policy` is absent the run is table-driven if a schedule is given
    /// and rate-monotonic otherwise.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: SimulationFile =
            serde_yaml::from_str(content).context("Failed to parse simulation YAML")?;

        let tasks = file
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, record)| build_task(i + 1, record))
            .collect::<Result<Vec<_>>>()?;

        let schedule = file
            .schedule
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                ScheduleSlot::from_raw(r.task_id)
                    .map(|slot| TaskScheduleEntry::new(time::from_ms(r.time_ms), slot))
                    .with_context(|| format!("schedule entry {i}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let policy = match file.policy.as_deref() {
            Some(name) => SimulationPolicy::from_name(name)?,
            None if !schedule.is_empty() => SimulationPolicy::TableDriven,
            None => SimulationPolicy::Priority(PriorityPolicy::RateMonotonic),
        };

        if policy.needs_schedule() && schedule.is_empty() {
            bail!("policy '{policy}' requires a schedule");
        }
        if file.frame_size_ms == Some(0) {
            bail!("frame_size_ms must be greater than zero");
        }

        let config = Self {
            policy,
            cycles: file.cycles,
            frame_size: file.frame_size_ms.map(time::from_ms),
            tasks,
            schedule,
        };

        info!(
            policy = %config.policy,
            cycles = config.cycles,
            tasks = config.tasks.len(),
            schedule_entries = config.schedule.len(),
            "Simulation loaded"
        );
        for t in &config.tasks {
            debug!("  T{}: {}", t.id(), t);
        }
        Ok(config)
    }

    /// `true` if every task is periodic (and there is at least one).
    pub fn is_fully_periodic(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(Task::is_periodic)
    }

    /// A builder pre-filled with the schedule.
    pub fn table_builder(&self) -> TaskTableBuilder {
        let mut builder = TaskTableBuilder::new();
        for entry in &self.schedule {
            builder.add_entry(entry.slot, entry.start_time);
        }
        builder
    }
}

fn build_task(id: usize, record: TaskRecord) -> Result<Task> {
    let mut task = match record {
        TaskRecord::Periodic {
            phase_ms,
            period_ms,
            wcet_ms,
            relative_deadline_ms,
        } => {
            let Some(period_ms) = period_ms else {
                bail!("task {id}: periodic task requires period_ms");
            };
            Task::periodic(
                time::from_ms(phase_ms),
                time::from_ms(period_ms),
                time::from_ms(wcet_ms),
                relative_deadline_ms.map(time::from_ms),
            )
        }
        TaskRecord::Aperiodic {
            arrival_ms,
            wcet_ms,
        } => Task::aperiodic(time::from_ms(arrival_ms), time::from_ms(wcet_ms)),
    };
    let id = u16::try_from(id).with_context(|| format!("too many tasks ({id})"))?;
    task.set_id(id)?;
    Ok(task)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
