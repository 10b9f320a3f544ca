/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use rtss_sim::config::{SimulationConfig, SimulationPolicy};
use rtss_sim::simulation;
use rtss_sim::time;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Real-time scheduling simulator.
///
/// Example:
///   rtss-sim --config sim.yaml --policy edf --cycles 4
#[derive(Debug, Parser)]
#[command(
    name = "rtss-sim",
    about = "Single-processor real-time scheduling simulator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML simulation file.
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Scheduling policy (table, cyclic, rm, dm, edf, llf); overrides the file.
    #[arg(short = 'p', long = "policy")]
    policy: Option<String>,

    /// Number of hyperperiods / cycles to simulate; overrides the file.
    #[arg(short = 'n', long = "cycles")]
    cycles: Option<u64>,

    /// Cyclic-executive frame size in milliseconds; overrides the file.
    #[arg(short = 'f', long = "frame-size-ms")]
    frame_size_ms: Option<u64>,

    /// Log the built task table / frames before running.
    #[arg(short = 't', long = "show-table", default_value_t = false)]
    show_table: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config = %cli.config.display(),
        policy = ?cli.policy,
        cycles = ?cli.cycles,
        frame_size_ms = ?cli.frame_size_ms,
        show_table = cli.show_table,
        "Configuration"
    );

    if let Err(e) = run(&cli) {
        error!("Simulation failed: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // ── Load simulation, apply CLI overrides ──────────────────────────────────
    let mut config = SimulationConfig::load_from_file(&cli.config)?;

    if let Some(name) = &cli.policy {
        config.policy = SimulationPolicy::from_name(name)?;
    }
    if let Some(cycles) = cli.cycles {
        config.cycles = cycles;
    }
    if let Some(ms) = cli.frame_size_ms {
        anyhow::ensure!(ms > 0, "--frame-size-ms must be greater than zero");
        config.frame_size = Some(time::from_ms(ms));
    }
    anyhow::ensure!(
        !config.policy.needs_schedule() || !config.schedule.is_empty(),
        "policy '{}' requires a schedule in {}",
        config.policy,
        cli.config.display()
    );

    // ── Run ───────────────────────────────────────────────────────────────────
    let report = simulation::run(&mut config, cli.show_table)?;

    // ── Summary ───────────────────────────────────────────────────────────────
    for task in &config.tasks {
        info!(
            "  [T{id}]  executed={exec}ms  ({task})",
            id = task.id(),
            exec = time::to_ms(task.executed()),
        );
    }
    info!(
        "  idle={idle}ms  busy={busy}ms  total={total}ms",
        idle = time::to_ms(report.idle_time),
        busy = time::to_ms(report.busy_time()),
        total = time::to_ms(report.end_time),
    );
    for miss in &report.deadline_misses {
        warn!(
            "  T{} missed its cycle-{} deadline at {}ms (completed {}ms)",
            miss.task_id,
            miss.cycle,
            time::to_ms(miss.deadline),
            time::to_ms(miss.completed_at),
        );
    }
    Ok(())
}
