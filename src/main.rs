/*!
 * Scheduling Simulator - Demo Entry Point
 *
 * Loads configuration and a workload, drives the tick task until the run
 * completes, and prints the final timeline and run report as JSON.
 */

use futures::{Stream, StreamExt};
use miette::{IntoDiagnostic, WrapErr};
use sched_sim::{
    init_tracing, MemoryStore, ProcessSpec, RunReport, SimEvent, Simulation, SimulationConfig,
    SimulationTask, TimelineView,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Environment variable naming a JSON array of process specs
const WORKLOAD_ENV: &str = "SCHED_SIM_WORKLOAD";

#[derive(Serialize)]
struct Output {
    timeline: TimelineView,
    report: Option<RunReport>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    let config = SimulationConfig::load()?;
    let workload = load_workload()?;
    info!(
        policy = config.policy.as_str(),
        processes = workload.len(),
        "Scheduling simulator starting"
    );

    let store = Arc::new(MemoryStore::new());
    let mut simulation = Simulation::new(store, config)?;
    simulation.reset().await?;
    for spec in workload {
        simulation.submit(spec).await?;
    }

    let mut events = Box::pin(simulation.event_stream());
    let shared = Arc::new(Mutex::new(simulation));
    let task = SimulationTask::spawn(shared.clone()).await;
    task.start();

    let report = tokio::select! {
        report = wait_for_completion(&mut events) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted before the run completed");
            None
        }
    };

    task.shutdown().await;

    let timeline = shared.lock().await.view();
    let output = serde_json::to_string_pretty(&Output { timeline, report }).into_diagnostic()?;
    println!("{}", output);
    Ok(())
}

async fn wait_for_completion<S>(events: &mut S) -> Option<RunReport>
where
    S: Stream<Item = sched_sim::Event> + Unpin,
{
    while let Some(event) = events.next().await {
        if let SimEvent::Completed(report) = event.payload {
            return Some(*report);
        }
    }
    None
}

fn load_workload() -> miette::Result<Vec<ProcessSpec>> {
    match std::env::var(WORKLOAD_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            let raw = std::fs::read_to_string(&path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading workload {}", path))?;
            serde_json::from_str(&raw)
                .into_diagnostic()
                .wrap_err("workload must be a JSON array of process specs")
        }
        _ => Ok(demo_workload()),
    }
}

fn demo_workload() -> Vec<ProcessSpec> {
    vec![
        ProcessSpec::new(1, 4).with_priority(2),
        ProcessSpec::new(2, 2).with_priority(1),
        ProcessSpec::new(3, 6).with_priority(3).with_io(3, 2),
        ProcessSpec::new(4, 3).with_arrival(5),
    ]
}
