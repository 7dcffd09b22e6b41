/*!
 * Simulation Task - Periodic Tick Driver
 *
 * Background task that ticks the simulation once per period and applies
 * control commands between ticks. A whole tick runs while the simulation
 * lock is held, so readers never observe a partial tick.
 *
 * # Graceful-with-Fallback Shutdown
 *
 * `shutdown().await` stops the loop and waits for it. If the handle is
 * dropped without it, `Drop` aborts the task and logs a warning.
 */

use super::engine::{Simulation, TickOutcome};
use crate::core::errors::SimError;
use crate::core::limits::MIN_TICK_PERIOD;
use crate::scheduler::PolicyKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Shared handle to a simulation
pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Control messages for the simulation task
#[derive(Debug)]
pub enum SimulationCommand {
    /// Admit due processes and start ticking
    Start,
    Pause,
    Resume,
    /// Clear the run; replies once the tables are cleared
    Reset(Option<oneshot::Sender<Result<(), SimError>>>),
    /// Run one tick now, even when paused
    Step,
    SetPolicy(PolicyKind),
    /// Change the tick period
    SetPeriod(Duration),
    Shutdown,
}

/// Handle to the tick driver task
pub struct SimulationTask {
    command_tx: mpsc::UnboundedSender<SimulationCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl SimulationTask {
    /// Spawn the driver with the simulation's configured tick period
    pub async fn spawn(simulation: SharedSimulation) -> Self {
        let period = simulation.lock().await.config().tick_period();
        Self::spawn_with_period(simulation, period)
    }

    pub fn spawn_with_period(simulation: SharedSimulation, period: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shutdown_initiated = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(async move {
            run_tick_loop(simulation, period, command_rx).await;
        });

        info!(period_ms = period.as_millis() as u64, "Simulation task spawned");

        Self {
            command_tx,
            handle: Some(handle),
            shutdown_initiated,
        }
    }

    pub fn start(&self) {
        let _ = self.command_tx.send(SimulationCommand::Start);
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(SimulationCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.command_tx.send(SimulationCommand::Resume);
    }

    pub fn step(&self) {
        let _ = self.command_tx.send(SimulationCommand::Step);
    }

    pub fn set_policy(&self, policy: PolicyKind) {
        let _ = self.command_tx.send(SimulationCommand::SetPolicy(policy));
    }

    pub fn set_period(&self, period: Duration) {
        let _ = self.command_tx.send(SimulationCommand::SetPeriod(period));
    }

    /// Reset the run and wait until the tables are cleared
    pub async fn reset(&self) -> Result<(), SimError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(SimulationCommand::Reset(Some(tx)))
            .map_err(|_| SimError::Internal("simulation task is not running".into()))?;
        rx.await
            .map_err(|_| SimError::Internal("simulation task dropped the reset reply".into()))?
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.shutdown_initiated.store(true, Ordering::SeqCst);
        let _ = self.command_tx.send(SimulationCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Simulation task shutdown error");
            } else {
                info!("Simulation task shutdown complete");
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let period = period.max(MIN_TICK_PERIOD);
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_tick_loop(
    simulation: SharedSimulation,
    period: Duration,
    mut command_rx: mpsc::UnboundedReceiver<SimulationCommand>,
) {
    let mut interval = ticker(period);
    debug!(period_ms = period.as_millis() as u64, "Tick loop started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut sim = simulation.lock().await;
                match sim.tick().await {
                    Ok(TickOutcome::Advanced(report)) => {
                        trace!(tick = report.tick, running = ?report.running, "Tick applied");
                    }
                    Ok(TickOutcome::Paused) => {}
                    // Journaled; the next period finishes the same tick
                    Err(e) => warn!(error = %e, "Tick failed"),
                }
            }

            Some(cmd) = command_rx.recv() => {
                match cmd {
                    SimulationCommand::Start => {
                        if let Err(e) = simulation.lock().await.start().await {
                            error!(error = %e, "Failed to start simulation");
                        }
                    }

                    SimulationCommand::Pause => simulation.lock().await.pause(),

                    SimulationCommand::Resume => simulation.lock().await.resume(),

                    SimulationCommand::Reset(reply) => {
                        let result = simulation.lock().await.reset().await;
                        if let Err(e) = &result {
                            error!(error = %e, "Failed to reset simulation");
                        }
                        if let Some(reply) = reply {
                            let _ = reply.send(result);
                        }
                    }

                    SimulationCommand::Step => {
                        if let Err(e) = simulation.lock().await.step().await {
                            warn!(error = %e, "Manual step failed");
                        }
                    }

                    SimulationCommand::SetPolicy(policy) => {
                        simulation.lock().await.set_policy(policy);
                    }

                    SimulationCommand::SetPeriod(new_period) => {
                        info!(period_ms = new_period.as_millis() as u64, "Tick period updated");
                        interval = ticker(new_period);
                    }

                    SimulationCommand::Shutdown => {
                        info!("Simulation task shutting down");
                        break;
                    }
                }
            }

            else => break,
        }
    }
}

impl Drop for SimulationTask {
    fn drop(&mut self) {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.handle.take() {
            warn!(
                "SimulationTask dropped without calling shutdown() - aborting task immediately. \
                 Use `task.shutdown().await` for graceful cleanup."
            );
            handle.abort();
        }
    }
}
