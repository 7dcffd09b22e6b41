/*!
 * Simulation Engine
 *
 * Drives one tick at a time through the phases admit, policy, purge,
 * I/O transition, ready accrual, waiting countdown, observe, detect. Every
 * phase reads a fresh snapshot, plans its writes into the tick journal and
 * commits them before the next phase starts.
 */

use super::session::{Phase, SessionState, TickJournal};
use super::updates::{
    plan_admission, plan_finalize, plan_io_transition, plan_purge, plan_ready_accrual,
    plan_waiting_countdown,
};
use crate::completion::{detect, CompletionDecision, CompletionInput};
use crate::core::errors::{SimError, StoreError};
use crate::core::limits::INITIAL_MEMORY_BLOCK;
use crate::core::types::{ProcessLabel, SimResult, Tick};
use crate::core::SimulationConfig;
use crate::monitoring::{
    tick_span, AtomicSimulationStats, Event, EventBus, RunLedger, RunReport, SimEvent,
    SimulationStats,
};
use crate::process::{validate_spec, MemorySegment, Process, ProcessSpec};
use crate::scheduler::{plan_tick, policy_for, Plan, PolicyKind, SchedulingPolicy, TableOp, Transition};
use crate::store::{ProcessStore, RetryPolicy, StoreResult, Table};
use crate::timeline::{TimelineReconstructor, TimelineView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Summary of one completed tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TickReport {
    pub tick: Tick,
    pub running: Option<ProcessLabel>,
    pub transitions: Vec<Transition>,
    pub total_steps: u32,
    pub valuemax: u32,
    pub decision: CompletionDecision,
    /// The tick was finished after an earlier failed attempt
    pub resumed: bool,
}

impl TickReport {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.decision,
            CompletionDecision::Complete { .. } | CompletionDecision::Desynced { .. }
        )
    }
}

/// Result of asking the engine to tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Paused; nothing ran
    Paused,
    Advanced(TickReport),
}

/// Discrete-tick scheduling simulation over a process table store
pub struct Simulation {
    store: Arc<dyn ProcessStore>,
    config: SimulationConfig,
    policy: Box<dyn SchedulingPolicy>,
    retry: RetryPolicy,
    session: SessionState,
    timeline: TimelineReconstructor,
    ledger: RunLedger,
    stats: Arc<AtomicSimulationStats>,
    events: EventBus,
    last_report: Option<RunReport>,
}

impl Simulation {
    pub fn new(store: Arc<dyn ProcessStore>, config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let policy = policy_for(config.policy, &config);
        info!(
            policy = config.policy.as_str(),
            quantum = config.quantum,
            tick_ms = config.tick_period_ms,
            "Simulation created"
        );
        Ok(Self {
            store,
            retry: RetryPolicy::from_config(&config),
            events: EventBus::new(config.event_capacity),
            policy,
            config,
            session: SessionState::new(),
            timeline: TimelineReconstructor::new(),
            ledger: RunLedger::new(),
            stats: Arc::new(AtomicSimulationStats::new()),
            last_report: None,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn policy(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    /// Last tick started
    pub fn current_tick(&self) -> Tick {
        self.session.tick
    }

    pub fn is_started(&self) -> bool {
        self.session.started
    }

    pub fn is_paused(&self) -> bool {
        self.session.paused
    }

    /// Completion was surfaced and nothing changed since
    pub fn is_complete(&self) -> bool {
        self.session.completion_signaled
    }

    /// A tick is journaled and waiting to be finished
    pub fn has_pending_tick(&self) -> bool {
        self.session.journal.is_some()
    }

    pub fn view(&self) -> TimelineView {
        self.timeline.view()
    }

    pub fn timeline(&self) -> &TimelineReconstructor {
        &self.timeline
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats.snapshot()
    }

    /// Report of the most recent completed run
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        self.events.stream()
    }

    /// Current rows of a table
    pub async fn records(&self, table: Table) -> SimResult<Vec<Process>> {
        self.read(table).await
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Validate and queue a process for admission
    pub async fn submit(&mut self, spec: ProcessSpec) -> SimResult<Process> {
        validate_spec(&spec)?;
        let record = Process::from_spec(&spec);
        let store = self.store.as_ref();
        let stats = &self.stats;
        let queued = self
            .retry
            .run(
                "add",
                move || store.add(record.clone(), Table::Queue),
                move || stats.inc_store_retries(),
            )
            .await?;
        // New work reopens a run that already signalled completion
        self.session.completion_signaled = false;

        debug!(
            id = queued.id,
            process = %queued.label(),
            burst = queued.init_burst,
            arrival = queued.arrival,
            "Process queued"
        );
        Ok(queued)
    }

    /// Admit due processes and let ticks run
    pub async fn start(&mut self) -> SimResult<()> {
        if self.session.started {
            self.resume();
            return Ok(());
        }

        if self.session.journal.is_none() {
            let queue = self.read(Table::Queue).await?;
            let plan = plan_admission(&queue, self.session.tick, &mut self.session.sequencer);
            let tick = self.session.tick;
            for op in &plan.ops {
                if let TableOp::Upsert { record, .. } = op {
                    self.ledger.admitted(record, tick);
                }
            }
            for op in &plan.ops {
                self.apply(op).await?;
            }
            for transition in plan.transitions {
                self.stats.record(&transition);
                self.emit(SimEvent::Transition(transition));
            }
        }

        self.session.started = true;
        self.session.paused = false;
        info!(session = %self.session.id, policy = self.policy.kind().as_str(), "Simulation started");
        self.emit(SimEvent::Started);
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.session.paused {
            self.session.paused = true;
            info!(tick = self.session.tick, "Simulation paused");
            self.emit(SimEvent::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.session.paused {
            self.session.paused = false;
            self.session.started = true;
            info!(tick = self.session.tick, "Simulation resumed");
            self.emit(SimEvent::Resumed);
        }
    }

    /// Clear tables, timeline, statistics, and per-run state
    pub async fn reset(&mut self) -> SimResult<()> {
        for table in [Table::Pcb, Table::Queue] {
            let store = self.store.as_ref();
            let stats = &self.stats;
            self.retry
                .run(
                    "delete_all",
                    move || store.delete_all(table),
                    move || stats.inc_store_retries(),
                )
                .await?;
        }

        let store = self.store.as_ref();
        let stats = &self.stats;
        self.retry
            .run(
                "reset_memory",
                move || store.reset_memory(MemorySegment::free_block(INITIAL_MEMORY_BLOCK)),
                move || stats.inc_store_retries(),
            )
            .await?;

        self.timeline.reset();
        self.ledger.clear();
        self.stats.reset();
        self.last_report = None;
        self.session = SessionState::new();

        info!(session = %self.session.id, "Simulation reset");
        self.emit(SimEvent::Reset);
        Ok(())
    }

    /// Switch policy; the new one announces itself on its first tick
    pub fn set_policy(&mut self, kind: PolicyKind) {
        if kind == self.policy.kind() {
            return;
        }
        info!(from = self.policy.kind().as_str(), to = kind.as_str(), "Changing scheduling policy");
        self.config.policy = kind;
        self.policy = policy_for(kind, &self.config);
        self.session.announced = false;
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Run one tick unless paused
    pub async fn tick(&mut self) -> SimResult<TickOutcome> {
        if self.session.paused {
            return Ok(TickOutcome::Paused);
        }
        self.advance().await.map(TickOutcome::Advanced)
    }

    /// Run one tick even when paused
    pub async fn step(&mut self) -> SimResult<TickReport> {
        self.advance().await
    }

    /// Start if needed and tick until the run completes
    pub async fn run_to_completion(&mut self, max_ticks: u64) -> SimResult<RunReport> {
        if self.is_complete() {
            if let Some(run) = &self.last_report {
                return Ok(run.clone());
            }
        }
        self.start().await?;

        for _ in 0..max_ticks {
            match self.tick().await? {
                TickOutcome::Advanced(report) if report.is_terminal() => {
                    if let Some(run) = &self.last_report {
                        return Ok(run.clone());
                    }
                }
                TickOutcome::Advanced(_) => {}
                TickOutcome::Paused => break,
            }
        }

        Err(SimError::TickBudgetExhausted { max_ticks })
    }

    async fn advance(&mut self) -> SimResult<TickReport> {
        let mut journal = self.session.open_tick();
        let span = tick_span(self.session.id, journal.tick);

        match self.run_phases(&mut journal).instrument(span).await {
            Ok(report) => Ok(report),
            Err(err) => {
                journal.stalls += 1;
                self.stats.inc_stalled_ticks();
                warn!(
                    tick = journal.tick,
                    phase = %journal.next_phase,
                    pending = journal.pending.len(),
                    error = %err,
                    "Tick stalled; it stays journaled and resumes on the next call"
                );
                self.emit(SimEvent::TickStalled {
                    error: err.to_string(),
                });
                self.session.journal = Some(journal);
                Err(err)
            }
        }
    }

    async fn run_phases(&mut self, journal: &mut TickJournal) -> SimResult<TickReport> {
        loop {
            self.commit(journal).await?;

            match journal.next_phase {
                Phase::Admit => {
                    let queue = self.read(Table::Queue).await?;
                    let plan =
                        plan_admission(&queue, journal.tick - 1, &mut self.session.sequencer);
                    for op in &plan.ops {
                        if let TableOp::Upsert { record, .. } = op {
                            self.ledger.admitted(record, journal.tick);
                        }
                    }
                    self.absorb(journal, plan, Phase::Policy);
                }
                Phase::Policy => {
                    let pcb = self.read(Table::Pcb).await?;
                    self.announce();
                    for record in &pcb {
                        self.session.sequencer.observe(record.ready_seq);
                    }
                    let plan = plan_tick(self.policy.as_ref(), &pcb, &mut self.session.sequencer);
                    self.absorb(journal, plan, Phase::Purge);
                }
                Phase::Purge => {
                    let pcb = self.read(Table::Pcb).await?;
                    let plan = plan_purge(&pcb, &self.session.purge_due);
                    self.absorb(journal, plan, Phase::IoTransition);
                }
                Phase::IoTransition => {
                    let pcb = self.read(Table::Pcb).await?;
                    self.absorb(journal, plan_io_transition(&pcb), Phase::ReadyAccrual);
                }
                Phase::ReadyAccrual => {
                    let pcb = self.read(Table::Pcb).await?;
                    self.absorb(journal, plan_ready_accrual(&pcb), Phase::WaitingCountdown);
                }
                Phase::WaitingCountdown => {
                    let pcb = self.read(Table::Pcb).await?;
                    let plan = plan_waiting_countdown(&pcb, &mut self.session.sequencer);
                    self.absorb(journal, plan, Phase::Observe);
                }
                Phase::Observe => {
                    let pcb = self.read(Table::Pcb).await?;
                    let queue = self.read(Table::Queue).await?;
                    let observation = self.timeline.observe(&pcb, &queue);
                    journal.running = pcb.iter().find(|p| p.is_running()).map(|p| p.process_id);
                    debug!(
                        total_steps = observation.total_steps,
                        valuemax = observation.valuemax,
                        appended = observation.appended,
                        "Timeline observed"
                    );
                    journal.next_phase = Phase::Detect;
                }
                Phase::Detect => {
                    let pcb = self.read(Table::Pcb).await?;
                    let queue = self.read(Table::Queue).await?;
                    self.detect_completion(journal, &pcb, &queue);
                }
                Phase::Finish => return Ok(self.finish(journal)),
            }
        }
    }

    fn detect_completion(&mut self, journal: &mut TickJournal, pcb: &[Process], queue: &[Process]) {
        let input = CompletionInput::from_snapshot(
            pcb,
            queue,
            &self.timeline,
            self.session.completion_signaled,
            self.config.completion_tolerance,
        );
        let decision = detect(&input);

        match decision {
            CompletionDecision::Pending => {
                self.session.completion_signaled = false;
            }
            CompletionDecision::AlreadySignaled => {}
            CompletionDecision::Complete { reconciled } => {
                if reconciled {
                    warn!(
                        total_steps = input.total_steps,
                        valuemax = input.valuemax,
                        gap = input.gap(),
                        "Completion signals disagree within tolerance; forcing total steps"
                    );
                    self.timeline.reconcile();
                    self.emit(SimEvent::Reconciled {
                        total_steps: input.total_steps,
                        valuemax: input.valuemax,
                        gap: input.gap(),
                    });
                }
                self.session.completion_signaled = true;
            }
            CompletionDecision::Desynced {
                total_steps,
                valuemax,
                gap,
            } => {
                let err = SimError::TimelineDesync {
                    total_steps,
                    valuemax,
                };
                error!(error = %err, gap, tolerance = input.tolerance, "Completing with desynchronized timeline");
                self.emit(SimEvent::TimelineDesync {
                    total_steps,
                    valuemax,
                    gap,
                });
                self.session.completion_signaled = true;
            }
        }

        journal.decision = Some(decision);
        let finalize = matches!(
            decision,
            CompletionDecision::Complete { .. } | CompletionDecision::Desynced { .. }
        );
        if finalize {
            let plan = plan_finalize(pcb);
            self.absorb(journal, plan, Phase::Finish);
        } else {
            journal.next_phase = Phase::Finish;
        }
    }

    fn finish(&mut self, journal: &mut TickJournal) -> TickReport {
        self.session.rotate_purge();
        self.stats.inc_ticks();

        let decision = journal.decision.unwrap_or(CompletionDecision::Pending);
        let report = TickReport {
            tick: journal.tick,
            running: journal.running,
            transitions: std::mem::take(&mut journal.transitions),
            total_steps: self.timeline.total_steps(),
            valuemax: self.timeline.valuemax(),
            decision,
            resumed: journal.is_resumed(),
        };

        if report.is_terminal() {
            self.session.paused = true;
            let run = RunReport::build(
                self.session.id,
                self.policy.kind(),
                journal.tick,
                self.timeline.total_steps(),
                self.timeline.valuemax(),
                self.timeline.is_reconciled(),
                matches!(decision, CompletionDecision::Desynced { .. }),
                self.ledger.summaries(),
                self.stats.snapshot(),
            );
            info!(
                tick = journal.tick,
                total_steps = run.total_steps,
                valuemax = run.valuemax,
                avg_waiting = run.average_waiting,
                avg_turnaround = run.average_turnaround,
                "Simulation complete"
            );
            self.last_report = Some(run.clone());
            self.emit(SimEvent::Completed(Box::new(run)));
        }

        report
    }

    /// Fold a phase plan into the journal and the run bookkeeping
    fn absorb(&mut self, journal: &mut TickJournal, plan: Plan, next: Phase) {
        for op in &plan.ops {
            if let TableOp::Upsert {
                table: Table::Pcb,
                record,
            } = op
            {
                self.ledger.written(record, journal.tick);
            }
        }
        self.session.note_completions(&plan.ops);

        for transition in &plan.transitions {
            self.stats.record(transition);
            self.emit_at(journal.tick, SimEvent::Transition(transition.clone()));
        }

        journal.plan(plan.ops, plan.transitions, next);
    }

    fn announce(&mut self) {
        if self.session.announced {
            return;
        }
        self.session.announced = true;
        let kind = self.policy.kind();
        info!(policy = kind.as_str(), "Simulating {}...", kind.display_name());
        self.emit(SimEvent::PolicyAnnounced { policy: kind });
    }

    // ------------------------------------------------------------------
    // Store access
    // ------------------------------------------------------------------

    async fn commit(&self, journal: &mut TickJournal) -> SimResult<()> {
        while let Some(op) = journal.pending.front() {
            self.apply(op).await?;
            journal.pending.pop_front();
        }
        Ok(())
    }

    async fn apply(&self, op: &TableOp) -> StoreResult<()> {
        let store = self.store.as_ref();
        let stats = &self.stats;
        let on_retry = move || stats.inc_store_retries();

        match op {
            TableOp::Upsert { table, record } => {
                let table = *table;
                self.retry
                    .run("edit", move || store.edit(record.clone(), table), on_retry)
                    .await
                    .map(|_| ())
            }
            TableOp::Delete { table, id } => {
                let (table, id) = (*table, *id);
                self.retry
                    .run("delete", move || store.delete(id, table), on_retry)
                    .await
            }
        }
    }

    async fn read(&self, table: Table) -> SimResult<Vec<Process>> {
        let store = self.store.as_ref();
        let stats = &self.stats;
        self.retry
            .run("list", move || store.list(table), move || stats.inc_store_retries())
            .await
            .map_err(|err: StoreError| err.into())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn emit(&self, payload: SimEvent) {
        self.emit_at(self.session.tick, payload);
    }

    fn emit_at(&self, tick: Tick, payload: SimEvent) {
        self.events.publish(Event {
            tick,
            session: self.session.id,
            severity: payload.severity(),
            payload,
        });
    }
}
