/*!
 * Scheduler Tests
 * End-to-end policy behaviour over the in-memory process table
 */

use pretty_assertions::assert_eq;
use sched_sim::{
    MemoryStore, PolicyKind, PriorityOrder, ProcessSpec, Simulation, SimulationConfig,
    TickOutcome, TimelineView,
};
use std::sync::Arc;

async fn simulation(config: SimulationConfig, specs: Vec<ProcessSpec>) -> Simulation {
    let store = Arc::new(MemoryStore::new());
    let mut sim = Simulation::new(store, config).unwrap();
    for spec in specs {
        sim.submit(spec).await.unwrap();
    }
    sim
}

/// Running process label per tick until completion
async fn run_trace(sim: &mut Simulation) -> Vec<Option<u32>> {
    sim.start().await.unwrap();
    let mut trace = Vec::new();
    for _ in 0..1_000 {
        match sim.tick().await.unwrap() {
            TickOutcome::Advanced(report) => {
                trace.push(report.running);
                if report.is_terminal() {
                    return trace;
                }
            }
            TickOutcome::Paused => break,
        }
    }
    panic!("simulation did not complete: {:?}", trace);
}

fn spans(view: &TimelineView) -> Vec<(u32, u32)> {
    view.segments
        .iter()
        .map(|s| (s.process_id, s.end - s.start))
        .collect()
}

#[tokio::test]
async fn test_round_robin_quantum_three() {
    let config = SimulationConfig::for_policy(PolicyKind::RoundRobin).with_quantum(3);
    let mut sim = simulation(
        config,
        vec![
            ProcessSpec::new(1, 4),
            ProcessSpec::new(2, 2),
            ProcessSpec::new(3, 6),
        ],
    )
    .await;

    let trace = run_trace(&mut sim).await;
    assert_eq!(
        trace,
        [1, 1, 1, 2, 2, 3, 3, 3, 1, 3, 3, 3].map(Some).to_vec()
    );

    let view = sim.view();
    assert_eq!(spans(&view), vec![(1, 3), (2, 2), (3, 3), (1, 1), (3, 3)]);
    assert_eq!(view.boundaries, vec![0, 3, 5, 8, 9, 12]);
    assert_eq!(view.total_steps, 12);
    assert_eq!(view.valuemax, 12);
    assert!(!view.reconciled);

    let stats = sim.stats();
    assert_eq!(stats.preemptions, 2);
    assert_eq!(stats.completions, 3);
    assert_eq!(stats.ticks, 12);
}

#[tokio::test]
async fn test_round_robin_final_steps_are_cumulative() {
    let config = SimulationConfig::for_policy(PolicyKind::RoundRobin).with_quantum(3);
    let mut sim = simulation(
        config,
        vec![
            ProcessSpec::new(1, 4),
            ProcessSpec::new(2, 2),
            ProcessSpec::new(3, 6),
        ],
    )
    .await;

    let run = sim.run_to_completion(100).await.unwrap();
    let mut finals: Vec<(u32, u32)> = run
        .processes
        .iter()
        .map(|p| (p.process_id, p.final_steps))
        .collect();
    finals.sort();

    // P1 ran 3 + 1 across two slices, P3 ran 3 + 3
    assert_eq!(finals, vec![(1, 4), (2, 2), (3, 6)]);
    let sum: u32 = finals.iter().map(|&(_, steps)| steps).sum();
    assert_eq!(sum, run.valuemax);
    assert_eq!(sum, run.total_steps);
}

#[tokio::test]
async fn test_fcfs_runs_to_completion_in_order() {
    let mut sim = simulation(
        SimulationConfig::for_policy(PolicyKind::Fcfs),
        vec![ProcessSpec::new(1, 5), ProcessSpec::new(2, 3)],
    )
    .await;

    let trace = run_trace(&mut sim).await;
    assert_eq!(trace, [1, 1, 1, 1, 1, 2, 2, 2].map(Some).to_vec());

    let view = sim.view();
    assert_eq!(view.segments.len(), 2);
    assert_eq!(view.boundaries, vec![0, 5, 8]);
    assert_eq!(sim.stats().preemptions, 0);
}

#[tokio::test]
async fn test_sjf_picks_shortest_remaining() {
    let mut sim = simulation(
        SimulationConfig::for_policy(PolicyKind::Sjf),
        vec![
            ProcessSpec::new(1, 5),
            ProcessSpec::new(2, 2),
            ProcessSpec::new(3, 3),
        ],
    )
    .await;

    run_trace(&mut sim).await;
    assert_eq!(spans(&sim.view()), vec![(2, 2), (3, 3), (1, 5)]);
}

#[tokio::test]
async fn test_priority_orders() {
    let specs = || {
        vec![
            ProcessSpec::new(1, 2).with_priority(3),
            ProcessSpec::new(2, 2).with_priority(1),
            ProcessSpec::new(3, 2).with_priority(2),
        ]
    };

    let mut lower = simulation(SimulationConfig::for_policy(PolicyKind::Priority), specs()).await;
    run_trace(&mut lower).await;
    assert_eq!(spans(&lower.view()), vec![(2, 2), (3, 2), (1, 2)]);

    let config = SimulationConfig::for_policy(PolicyKind::Priority)
        .with_priority_order(PriorityOrder::HigherFirst);
    let mut higher = simulation(config, specs()).await;
    run_trace(&mut higher).await;
    assert_eq!(spans(&higher.view()), vec![(1, 2), (3, 2), (2, 2)]);
}

#[tokio::test]
async fn test_non_preemptive_ignores_quantum() {
    let config = SimulationConfig::for_policy(PolicyKind::Fcfs).with_quantum(1);
    let mut sim = simulation(config, vec![ProcessSpec::new(1, 4), ProcessSpec::new(2, 1)]).await;

    run_trace(&mut sim).await;
    assert_eq!(spans(&sim.view()), vec![(1, 4), (2, 1)]);
}

#[tokio::test]
async fn test_round_robin_quantum_one_alternates() {
    let config = SimulationConfig::for_policy(PolicyKind::RoundRobin).with_quantum(1);
    let mut sim = simulation(config, vec![ProcessSpec::new(1, 2), ProcessSpec::new(2, 2)]).await;

    let trace = run_trace(&mut sim).await;
    assert_eq!(trace, [1, 2, 1, 2].map(Some).to_vec());
    assert_eq!(sim.view().total_steps, 4);
}

#[tokio::test]
async fn test_policy_switch_mid_run() {
    let mut sim = simulation(
        SimulationConfig::for_policy(PolicyKind::Fcfs),
        vec![ProcessSpec::new(1, 6), ProcessSpec::new(2, 2)],
    )
    .await;
    sim.start().await.unwrap();

    for _ in 0..4 {
        sim.tick().await.unwrap();
    }
    sim.set_policy(PolicyKind::RoundRobin);
    assert_eq!(sim.policy(), PolicyKind::RoundRobin);

    // P1 has run 4 ticks, past the default quantum, so it yields next tick
    let report = match sim.tick().await.unwrap() {
        TickOutcome::Advanced(report) => report,
        TickOutcome::Paused => panic!("unexpected pause"),
    };
    assert_eq!(report.running, Some(2));

    let run = sim.run_to_completion(100).await.unwrap();
    assert_eq!(run.total_steps, 8);
    assert_eq!(run.policy, PolicyKind::RoundRobin);
}
