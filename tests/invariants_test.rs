/*!
 * Invariant Tests
 * Randomized workloads checked tick by tick against the table invariants
 */

use proptest::prelude::*;
use sched_sim::{
    MemoryStore, PolicyKind, ProcessSpec, Simulation, SimulationConfig, Table, TickOutcome,
};
use std::sync::Arc;

const POLICIES: [PolicyKind; 4] = [
    PolicyKind::Fcfs,
    PolicyKind::Sjf,
    PolicyKind::Priority,
    PolicyKind::RoundRobin,
];

fn spec_strategy() -> impl Strategy<Value = (u32, Option<(u32, u32)>, u64, u8)> {
    (1u32..8, any::<bool>(), 0u32..16, 1u32..4, 0u64..5, 0u8..5).prop_map(
        |(burst, io, when, io_time, arrival, priority)| {
            let io = (io && burst > 1).then(|| (1 + when % (burst - 1), io_time));
            (burst, io, arrival, priority)
        },
    )
}

fn workload(raw: &[(u32, Option<(u32, u32)>, u64, u8)]) -> Vec<ProcessSpec> {
    raw.iter()
        .enumerate()
        .map(|(i, &(burst, io, arrival, priority))| {
            let mut spec = ProcessSpec::new(i as u32 + 1, burst)
                .with_arrival(arrival)
                .with_priority(priority);
            if let Some((io_when, io_time)) = io {
                spec = spec.with_io(io_when, io_time);
            }
            spec
        })
        .collect()
}

async fn check_run(specs: Vec<ProcessSpec>, policy: PolicyKind, quantum: u32) {
    let expected: u32 = specs.iter().map(|s| s.burst).sum();
    let config = SimulationConfig::for_policy(policy).with_quantum(quantum);
    let mut sim = Simulation::new(Arc::new(MemoryStore::new()), config).unwrap();
    for spec in &specs {
        sim.submit(spec.clone()).await.unwrap();
    }
    sim.start().await.unwrap();

    let mut previous_total = 0;
    for _ in 0..1_000 {
        let report = match sim.tick().await.unwrap() {
            TickOutcome::Advanced(report) => report,
            TickOutcome::Paused => panic!("paused before completion"),
        };

        // The timeline only grows
        assert!(report.total_steps >= previous_total);
        previous_total = report.total_steps;

        if report.is_terminal() {
            let view = sim.view();
            assert_eq!(view.total_steps, expected);
            assert_eq!(view.valuemax, expected);
            assert!(!view.reconciled);

            let run = sim.last_report().unwrap();
            assert!(!run.desynced);
            assert!(run.processes.iter().all(|p| p.finished_at.is_some()));
            return;
        }

        let pcb = sim.records(Table::Pcb).await.unwrap();
        let running: Vec<_> = pcb.iter().filter(|p| p.is_running()).collect();
        assert!(running.len() <= 1, "more than one running: {:?}", running);

        for record in &pcb {
            assert!(record.burst_time <= record.init_burst);
        }
        if policy == PolicyKind::RoundRobin {
            for record in &running {
                assert!(record.steps <= quantum, "quantum overrun: {:?}", record);
            }
        }
    }

    panic!("workload did not complete: {:?}", specs);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_runs_complete_with_exact_totals(
        raw in prop::collection::vec(spec_strategy(), 1..6),
        policy in 0usize..4,
        quantum in 1u32..5,
    ) {
        tokio_test::block_on(check_run(workload(&raw), POLICIES[policy], quantum));
    }
}
