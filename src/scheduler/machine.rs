/*!
 * Scheduling State Machine
 *
 * One scheduling decision per tick, shared by every policy. Policies differ
 * only in how the next record is selected and whether a quantum applies.
 */

use super::plan::{Plan, Sequencer, Transition};
use super::traits::SchedulingPolicy;
use crate::process::{Process, ProcessStatus};
use tracing::{debug, warn};

/// Plan the policy phase of a tick against a pcb snapshot
///
/// An empty table, an empty ready set, or no current process are normal
/// states and yield an empty plan. With more than one Running record, only
/// the first is scheduled and the others are left untouched.
pub fn plan_tick(policy: &dyn SchedulingPolicy, pcb: &[Process], seq: &mut Sequencer) -> Plan {
    let mut plan = Plan::new();

    let mut running = pcb.iter().filter(|p| p.is_running());
    let current = running.next();
    let extra = running.count();
    if extra > 0 {
        warn!(
            extra,
            policy = policy.kind().as_str(),
            "Multiple running records, scheduling only the first"
        );
    }

    // Candidates come from the snapshot, before `current` is demoted
    let candidates: Vec<&Process> = pcb.iter().filter(|p| p.is_ready()).collect();

    match current {
        Some(current) if policy.keeps_cpu(current) => {
            let mut next = current.clone();
            next.burst_time -= 1;
            next.steps += 1;
            plan.upsert(next);
        }
        Some(current) => {
            context_switch(current, &mut plan, seq);
            dispatch(policy, &candidates, &mut plan);
        }
        None => {
            let idle = candidates.is_empty() && !pcb.iter().any(|p| p.is_waiting());
            let finished: Vec<_> = pcb.iter().filter(|p| p.is_completed()).map(|p| p.id).collect();

            if idle && !finished.is_empty() {
                debug!(count = finished.len(), "Terminal drain of completed records");
                for id in &finished {
                    plan.delete(*id);
                }
                plan.note(Transition::Drained { ids: finished });
            } else {
                dispatch(policy, &candidates, &mut plan);
            }
        }
    }

    plan
}

/// Take `current` off the CPU: Completed when exhausted, otherwise back to Ready
fn context_switch(current: &Process, plan: &mut Plan, seq: &mut Sequencer) {
    let mut next = current.clone();

    if current.burst_time == 0 {
        next.status = ProcessStatus::Completed;
        next.final_steps = current.executed();
        plan.note(Transition::Completed {
            id: current.id,
            process_id: current.process_id,
            final_steps: next.final_steps,
        });
    } else {
        next.status = ProcessStatus::Ready;
        next.ready_seq = seq.next_ticket();
        plan.note(Transition::Preempted {
            id: current.id,
            process_id: current.process_id,
            steps: current.steps,
        });
    }

    plan.upsert(next);
}

fn dispatch(policy: &dyn SchedulingPolicy, candidates: &[&Process], plan: &mut Plan) {
    let Some(chosen) = policy.select(candidates) else {
        return;
    };

    let mut next = chosen.clone();
    next.status = ProcessStatus::Running;
    next.burst_time = next.burst_time.saturating_sub(1);
    next.steps += 1;

    plan.note(Transition::Dispatched {
        id: chosen.id,
        process_id: chosen.process_id,
    });
    plan.upsert(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSpec;
    use crate::scheduler::plan::TableOp;
    use crate::scheduler::policies::{Fcfs, RoundRobin};
    use crate::scheduler::types::TimeQuantum;

    fn record(id: u32, burst: u32, status: ProcessStatus, seq: u64) -> Process {
        let mut p = Process::from_spec(&ProcessSpec::new(id, burst));
        p.id = id;
        p.status = status;
        p.ready_seq = seq;
        p
    }

    fn upserts(plan: &Plan) -> Vec<&Process> {
        plan.ops
            .iter()
            .filter_map(|op| match op {
                TableOp::Upsert { record, .. } => Some(record),
                TableOp::Delete { .. } => None,
            })
            .collect()
    }

    fn rr(q: u32) -> RoundRobin {
        RoundRobin::new(TimeQuantum::new(q).unwrap())
    }

    #[test]
    fn test_idle_table_is_noop() {
        let mut seq = Sequencer::new();
        assert!(plan_tick(&Fcfs, &[], &mut seq).is_empty());
    }

    #[test]
    fn test_dispatch_when_nothing_runs() {
        let pcb = vec![
            record(1, 4, ProcessStatus::Ready, 2),
            record(2, 2, ProcessStatus::Ready, 1),
        ];
        let plan = plan_tick(&Fcfs, &pcb, &mut Sequencer::new());

        let written = upserts(&plan);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, 2);
        assert_eq!(written[0].status, ProcessStatus::Running);
        assert_eq!(written[0].burst_time, 1);
        assert_eq!(written[0].steps, 1);
    }

    #[test]
    fn test_running_continues_within_quantum() {
        let mut current = record(1, 4, ProcessStatus::Running, 1);
        current.burst_time = 3;
        current.steps = 1;
        let pcb = vec![current, record(2, 2, ProcessStatus::Ready, 2)];

        let plan = plan_tick(&rr(3), &pcb, &mut Sequencer::new());
        let written = upserts(&plan);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, 1);
        assert_eq!(written[0].burst_time, 2);
        assert_eq!(written[0].steps, 2);
    }

    #[test]
    fn test_quantum_expiry_preempts_without_resetting_steps() {
        let mut current = record(1, 4, ProcessStatus::Running, 1);
        current.burst_time = 1;
        current.steps = 3;
        let pcb = vec![current, record(2, 2, ProcessStatus::Ready, 2)];
        let mut seq = Sequencer::new();
        seq.observe(2);

        let plan = plan_tick(&rr(3), &pcb, &mut seq);
        let written = upserts(&plan);

        assert_eq!(written[0].id, 1);
        assert_eq!(written[0].status, ProcessStatus::Ready);
        assert_eq!(written[0].steps, 3);
        assert_eq!(written[0].ready_seq, 3);

        assert_eq!(written[1].id, 2);
        assert_eq!(written[1].status, ProcessStatus::Running);
    }

    #[test]
    fn test_preempted_record_is_not_redispatched_same_tick() {
        let mut current = record(1, 4, ProcessStatus::Running, 1);
        current.burst_time = 1;
        current.steps = 3;

        let plan = plan_tick(&rr(3), &[current], &mut Sequencer::new());
        let written = upserts(&plan);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].status, ProcessStatus::Ready);
    }

    #[test]
    fn test_exhaustion_on_quantum_boundary_completes() {
        let mut current = record(1, 3, ProcessStatus::Running, 1);
        current.burst_time = 0;
        current.steps = 3;

        let plan = plan_tick(&rr(3), &[current], &mut Sequencer::new());
        let written = upserts(&plan);
        assert_eq!(written[0].status, ProcessStatus::Completed);
        assert_eq!(written[0].final_steps, 3);
        assert!(matches!(
            plan.transitions[0],
            Transition::Completed { final_steps: 3, .. }
        ));
    }

    #[test]
    fn test_completion_records_cumulative_work() {
        // Third slice of a 7-tick burst under Q=3
        let mut current = record(1, 7, ProcessStatus::Running, 1);
        current.burst_time = 0;
        current.steps = 1;

        let plan = plan_tick(&rr(3), &[current], &mut Sequencer::new());
        assert_eq!(upserts(&plan)[0].final_steps, 7);
        assert!(matches!(
            plan.transitions[0],
            Transition::Completed { final_steps: 7, .. }
        ));
    }

    #[test]
    fn test_terminal_drain_deletes_completed() {
        let pcb = vec![
            record(1, 3, ProcessStatus::Completed, 1),
            record(2, 2, ProcessStatus::Completed, 2),
        ];
        let plan = plan_tick(&rr(3), &pcb, &mut Sequencer::new());
        assert_eq!(
            plan.ops,
            vec![TableOp::delete(1), TableOp::delete(2)]
        );
        assert_eq!(plan.transitions, vec![Transition::Drained { ids: vec![1, 2] }]);
    }

    #[test]
    fn test_no_drain_while_io_pending() {
        let pcb = vec![
            record(1, 3, ProcessStatus::Completed, 1),
            record(2, 2, ProcessStatus::Waiting, 2),
        ];
        let plan = plan_tick(&Fcfs, &pcb, &mut Sequencer::new());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_multiple_running_schedules_first_only() {
        let mut a = record(1, 4, ProcessStatus::Running, 1);
        a.burst_time = 3;
        let mut b = record(2, 4, ProcessStatus::Running, 2);
        b.burst_time = 3;

        let plan = plan_tick(&Fcfs, &[a, b], &mut Sequencer::new());
        let written = upserts(&plan);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, 1);
    }
}
