/*!
 * Ancillary Tick Updates
 * Admission, purge, I/O transition, ready accrual, and I/O countdown planners
 */

use crate::core::types::{RecordId, Tick};
use crate::process::{Process, ProcessStatus};
use crate::scheduler::{Plan, Sequencer, TableOp, Transition};
use crate::store::Table;

/// Move queue records whose arrival has elapsed into the pcb as Ready
///
/// The pcb write precedes the queue delete, so a replay after a partial
/// commit never loses a record.
pub fn plan_admission(queue: &[Process], elapsed: Tick, seq: &mut Sequencer) -> Plan {
    let mut plan = Plan::new();

    for queued in queue.iter().filter(|p| p.arrival <= elapsed) {
        let mut admitted = queued.clone();
        admitted.status = ProcessStatus::Ready;
        admitted.steps = 0;
        admitted.ready_seq = seq.next_ticket();

        plan.note(Transition::Admitted {
            id: admitted.id,
            process_id: admitted.process_id,
        });
        plan.upsert(admitted);
        plan.ops.push(TableOp::Delete {
            table: Table::Queue,
            id: queued.id,
        });
    }

    plan
}

/// Delete records marked Completed on an earlier tick
pub fn plan_purge(pcb: &[Process], due: &[RecordId]) -> Plan {
    let mut plan = Plan::new();

    let ids: Vec<RecordId> = pcb
        .iter()
        .filter(|p| p.is_completed() && due.contains(&p.id))
        .map(|p| p.id)
        .collect();

    if !ids.is_empty() {
        for id in &ids {
            plan.delete(*id);
        }
        plan.note(Transition::Purged { ids });
    }

    plan
}

/// Block the running record when its burst reaches `io_when`
pub fn plan_io_transition(pcb: &[Process]) -> Plan {
    let mut plan = Plan::new();

    if let Some(current) = pcb.iter().find(|p| p.is_running()) {
        if current.io_due() {
            let mut blocked = current.clone();
            blocked.status = ProcessStatus::Waiting;
            blocked.steps = current.init_burst - current.io_when;

            plan.note(Transition::BlockedOnIo {
                id: current.id,
                process_id: current.process_id,
                io_time: current.io_time,
            });
            plan.upsert(blocked);
        }
    }

    plan
}

/// Ready records accrue waiting time and drop their segment steps
pub fn plan_ready_accrual(pcb: &[Process]) -> Plan {
    let mut plan = Plan::new();

    for ready in pcb.iter().filter(|p| p.is_ready()) {
        let mut next = ready.clone();
        next.waiting_time += 1;
        next.steps = 0;
        plan.upsert(next);
    }

    plan
}

/// Count down I/O; finished records return to the ready queue
pub fn plan_waiting_countdown(pcb: &[Process], seq: &mut Sequencer) -> Plan {
    let mut plan = Plan::new();

    for waiting in pcb.iter().filter(|p| p.is_waiting()) {
        let mut next = waiting.clone();
        next.steps = 0;

        if waiting.io_time > 0 {
            next.io_time -= 1;
        } else {
            next.status = ProcessStatus::Ready;
            next.ready_seq = seq.next_ticket();
            plan.note(Transition::IoFinished {
                id: waiting.id,
                process_id: waiting.process_id,
            });
        }

        plan.upsert(next);
    }

    plan
}

/// Mark exhausted running records Completed and purge every Completed record
///
/// Applied once when the run completes, so nothing lingers in the pcb.
pub fn plan_finalize(pcb: &[Process]) -> Plan {
    let mut plan = Plan::new();
    let mut finished = Vec::new();

    for record in pcb.iter().filter(|p| p.is_running() && p.burst_time == 0) {
        let mut done = record.clone();
        done.status = ProcessStatus::Completed;
        done.final_steps = record.executed();
        plan.note(Transition::Completed {
            id: record.id,
            process_id: record.process_id,
            final_steps: done.final_steps,
        });
        finished.push(done.id);
        plan.upsert(done);
    }

    let ids: Vec<RecordId> = pcb
        .iter()
        .filter(|p| p.is_completed())
        .map(|p| p.id)
        .chain(finished)
        .collect();

    if !ids.is_empty() {
        for id in &ids {
            plan.delete(*id);
        }
        plan.note(Transition::Purged { ids });
    }

    plan
}
