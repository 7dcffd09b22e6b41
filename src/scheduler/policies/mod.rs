/*!
 * Scheduling Policies
 * Selection rules for the four supported disciplines
 */

mod fcfs;
mod priority;
mod round_robin;
mod sjf;

pub use fcfs::Fcfs;
pub use priority::PriorityPolicy;
pub use round_robin::RoundRobin;
pub use sjf::Sjf;

use super::traits::SchedulingPolicy;
use super::types::PolicyKind;
use crate::core::SimulationConfig;

/// Build the policy for `kind` with parameters taken from `config`
pub fn policy_for(kind: PolicyKind, config: &SimulationConfig) -> Box<dyn SchedulingPolicy> {
    match kind {
        PolicyKind::Fcfs => Box::new(Fcfs),
        PolicyKind::Sjf => Box::new(Sjf),
        PolicyKind::Priority => Box::new(PriorityPolicy::new(config.priority_order)),
        PolicyKind::RoundRobin => Box::new(RoundRobin::new(config.time_quantum())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, ProcessSpec, ProcessStatus};
    use crate::scheduler::types::{PriorityOrder, TimeQuantum};

    fn ready(id: u32, burst: u32, priority: u8, seq: u64) -> Process {
        let mut p = Process::from_spec(&ProcessSpec::new(id, burst).with_priority(priority));
        p.id = id;
        p.status = ProcessStatus::Ready;
        p.ready_seq = seq;
        p
    }

    fn pick(policy: &dyn SchedulingPolicy, pool: &[Process]) -> Option<u32> {
        let refs: Vec<&Process> = pool.iter().collect();
        policy.select(&refs).map(|p| p.id)
    }

    #[test]
    fn test_fcfs_uses_ready_order_not_id() {
        let pool = vec![ready(1, 5, 0, 7), ready(2, 3, 0, 4), ready(3, 1, 0, 9)];
        assert_eq!(pick(&Fcfs, &pool), Some(2));
    }

    #[test]
    fn test_sjf_breaks_ties_by_ready_order() {
        let pool = vec![ready(1, 5, 0, 1), ready(2, 2, 0, 3), ready(3, 2, 0, 2)];
        assert_eq!(pick(&Sjf, &pool), Some(3));
    }

    #[test]
    fn test_priority_orders() {
        let pool = vec![ready(1, 5, 3, 1), ready(2, 5, 1, 2), ready(3, 5, 9, 3)];
        assert_eq!(pick(&PriorityPolicy::new(PriorityOrder::LowerFirst), &pool), Some(2));
        assert_eq!(pick(&PriorityPolicy::new(PriorityOrder::HigherFirst), &pool), Some(3));

        let tied = vec![ready(1, 5, 2, 5), ready(2, 5, 2, 4)];
        assert_eq!(pick(&PriorityPolicy::default(), &tied), Some(2));
    }

    #[test]
    fn test_empty_pool_selects_nothing() {
        for kind in PolicyKind::ALL {
            let policy = policy_for(kind, &SimulationConfig::default());
            assert_eq!(pick(policy.as_ref(), &[]), None);
        }
    }

    #[test]
    fn test_only_round_robin_has_quantum() {
        let config = SimulationConfig::default().with_quantum(4);
        for kind in PolicyKind::ALL {
            let policy = policy_for(kind, &config);
            assert_eq!(policy.kind(), kind);
            let expected = (kind == PolicyKind::RoundRobin).then(|| TimeQuantum::new(4).unwrap());
            assert_eq!(policy.quantum(), expected);
        }
    }

    #[test]
    fn test_keeps_cpu_respects_quantum() {
        let rr = RoundRobin::new(TimeQuantum::new(3).unwrap());
        let mut running = ready(1, 4, 0, 1);
        running.status = ProcessStatus::Running;
        running.steps = 2;
        assert!(rr.keeps_cpu(&running));
        running.steps = 3;
        assert!(!rr.keeps_cpu(&running));
        assert!(Fcfs.keeps_cpu(&running));

        running.burst_time = 0;
        assert!(!Fcfs.keeps_cpu(&running));
    }
}
