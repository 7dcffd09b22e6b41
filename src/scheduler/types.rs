/*!
 * Scheduler Types
 * Policy selection, quantum, and priority ordering
 */

use crate::core::errors::SchedulerError;
use crate::core::limits::{DEFAULT_QUANTUM_TICKS, MAX_QUANTUM_TICKS};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scheduling discipline selected by the presentation layer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// First-Come-First-Served (non-preemptive)
    Fcfs,
    /// Shortest-Job-First on remaining burst (non-preemptive)
    Sjf,
    /// Priority ordered (non-preemptive)
    Priority,
    /// Round-Robin with fixed time quantum
    RoundRobin,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Fcfs,
        PolicyKind::Sjf,
        PolicyKind::Priority,
        PolicyKind::RoundRobin,
    ];

    /// Machine-readable name
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "fcfs",
            Self::Sjf => "sjf",
            Self::Priority => "priority",
            Self::RoundRobin => "round_robin",
        }
    }

    /// Name shown to users
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Fcfs => "First Come, First Serve",
            Self::Sjf => "Shortest Job First",
            Self::Priority => "Priority",
            Self::RoundRobin => "Round Robin",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PolicyKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "fcfs" | "firstcomefirstserve" | "firstcomefirstserved" | "fifo" => Ok(Self::Fcfs),
            "sjf" | "shortestjobfirst" => Ok(Self::Sjf),
            "priority" | "prio" => Ok(Self::Priority),
            "roundrobin" | "rr" => Ok(Self::RoundRobin),
            _ => Err(SchedulerError::InvalidPolicy(s.to_string())),
        }
    }
}

impl Serialize for PolicyKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PolicyKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Round-Robin time quantum, in ticks
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeQuantum {
    ticks: u32,
}

impl TimeQuantum {
    /// Create new time quantum
    pub fn new(ticks: u32) -> Result<Self, SchedulerError> {
        if ticks == 0 || ticks > MAX_QUANTUM_TICKS {
            return Err(SchedulerError::InvalidQuantum(ticks));
        }
        Ok(Self { ticks })
    }

    #[inline(always)]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }
}

impl Default for TimeQuantum {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_QUANTUM_TICKS,
        }
    }
}

impl<'de> Deserialize<'de> for TimeQuantum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ticks = u32::deserialize(deserializer)?;
        Self::new(ticks).map_err(serde::de::Error::custom)
    }
}

/// Which end of the priority scale runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// Priority 0 is the most urgent
    #[default]
    LowerFirst,
    /// Priority 255 is the most urgent
    HigherFirst,
}

impl FromStr for PriorityOrder {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "lower_first" | "ascending" | "asc" => Ok(Self::LowerFirst),
            "higher_first" | "descending" | "desc" => Ok(Self::HigherFirst),
            _ => Err(SchedulerError::InvalidPriorityOrder(s.to_string())),
        }
    }
}
