/*!
 * Simulation Configuration
 *
 * Runtime configuration loaded from a JSON file or SCHED_SIM_* environment
 * variables. Environment values override file values.
 */

use super::errors::ConfigError;
use super::limits::{
    COMPLETION_TOLERANCE, DEFAULT_QUANTUM_TICKS, DEFAULT_TICK_PERIOD, EVENT_CHANNEL_CAPACITY,
    MIN_TICK_PERIOD, STORE_RETRY_ATTEMPTS, STORE_RETRY_BACKOFF,
};
use crate::scheduler::{PolicyKind, PriorityOrder, TimeQuantum};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming a JSON configuration file
pub const CONFIG_PATH_ENV: &str = "SCHED_SIM_CONFIG";

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SimulationConfig {
    /// Active scheduling policy
    pub policy: PolicyKind,
    /// Round-Robin quantum (ticks)
    pub quantum: u32,
    /// Wall-clock period of one tick (milliseconds)
    pub tick_period_ms: u64,
    /// Direction of the priority scale
    pub priority_order: PriorityOrder,
    /// Slack reconciled silently when completion signals disagree
    pub completion_tolerance: u32,
    /// Attempts per store operation
    pub store_retry_attempts: u32,
    /// First backoff between store attempts (milliseconds)
    pub store_retry_backoff_ms: u64,
    /// Event broadcast buffer
    pub event_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Fcfs,
            quantum: DEFAULT_QUANTUM_TICKS,
            tick_period_ms: DEFAULT_TICK_PERIOD.as_millis() as u64,
            priority_order: PriorityOrder::LowerFirst,
            completion_tolerance: COMPLETION_TOLERANCE,
            store_retry_attempts: STORE_RETRY_ATTEMPTS,
            store_retry_backoff_ms: STORE_RETRY_BACKOFF.as_millis() as u64,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl SimulationConfig {
    /// Configuration for a given policy with all other defaults
    pub fn for_policy(policy: PolicyKind) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_quantum(mut self, quantum: u32) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = period.as_millis() as u64;
        self
    }

    pub fn with_priority_order(mut self, order: PriorityOrder) -> Self {
        self.priority_order = order;
        self
    }

    pub fn with_store_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.store_retry_attempts = attempts;
        self.store_retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Load configuration: file named by `SCHED_SIM_CONFIG` (if set), then env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path)?,
            _ => Self::default(),
        };
        base.apply_env(|key| std::env::var(key).ok())
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load from a JSON file; missing keys fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCHED_SIM_*` overrides from an arbitrary variable source
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SCHED_SIM_POLICY") {
            self.policy = parse_value("SCHED_SIM_POLICY", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_QUANTUM") {
            self.quantum = parse_value("SCHED_SIM_QUANTUM", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_TICK_MS") {
            self.tick_period_ms = parse_value("SCHED_SIM_TICK_MS", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_PRIORITY_ORDER") {
            self.priority_order = parse_value("SCHED_SIM_PRIORITY_ORDER", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_TOLERANCE") {
            self.completion_tolerance = parse_value("SCHED_SIM_TOLERANCE", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_STORE_RETRIES") {
            self.store_retry_attempts = parse_value("SCHED_SIM_STORE_RETRIES", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_STORE_BACKOFF_MS") {
            self.store_retry_backoff_ms = parse_value("SCHED_SIM_STORE_BACKOFF_MS", &value)?;
        }
        if let Some(value) = lookup("SCHED_SIM_EVENT_CAPACITY") {
            self.event_capacity = parse_value("SCHED_SIM_EVENT_CAPACITY", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        TimeQuantum::new(self.quantum).map_err(|e| ConfigError::InvalidValue {
            key: "quantum".into(),
            value: self.quantum.to_string(),
            reason: e.to_string(),
        })?;

        if self.tick_period() < MIN_TICK_PERIOD {
            return Err(ConfigError::InvalidValue {
                key: "tick_period_ms".into(),
                value: self.tick_period_ms.to_string(),
                reason: format!("must be at least {:?}", MIN_TICK_PERIOD),
            });
        }

        if self.store_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "store_retry_attempts".into(),
                value: "0".into(),
                reason: "at least one attempt is required".into(),
            });
        }

        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_capacity".into(),
                value: "0".into(),
                reason: "broadcast channels need a non-zero buffer".into(),
            });
        }

        Ok(())
    }

    /// Validated quantum (falls back to the default on an invalid value)
    pub fn time_quantum(&self) -> TimeQuantum {
        TimeQuantum::new(self.quantum).unwrap_or_default()
    }

    #[inline]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    #[inline]
    pub fn store_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.store_retry_backoff_ms)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
