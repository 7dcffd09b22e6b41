/*!
 * Tracing Setup
 * Structured logging for the simulator using the tracing crate
 */

use crate::core::types::Tick;
use tracing::{info, span, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Environment variable enabling JSON log output
pub const TRACE_JSON_ENV: &str = "SCHED_SIM_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SCHED_SIM_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this twice is harmless; the second call keeps the first subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Tracing initialized");
    }
}

/// Span covering one tick of a run
#[inline]
pub fn tick_span(session: Uuid, tick: Tick) -> Span {
    span!(Level::DEBUG, "tick", session = %session, tick)
}
