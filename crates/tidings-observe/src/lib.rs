//! Observability setup for tidings.
//!
//! - `tracing_setup` -- global subscriber initialization (fmt + `EnvFilter`,
//!   optional OpenTelemetry export)
//! - `attrs` -- span and field names emitted by the dispatcher

pub mod attrs;
pub mod tracing_setup;
