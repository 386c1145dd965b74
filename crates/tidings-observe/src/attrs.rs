//! Span, field and target names emitted by the tidings dispatcher.
//!
//! Field names are also spelled out literally inside the `tracing` macros
//! (which require identifiers); these constants are the reference for
//! subscribers and exporters that filter on them. tidings-core tests check
//! that the emitted names match.

/// Span wrapping a single handler invocation.
pub const SPAN_HANDLE: &str = "tidings.handle";

/// Span wrapping one publish call (registry snapshot and handler launches).
pub const SPAN_PUBLISH: &str = "tidings.publish";

/// The routing key of the event being dispatched.
pub const EVENT_NAME: &str = "tidings.event.name";

/// Whether the dispatched event is a cancellation signal.
pub const EVENT_CANCEL: &str = "tidings.event.cancel";

/// The subscription id of the handler being invoked.
pub const SUBSCRIPTION_ID: &str = "tidings.subscription.id";

/// Number of handlers launched by a publish.
pub const HANDLER_COUNT: &str = "tidings.handler.count";

/// OpenTelemetry tracer / instrumentation scope name.
pub const TRACER_NAME: &str = "tidings";

/// `tracing` target of the bus internals, used in filter directives.
pub const CORE_TARGET: &str = "tidings_core";

/// Thread name for handlers published from outside any Tokio runtime.
pub const HANDLER_THREAD_NAME: &str = "tidings-handler";
