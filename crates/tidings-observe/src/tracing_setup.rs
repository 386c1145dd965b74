//! Global subscriber setup for programs embedding the bus.
//!
//! The bus only emits `tracing` spans and events. Subscribe/unsubscribe and
//! publish fan-out log at `debug`, handler launches at `trace`, and handler
//! panics at `warn`, all under the [`CORE_TARGET`] target. A host program calls
//! [`init_tracing`] (or [`init_tracing_with`]) once at startup to see them.
//!
//! Without `RUST_LOG`, everything logs at `warn` and the bus at
//! [`TracingOptions::bus_level`]. A non-empty `RUST_LOG` replaces that
//! default entirely.
//!
//! # Usage
//!
//! ```no_run
//! use tidings_observe::tracing_setup::{TracingOptions, init_tracing, init_tracing_with};
//! use tracing_subscriber::filter::LevelFilter;
//!
//! // Human-readable logs, bus internals at info
//! init_tracing(false).unwrap();
//!
//! // JSON lines with every dispatch decision
//! init_tracing_with(TracingOptions {
//!     json: true,
//!     bus_level: LevelFilter::TRACE,
//!     ..TracingOptions::default()
//! })
//! .unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter, ParseError};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

use crate::attrs::{CORE_TARGET, TRACER_NAME};

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How the global subscriber is assembled.
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub enable_otel: bool,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
    /// Level for [`CORE_TARGET`] when `RUST_LOG` is unset.
    pub bus_level: LevelFilter,
    /// Log a close event (with busy/idle timings) for every span, so each
    /// handler invocation reports how long it ran.
    pub span_timing: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            enable_otel: false,
            json: false,
            bus_level: LevelFilter::INFO,
            span_timing: true,
        }
    }
}

/// Initialize the global subscriber with default options.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` is malformed or the global subscriber has
/// already been set.
pub fn init_tracing(enable_otel: bool) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing_with(TracingOptions {
        enable_otel,
        ..TracingOptions::default()
    })
}

/// Initialize the global subscriber from `options`.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` is malformed or the global subscriber has
/// already been set.
pub fn init_tracing_with(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&options, env.as_deref())?;

    let span_events = if options.span_timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let (text_layer, json_layer) = if options.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_span_events(span_events);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_span_events(span_events);
        (Some(layer), None)
    };

    let otel_layer = if options.enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer(TRACER_NAME);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// The filter the subscriber starts with.
///
/// A non-empty `env` (the `RUST_LOG` value) is parsed as-is. Otherwise
/// everything is limited to `warn` and the bus target to `options.bus_level`.
fn build_filter(options: &TracingOptions, env: Option<&str>) -> Result<EnvFilter, ParseError> {
    match env.map(str::trim) {
        Some(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => Ok(EnvFilter::new(LevelFilter::WARN.to_string())
            .add_directive(bus_directive(options.bus_level)?)),
    }
}

fn bus_directive(level: LevelFilter) -> Result<Directive, ParseError> {
    format!("{CORE_TARGET}={level}").parse()
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
