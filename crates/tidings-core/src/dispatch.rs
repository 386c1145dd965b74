//! Fire-and-forget fan-out of one event to a snapshot of handlers.
//!
//! Each handler invocation is launched independently and never awaited: the
//! publisher does not learn about handler completion.
//!
//! ## Where handlers run
//! - Publisher inside a Tokio runtime: one task per handler on that runtime.
//! - Publisher outside any runtime: one named thread per handler, driving the
//!   invocation on its own current-thread runtime (so handlers may still use
//!   Tokio timers and I/O). A publish made from such a handler thread is
//!   launched on fresh threads too, since that private runtime ends with the
//!   invocation.
//!
//! No runtime handle is ever cached, so a runtime that has since shut down
//! can never swallow an invocation. An id is only reported once its task or
//! thread has actually been started.
//!
//! ## Panic handling
//! Every invocation runs under `catch_unwind`, including the synchronous part
//! of building the handler's future. A panic is logged and discarded at the
//! task boundary; sibling handlers and the publisher are unaffected.
//!
//! **Warning**: `AssertUnwindSafe` is used, so a handler that panics while
//! holding a lock on shared state may leave that state poisoned or
//! inconsistent for other handlers.

use std::any::Any;
use std::cell::Cell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{Instrument, info_span, trace, warn};

use tidings_observe::attrs::{HANDLER_THREAD_NAME, SPAN_HANDLE};
use tidings_types::event::Event;

use crate::handler::BoxEventHandler;

thread_local! {
    /// Set on threads started by the dispatcher for a single invocation.
    static INVOCATION_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Launches handler invocations.
#[derive(Debug)]
pub struct Dispatcher {
    log_handler_panics: bool,
}

impl Dispatcher {
    pub fn new(log_handler_panics: bool) -> Self {
        Self { log_handler_panics }
    }

    /// Launch one invocation per handler and return the launched ids in order.
    ///
    /// All invocations share the same `Arc<Event>`. Returns as soon as every
    /// invocation has been started.
    pub fn dispatch(&self, event: Event, handlers: Vec<(String, BoxEventHandler)>) -> Vec<String> {
        if handlers.is_empty() {
            return Vec::new();
        }

        let event = Arc::new(event);
        let runtime = current_runtime();
        let mut launched = Vec::with_capacity(handlers.len());

        for (id, handler) in handlers {
            let span = info_span!(
                SPAN_HANDLE,
                tidings.event.name = %event.name,
                tidings.event.cancel = event.cancel,
                tidings.subscription.id = %id,
            );
            let invocation = invoke(
                handler,
                Arc::clone(&event),
                id.clone(),
                self.log_handler_panics,
            )
            .instrument(span);

            match &runtime {
                Some(handle) => {
                    handle.spawn(invocation);
                }
                None => {
                    if let Err(err) = spawn_invocation_thread(invocation) {
                        warn!(
                            event = %event.name,
                            subscription_id = %id,
                            %err,
                            "failed to start handler thread"
                        );
                        continue;
                    }
                }
            }

            trace!(event = %event.name, subscription_id = %id, "launched handler");
            launched.push(id);
        }

        launched
    }
}

/// The caller's runtime, unless the caller is a dispatcher invocation thread.
fn current_runtime() -> Option<Handle> {
    if INVOCATION_THREAD.with(Cell::get) {
        return None;
    }
    Handle::try_current().ok()
}

/// Run one handler with its panics contained.
async fn invoke(handler: BoxEventHandler, event: Arc<Event>, id: String, log_panics: bool) {
    let invocation = AssertUnwindSafe(async { handler.handle(event).await });
    if let Err(panic_err) = invocation.catch_unwind().await {
        if log_panics {
            warn!(
                subscription_id = %id,
                panic = %panic_message(&*panic_err),
                "handler panicked"
            );
        }
    }
}

/// Drive `invocation` to completion on a dedicated thread.
fn spawn_invocation_thread<F>(invocation: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    std::thread::Builder::new()
        .name(HANDLER_THREAD_NAME.to_string())
        .spawn(move || {
            INVOCATION_THREAD.with(|flag| flag.set(true));
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(invocation),
                Err(err) => {
                    warn!(%err, "no runtime for handler thread, running without one");
                    futures::executor::block_on(invocation);
                }
            }
        })
        .map(|_| ())
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
