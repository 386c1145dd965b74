//! Event handler abstraction.
//!
//! Follows the same blanket-impl pattern used for other pluggable services:
//! 1. `EventHandler` is the ergonomic trait (native async fn, not object safe)
//! 2. `EventHandlerDyn` is its object-safe twin returning a boxed future,
//!    blanket-implemented for every `EventHandler`
//! 3. `BoxEventHandler` wraps `Arc<dyn EventHandlerDyn>` and is what the
//!    registry stores and the dispatcher clones into each invocation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tidings_types::event::Event;

/// A callable registered against an event name.
///
/// Invoked once per published occurrence of that event, on its own task.
/// The bus never observes the outcome. Handlers that want cooperative
/// cancellation check [`Event::is_cancel`].
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: Arc<Event>) -> impl Future<Output = ()> + Send;
}

/// Object-safe version of [`EventHandler`] with a boxed future.
pub trait EventHandlerDyn: Send + Sync {
    fn handle_boxed(&self, event: Arc<Event>) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

impl<T: EventHandler> EventHandlerDyn for T {
    fn handle_boxed(&self, event: Arc<Event>) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.handle(event))
    }
}

/// Type-erased, cheaply cloneable handler.
#[derive(Clone)]
pub struct BoxEventHandler {
    inner: Arc<dyn EventHandlerDyn>,
}

impl BoxEventHandler {
    pub fn new<T: EventHandler + 'static>(handler: T) -> Self {
        Self {
            inner: Arc::new(handler),
        }
    }

    pub fn handle(&self, event: Arc<Event>) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.inner.handle_boxed(event)
    }
}

impl std::fmt::Debug for BoxEventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxEventHandler").finish_non_exhaustive()
    }
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    fn handle(&self, event: Arc<Event>) -> impl Future<Output = ()> + Send {
        (self.f)(event)
    }
}

/// Adapt a closure returning a future into an [`EventHandler`].
///
/// ```
/// use tidings_core::handler_fn;
///
/// let handler = handler_fn(|event| async move {
///     println!("got {}", event.name);
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    FnHandler { f }
}
