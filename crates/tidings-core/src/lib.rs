//! In-process publish/subscribe event bus for tidings.
//!
//! - `bus` -- `EventBus`, the facade a host program constructs and shares
//! - `registry` -- concurrent event name -> (subscription id -> handler) map
//! - `dispatch` -- fire-and-forget fan-out of one event to a handler snapshot
//! - `handler` -- the `EventHandler` trait and its boxed, object-safe form
//! - `state` -- auxiliary concurrent key-value state store
//! - `id` -- pluggable unique token source for subscription ids
//! - `config` -- TOML loader for `BusConfig`

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod id;
pub mod registry;
pub mod state;

pub use bus::{Dispatch, EventBus, EventBusBuilder, Unsubscribed};
pub use handler::{BoxEventHandler, EventHandler, handler_fn};
pub use id::{IdGenerator, UuidGenerator};
pub use tidings_types::config::BusConfig;
pub use tidings_types::error::BusError;
pub use tidings_types::event::Event;
