//! Shared domain types for tidings.
//!
//! This crate contains the types exchanged between the event bus and its
//! host program: the `Event` value, subscription-id helpers, bus
//! configuration, and the bus error type.
//!
//! Zero runtime dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod subscription;
