//! # commander-bind — Payload Binding
//!
//! Assigns the fields of registered structure instances from a decoded
//! [`Payload`](commander_core::Payload), following each field's resolved
//! descriptor:
//!
//! - [`Binder`]: the entry point (`bind`, `fill`, `fill_typed`).
//! - [`coerce`]: the primitive coercion rules.
//! - [`FromInstance`]: conversion of bound instances into Rust types.
//!
//! ## Crate Policy
//!
//! - Binding is synchronous and never performs I/O.
//! - `Binder` is immutable; share it behind an `Arc`.

pub mod binder;
pub mod coerce;
pub mod typed;

pub use binder::{BindOptions, Binder, DEFAULT_MAX_DEPTH};
pub use typed::{FromInstance, InstanceExt};
