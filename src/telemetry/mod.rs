//! Request/response telemetry records and their fan-out.
//!
//! # IMMUTABILITY INVARIANT
//! A record never changes once built. Attaching an error or metadata yields
//! a new view over the same record, and the view collapses onto the record
//! underneath when it wraps an adapter of its own kind.
//!
//! # DISPATCH INVARIANT
//! A [`Broadcaster`] runs every consumer, in registration order, on the
//! calling thread. Only the last failure reaches the caller.

pub mod adapter;
pub mod consumer;
pub mod factory;
pub mod payload;
pub mod record;

pub use adapter::{ErrorAdapter, MetadataAdapter};
pub use consumer::{Broadcaster, TelemetryConsumer};
pub use payload::BodyStream;
pub use record::{
    AdapterKind, Headers, Metadata, SharedTelemetry, Telemetry, TelemetryBuilder, TelemetryError,
    TelemetryExt, TelemetryRecord,
};
