pub mod config;
pub mod error;
pub mod telemetry;

// Re-export specific items for convenient access
pub use error::{Error, Result};
pub use telemetry::factory;
pub use telemetry::{Broadcaster, SharedTelemetry, Telemetry, TelemetryConsumer, TelemetryExt};
