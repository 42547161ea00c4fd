//! Read-only views that override one field of a record and forward the rest.
//!
//! Wrapping an adapter of the same kind rebinds to the record underneath it,
//! so a chain of `with_error` (or of metadata replacements) never grows past
//! a single level.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::payload::BodyStream;
use super::record::{AdapterKind, Headers, Metadata, SharedTelemetry, Telemetry, TelemetryError};

/// Unwraps `telemetry` one level if it is an adapter of `kind`.
fn unwrap_kind(telemetry: SharedTelemetry, kind: AdapterKind) -> SharedTelemetry {
    if let Some((found, real)) = telemetry.adapted() {
        if found == kind {
            tracing::trace!(route = telemetry.route(), ?kind, "collapsing adapter");
            return Arc::clone(real);
        }
    }
    telemetry
}

#[derive(Debug)]
pub struct ErrorAdapter {
    real: SharedTelemetry,
    error: TelemetryError,
}

impl ErrorAdapter {
    /// Attaches `error`, replacing whatever error an existing error view holds.
    pub fn of(telemetry: SharedTelemetry, error: TelemetryError) -> SharedTelemetry {
        Arc::new(Self {
            real: unwrap_kind(telemetry, AdapterKind::Error),
            error,
        })
    }
}

impl Telemetry for ErrorAdapter {
    fn route(&self) -> &str {
        self.real.route()
    }

    fn created_at(&self) -> SystemTime {
        self.real.created_at()
    }

    fn duration(&self) -> Duration {
        self.real.duration()
    }

    fn error(&self) -> Option<&TelemetryError> {
        Some(&self.error)
    }

    fn metadata(&self) -> &Metadata {
        self.real.metadata()
    }

    fn request_headers(&self) -> &Headers {
        self.real.request_headers()
    }

    fn response_headers(&self) -> &Headers {
        self.real.response_headers()
    }

    fn response_code(&self) -> Option<i32> {
        self.real.response_code()
    }

    fn request(&self) -> BodyStream<'_> {
        self.real.request()
    }

    fn response(&self) -> BodyStream<'_> {
        self.real.response()
    }

    fn adapted(&self) -> Option<(AdapterKind, &SharedTelemetry)> {
        Some((AdapterKind::Error, &self.real))
    }
}

#[derive(Debug)]
pub struct MetadataAdapter {
    real: SharedTelemetry,
    metadata: Metadata,
}

impl MetadataAdapter {
    /// Installs exactly `metadata`. `None` or an empty map returns `original`.
    pub fn replace(original: SharedTelemetry, metadata: Option<Metadata>) -> SharedTelemetry {
        let metadata = match metadata {
            Some(metadata) if !metadata.is_empty() => metadata,
            _ => return original,
        };
        Arc::new(Self {
            real: unwrap_kind(original, AdapterKind::Metadata),
            metadata,
        })
    }

    /// Merges `append` over the current metadata; `append` wins on collisions.
    pub fn append(original: SharedTelemetry, append: Option<Metadata>) -> SharedTelemetry {
        let append = match append {
            Some(append) if !append.is_empty() => append,
            _ => {
                tracing::trace!(route = original.route(), "empty metadata append, keeping record");
                return original;
            }
        };

        let mut combined = original.metadata().clone();
        combined.extend(append);
        Self::replace(original, Some(combined))
    }
}

impl Telemetry for MetadataAdapter {
    fn route(&self) -> &str {
        self.real.route()
    }

    fn created_at(&self) -> SystemTime {
        self.real.created_at()
    }

    fn duration(&self) -> Duration {
        self.real.duration()
    }

    fn error(&self) -> Option<&TelemetryError> {
        self.real.error()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn request_headers(&self) -> &Headers {
        self.real.request_headers()
    }

    fn response_headers(&self) -> &Headers {
        self.real.response_headers()
    }

    fn response_code(&self) -> Option<i32> {
        self.real.response_code()
    }

    fn request(&self) -> BodyStream<'_> {
        self.real.request()
    }

    fn response(&self) -> BodyStream<'_> {
        self.real.response()
    }

    fn adapted(&self) -> Option<(AdapterKind, &SharedTelemetry)> {
        Some((AdapterKind::Metadata, &self.real))
    }
}
