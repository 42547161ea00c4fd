use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::adapter::{ErrorAdapter, MetadataAdapter};
use super::consumer::TelemetryConsumer;
use super::payload::BodyStream;
use crate::error::{Error, Result};

pub type Metadata = HashMap<String, serde_json::Value>;
pub type Headers = HashMap<String, String>;

/// Error attached to a telemetry record. Shared so views stay cheap to clone.
pub type TelemetryError = Arc<anyhow::Error>;

/// Handle through which records are passed around and adapted.
pub type SharedTelemetry = Arc<dyn Telemetry>;

/// Which adapter a record is, when it is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Error,
    Metadata,
}

/// Immutable snapshot of one request/response interaction.
///
/// Implementations never change after construction. Adapted copies are
/// produced through [`TelemetryExt`], which wraps the record instead of
/// touching it.
pub trait Telemetry: Send + Sync + fmt::Debug {
    fn route(&self) -> &str;

    fn created_at(&self) -> SystemTime;

    fn duration(&self) -> Duration;

    fn error(&self) -> Option<&TelemetryError>;

    fn metadata(&self) -> &Metadata;

    fn request_headers(&self) -> &Headers;

    fn response_headers(&self) -> &Headers;

    /// Response code, mostly an HTTP status.
    fn response_code(&self) -> Option<i32>;

    fn request(&self) -> BodyStream<'_>;

    fn response(&self) -> BodyStream<'_>;

    /// Adapter marker: the kind of adapter and the record it delegates to.
    /// Plain records return `None`.
    fn adapted(&self) -> Option<(AdapterKind, &SharedTelemetry)> {
        None
    }

    /// Header lookup by lowercased name. Empty values count as missing.
    fn request_header(&self, name: &str) -> Option<&str> {
        lookup_header(self.request_headers(), name)
    }

    fn response_header(&self, name: &str) -> Option<&str> {
        lookup_header(self.response_headers(), name)
    }

    fn request_bytes(&self) -> Result<Vec<u8>> {
        self.request().into_bytes()
    }

    fn response_bytes(&self) -> Result<Vec<u8>> {
        self.response().into_bytes()
    }

    /// Full request body decoded as UTF-8. Absent body yields `""`.
    fn request_string(&self) -> Result<String> {
        self.request().into_string()
    }

    fn response_string(&self) -> Result<String> {
        self.response().into_string()
    }
}

fn lookup_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .get(&name.to_lowercase())
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Derivation operations. They need the shared handle, so they live on
/// `SharedTelemetry` rather than on the trait.
pub trait TelemetryExt {
    /// Applies `mapping`; `None` returns the same record.
    fn map(&self, mapping: Option<&dyn Fn(SharedTelemetry) -> SharedTelemetry>) -> SharedTelemetry;

    fn with_error(&self, error: impl Into<anyhow::Error>) -> SharedTelemetry;

    /// Merges `append` over the current metadata. `None` or an empty map
    /// returns the same record.
    fn with_metadata(&self, append: Option<Metadata>) -> SharedTelemetry;

    fn with_metadata_entry(
        &self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> SharedTelemetry;

    fn send_to(&self, consumer: Option<&dyn TelemetryConsumer>) -> anyhow::Result<()>;
}

impl TelemetryExt for SharedTelemetry {
    fn map(&self, mapping: Option<&dyn Fn(SharedTelemetry) -> SharedTelemetry>) -> SharedTelemetry {
        match mapping {
            Some(mapping) => mapping(Arc::clone(self)),
            None => Arc::clone(self),
        }
    }

    fn with_error(&self, error: impl Into<anyhow::Error>) -> SharedTelemetry {
        ErrorAdapter::of(Arc::clone(self), Arc::new(error.into()))
    }

    fn with_metadata(&self, append: Option<Metadata>) -> SharedTelemetry {
        MetadataAdapter::append(Arc::clone(self), append)
    }

    fn with_metadata_entry(
        &self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> SharedTelemetry {
        let mut append = Metadata::with_capacity(1);
        append.insert(key.into(), value.into());
        self.with_metadata(Some(append))
    }

    fn send_to(&self, consumer: Option<&dyn TelemetryConsumer>) -> anyhow::Result<()> {
        match consumer {
            Some(consumer) => consumer.accept(self),
            None => Ok(()),
        }
    }
}

/// The concrete record: owned fields, bodies as byte payloads.
#[derive(Debug, Clone)]
pub struct TelemetryRecord {
    route: String,
    created_at: SystemTime,
    duration: Duration,
    error: Option<TelemetryError>,
    metadata: Metadata,
    request_headers: Headers,
    response_headers: Headers,
    response_code: Option<i32>,
    request: Option<Arc<[u8]>>,
    response: Option<Arc<[u8]>>,
}

impl TelemetryRecord {
    pub fn builder() -> TelemetryBuilder {
        TelemetryBuilder::default()
    }

    pub fn into_shared(self) -> SharedTelemetry {
        Arc::new(self)
    }
}

impl Telemetry for TelemetryRecord {
    fn route(&self) -> &str {
        &self.route
    }

    fn created_at(&self) -> SystemTime {
        self.created_at
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn error(&self) -> Option<&TelemetryError> {
        self.error.as_ref()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    fn response_code(&self) -> Option<i32> {
        self.response_code
    }

    fn request(&self) -> BodyStream<'_> {
        BodyStream::from_bytes(self.request.as_deref())
    }

    fn response(&self) -> BodyStream<'_> {
        BodyStream::from_bytes(self.response.as_deref())
    }
}

/// Builder for [`TelemetryRecord`]. Everything but the route is optional.
#[derive(Debug, Default)]
pub struct TelemetryBuilder {
    route: Option<String>,
    created_at: Option<SystemTime>,
    duration: Option<Duration>,
    error: Option<TelemetryError>,
    metadata: Option<Metadata>,
    request_headers: Option<Headers>,
    response_headers: Option<Headers>,
    response_code: Option<i32>,
    request: Option<Arc<[u8]>>,
    response: Option<Arc<[u8]>>,
}

impl TelemetryBuilder {
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Defaults to the time `build` runs.
    pub fn created_at(mut self, created_at: SystemTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn error(mut self, error: impl Into<anyhow::Error>) -> Self {
        self.error = Some(Arc::new(error.into()));
        self
    }

    pub fn shared_error(mut self, error: Option<TelemetryError>) -> Self {
        self.error = error;
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn request_headers(mut self, headers: Headers) -> Self {
        self.request_headers = Some(headers);
        self
    }

    pub fn response_headers(mut self, headers: Headers) -> Self {
        self.response_headers = Some(headers);
        self
    }

    /// Adds one request header, lowercasing its name.
    pub fn request_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request_headers
            .get_or_insert_with(Headers::new)
            .insert(name.to_lowercase(), value.into());
        self
    }

    pub fn response_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.response_headers
            .get_or_insert_with(Headers::new)
            .insert(name.to_lowercase(), value.into());
        self
    }

    pub fn response_code(mut self, code: i32) -> Self {
        self.response_code = Some(code);
        self
    }

    pub fn request_body(mut self, body: impl Into<Arc<[u8]>>) -> Self {
        self.request = Some(body.into());
        self
    }

    pub fn response_body(mut self, body: impl Into<Arc<[u8]>>) -> Self {
        self.response = Some(body.into());
        self
    }

    pub fn build(self) -> Result<TelemetryRecord> {
        let route = match self.route {
            Some(route) if !route.is_empty() => route,
            _ => return Err(Error::MissingRoute),
        };

        Ok(TelemetryRecord {
            route,
            created_at: self.created_at.unwrap_or_else(SystemTime::now),
            duration: self.duration.unwrap_or(Duration::ZERO),
            error: self.error,
            metadata: self.metadata.unwrap_or_default(),
            request_headers: self.request_headers.unwrap_or_default(),
            response_headers: self.response_headers.unwrap_or_default(),
            response_code: self.response_code,
            request: self.request,
            response: self.response,
        })
    }
}
