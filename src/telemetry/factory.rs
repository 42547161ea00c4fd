//! Shorthand constructors. Both stamp the current time and fall back to
//! empty maps, zero duration and absent error/code/bodies.

use std::sync::Arc;
use std::time::Duration;

use super::record::{Headers, Metadata, SharedTelemetry, TelemetryError, TelemetryRecord};
use crate::error::Result;

/// Record of a complete request/response exchange.
#[allow(clippy::too_many_arguments)]
pub fn full(
    route: &str,
    duration: Option<Duration>,
    error: Option<TelemetryError>,
    metadata: Option<Metadata>,
    request_headers: Option<Headers>,
    response_headers: Option<Headers>,
    response_code: Option<i32>,
    request: Option<Vec<u8>>,
    response: Option<Vec<u8>>,
) -> Result<SharedTelemetry> {
    let mut builder = TelemetryRecord::builder()
        .route(route)
        .duration(duration.unwrap_or_default())
        .shared_error(error)
        .metadata(metadata.unwrap_or_default())
        .request_headers(request_headers.unwrap_or_default())
        .response_headers(response_headers.unwrap_or_default());
    if let Some(code) = response_code {
        builder = builder.response_code(code);
    }
    if let Some(body) = request {
        builder = builder.request_body(Arc::<[u8]>::from(body));
    }
    if let Some(body) = response {
        builder = builder.response_body(Arc::<[u8]>::from(body));
    }
    Ok(builder.build()?.into_shared())
}

/// Record of a request that has not produced a response.
pub fn request(
    route: &str,
    error: Option<TelemetryError>,
    metadata: Option<Metadata>,
    request_headers: Option<Headers>,
    request: Option<Vec<u8>>,
) -> Result<SharedTelemetry> {
    full(route, None, error, metadata, request_headers, None, None, request, None)
}
