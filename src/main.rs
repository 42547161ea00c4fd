use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use telemetry::config::LogConfig;
use telemetry::factory;
use telemetry::{Broadcaster, SharedTelemetry, Telemetry, TelemetryConsumer, TelemetryExt};

// Stand-in for a real handler: echoes the body after a short delay
async fn handle(route: &str, body: &[u8]) -> anyhow::Result<(i32, Vec<u8>)> {
    tokio::time::sleep(Duration::from_millis(25)).await;
    if route == "/fail" {
        anyhow::bail!("upstream unavailable");
    }
    Ok((200, body.to_vec()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => LogConfig::load(path)?,
        None => LogConfig::default(),
    };
    config.init();
    tracing::info!("Telemetry demo starting...");

    let errors = Arc::new(AtomicU64::new(0));
    let error_counter = Arc::clone(&errors);

    let log: Arc<dyn TelemetryConsumer> = Arc::new(|t: &SharedTelemetry| -> anyhow::Result<()> {
        let response = t.response_string()?;
        tracing::info!(
            route = t.route(),
            duration_ms = t.duration().as_millis() as u64,
            code = ?t.response_code(),
            metadata = ?t.metadata(),
            error = ?t.error().map(|e| e.to_string()),
            response = %response,
            "telemetry"
        );
        Ok(())
    });
    let count: Arc<dyn TelemetryConsumer> = Arc::new(move |t: &SharedTelemetry| -> anyhow::Result<()> {
        if t.error().is_some() {
            error_counter.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    });
    let sink = Broadcaster::new([log, count]);

    for route in ["/echo", "/fail"] {
        let body = format!("{{\"route\":\"{route}\"}}").into_bytes();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        let started = Instant::now();
        let outcome = handle(route, &body).await;
        let elapsed = started.elapsed();

        let record = match outcome {
            Ok((code, response)) => factory::full(
                route,
                Some(elapsed),
                None,
                None,
                Some(headers),
                None,
                Some(code),
                Some(body),
                Some(response),
            )?,
            Err(e) => factory::request(route, None, None, Some(headers), Some(body))?.with_error(e),
        };

        let record = record.with_metadata_entry("attempt", 1);
        if let Err(e) = record.send_to(Some(&sink)) {
            tracing::warn!("Dispatch failed: {}", e);
        }
    }

    tracing::info!(errors = errors.load(Ordering::Relaxed), "Telemetry demo done.");
    Ok(())
}
