use std::fmt;
use std::sync::Arc;

use super::record::{SharedTelemetry, Telemetry};

/// Receives finished telemetry records: loggers, exporters, tracers.
pub trait TelemetryConsumer: Send + Sync {
    fn accept(&self, telemetry: &SharedTelemetry) -> anyhow::Result<()>;

    /// Marker used to flatten nested broadcasters.
    fn as_broadcaster(&self) -> Option<&Broadcaster> {
        None
    }
}

impl<F> TelemetryConsumer for F
where
    F: Fn(&SharedTelemetry) -> anyhow::Result<()> + Send + Sync,
{
    fn accept(&self, telemetry: &SharedTelemetry) -> anyhow::Result<()> {
        self(telemetry)
    }
}

/// Fans one record out to a fixed list of consumers.
///
/// Dispatch is synchronous and in registration order. A failing consumer
/// does not stop the ones after it; once every consumer has run, the last
/// failure is returned and earlier ones are dropped (they are still logged).
#[derive(Clone)]
pub struct Broadcaster {
    consumers: Arc<[Arc<dyn TelemetryConsumer>]>,
}

impl Broadcaster {
    /// Builds a broadcaster, skipping `None` entries and splicing in the
    /// consumers of any nested broadcaster.
    pub fn new<I, C>(consumers: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Option<Arc<dyn TelemetryConsumer>>>,
    {
        let mut flat: Vec<Arc<dyn TelemetryConsumer>> = Vec::new();
        for consumer in consumers {
            let consumer: Option<Arc<dyn TelemetryConsumer>> = consumer.into();
            let Some(consumer) = consumer else {
                continue;
            };
            match consumer.as_broadcaster() {
                Some(nested) => flat.extend(nested.consumers.iter().cloned()),
                None => flat.push(consumer),
            }
        }
        Self {
            consumers: flat.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn into_consumer(self) -> Arc<dyn TelemetryConsumer> {
        Arc::new(self)
    }
}

impl TelemetryConsumer for Broadcaster {
    fn accept(&self, telemetry: &SharedTelemetry) -> anyhow::Result<()> {
        let mut last_error = None;
        for (index, consumer) in self.consumers.iter().enumerate() {
            if let Err(e) = consumer.accept(telemetry) {
                tracing::warn!(
                    route = telemetry.route(),
                    consumer = index,
                    error = %e,
                    "telemetry consumer failed"
                );
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn as_broadcaster(&self) -> Option<&Broadcaster> {
        Some(self)
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("consumers", &self.consumers.len())
            .finish()
    }
}
