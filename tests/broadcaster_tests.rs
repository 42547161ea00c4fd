use std::sync::{Arc, Mutex};

use telemetry::{factory, Broadcaster, SharedTelemetry, Telemetry, TelemetryConsumer, TelemetryExt};

type Log = Arc<Mutex<Vec<String>>>;

fn recording(log: &Log, name: &'static str) -> Arc<dyn TelemetryConsumer> {
    let log = Arc::clone(log);
    Arc::new(move |t: &SharedTelemetry| -> anyhow::Result<()> {
        log.lock().unwrap().push(format!("{name}:{}", t.route()));
        Ok(())
    })
}

fn failing(log: &Log, name: &'static str) -> Arc<dyn TelemetryConsumer> {
    let log = Arc::clone(log);
    Arc::new(move |_: &SharedTelemetry| -> anyhow::Result<()> {
        log.lock().unwrap().push(name.to_string());
        anyhow::bail!("{name} failed")
    })
}

fn record() -> SharedTelemetry {
    factory::request("/ping", None, None, None, None).unwrap()
}

#[test]
fn test_dispatch_in_registration_order() {
    let log = Log::default();
    let b = Broadcaster::new([recording(&log, "A"), recording(&log, "B"), recording(&log, "C")]);

    b.accept(&record()).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A:/ping", "B:/ping", "C:/ping"]);
}

#[test]
fn test_nested_broadcasters_are_flattened() {
    let nested_log = Log::default();
    let inner = Broadcaster::new([recording(&nested_log, "B"), recording(&nested_log, "C")]);
    let nested = Broadcaster::new([
        recording(&nested_log, "A"),
        inner.into_consumer(),
        recording(&nested_log, "D"),
    ]);
    assert_eq!(nested.len(), 4);

    let flat_log = Log::default();
    let flat = Broadcaster::new([
        recording(&flat_log, "A"),
        recording(&flat_log, "B"),
        recording(&flat_log, "C"),
        recording(&flat_log, "D"),
    ]);

    nested.accept(&record()).unwrap();
    flat.accept(&record()).unwrap();
    assert_eq!(*nested_log.lock().unwrap(), vec!["A:/ping", "B:/ping", "C:/ping", "D:/ping"]);
    assert_eq!(*nested_log.lock().unwrap(), *flat_log.lock().unwrap());
}

#[test]
fn test_none_consumers_are_skipped() {
    let log = Log::default();
    let b = Broadcaster::new([None, Some(recording(&log, "A")), None]);
    assert_eq!(b.len(), 1);

    b.accept(&record()).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["A:/ping"]);
}

#[test]
fn test_empty_broadcaster_accepts() {
    let b = Broadcaster::new(Vec::<Arc<dyn TelemetryConsumer>>::new());
    assert!(b.is_empty());
    assert!(b.accept(&record()).is_ok());
}

#[test]
fn test_last_failure_wins_and_all_consumers_run() {
    let log = Log::default();
    let b = Broadcaster::new([failing(&log, "A"), failing(&log, "B"), recording(&log, "C")]);

    let err = b.accept(&record()).unwrap_err();
    assert_eq!(err.to_string(), "B failed");
    assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C:/ping"]);
}

#[test]
fn test_single_failure_surfaces_after_later_consumers() {
    let log = Log::default();
    let b = Broadcaster::new([recording(&log, "A"), failing(&log, "B"), recording(&log, "C")]);

    let err = b.accept(&record()).unwrap_err();
    assert_eq!(err.to_string(), "B failed");
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[test]
fn test_send_to_dispatches_adapted_view() {
    let seen: Arc<Mutex<Option<String>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let b = Broadcaster::new([Arc::new(move |t: &SharedTelemetry| -> anyhow::Result<()> {
        *sink.lock().unwrap() = t.error().map(|e| e.to_string());
        Ok(())
    }) as Arc<dyn TelemetryConsumer>]);

    record().with_error(anyhow::anyhow!("denied")).send_to(Some(&b)).unwrap();
    assert_eq!(seen.lock().unwrap().as_deref(), Some("denied"));
}

#[tokio::test]
async fn test_shared_broadcaster_across_tasks() {
    let log = Log::default();
    let b = Arc::new(Broadcaster::new([recording(&log, "A"), recording(&log, "B")]));
    let t = record().with_metadata_entry("shared", true);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let b = Arc::clone(&b);
        let t = Arc::clone(&t);
        handles.push(tokio::spawn(async move { b.accept(&t) }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(log.lock().unwrap().len(), 16);
}
