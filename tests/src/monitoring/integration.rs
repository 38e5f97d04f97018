#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lanwake_common::device::{DeviceId, DeviceStatus};
use lanwake_core::Runtime;
use lanwake_core::prober::{HandshakeProber, ProbeOutcome};
use lanwake_core::wake::{PacketTransmitter, WakeError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::support::{RecordingSink, ScriptedProber, config, device};

fn runtime(prober: Arc<ScriptedProber>, devices: usize) -> Runtime {
    let all = [
        device("Desk", "10.0.0.2", "aa:bb:cc:dd:ee:01"),
        device("NAS", "10.0.0.3", "aa:bb:cc:dd:ee:02"),
        device("Printer", "printer.invalid", "aa:bb:cc:dd:ee:03"),
    ];
    let cfg = config(all.into_iter().take(devices).collect());
    let sink = Box::new(RecordingSink::default());
    Runtime::with_parts(&cfg, prober, PacketTransmitter::new(sink, cfg.wake.target()))
}

fn status(rt: &Runtime, idx: usize) -> DeviceStatus {
    rt.registry.get(DeviceId(idx)).unwrap().status
}

/// Two devices, one answering and one silent: after one round only the
/// silent one may be woken.
#[tokio::test]
async fn one_round_online_and_offline() {
    let prober = Arc::new(ScriptedProber::with(&[("10.0.0.2", ProbeOutcome::Reachable)]));
    let rt = runtime(prober, 2);

    let started = Utc::now();
    let summaries = rt.monitor.run_rounds(1, &CancellationToken::new()).await;
    let finished = Utc::now();

    assert_eq!(summaries[0].online, 1);
    assert_eq!(summaries[0].offline, 1);
    assert_eq!(status(&rt, 0), DeviceStatus::Online);
    assert_eq!(status(&rt, 1), DeviceStatus::Offline);

    let checked = rt.registry.get(DeviceId(1)).unwrap().last_checked.unwrap();
    assert!(started <= checked && checked <= finished);

    assert!(matches!(rt.wake.wake_device(DeviceId(0)), Err(WakeError::AlreadyOnline(_))));
    rt.wake.wake_device(DeviceId(1)).unwrap();
}

#[tokio::test]
async fn resolver_failure_stays_with_its_device() {
    let prober = Arc::new(ScriptedProber::with(&[
        ("10.0.0.2", ProbeOutcome::Reachable),
        ("printer.invalid", ProbeOutcome::ProbeFailed("failed to resolve printer.invalid".into())),
    ]));
    let rt = runtime(prober, 3);

    rt.monitor.run_rounds(1, &CancellationToken::new()).await;

    assert_eq!(status(&rt, 0), DeviceStatus::Online);
    assert_eq!(status(&rt, 1), DeviceStatus::Offline);
    assert_eq!(status(&rt, 2), DeviceStatus::Error);
}

#[tokio::test]
async fn latest_round_wins() {
    let prober = Arc::new(ScriptedProber::with(&[("10.0.0.2", ProbeOutcome::Reachable)]));
    let rt = runtime(Arc::clone(&prober), 2);
    let cancel = CancellationToken::new();

    rt.monitor.run_rounds(1, &cancel).await;
    let first = rt.registry.get(DeviceId(0)).unwrap().last_checked;

    prober.set("10.0.0.2", ProbeOutcome::Unreachable);
    prober.set("10.0.0.3", ProbeOutcome::Reachable);
    rt.monitor.run_rounds(1, &cancel).await;

    assert_eq!(status(&rt, 0), DeviceStatus::Offline);
    assert_eq!(status(&rt, 1), DeviceStatus::Online);
    assert!(rt.registry.get(DeviceId(0)).unwrap().last_checked >= first);
}

#[tokio::test]
async fn stable_network_converges() {
    let prober = Arc::new(ScriptedProber::with(&[
        ("10.0.0.2", ProbeOutcome::Reachable),
        ("10.0.0.3", ProbeOutcome::Reachable),
    ]));
    let rt = runtime(prober, 2);
    let cancel = CancellationToken::new();

    rt.monitor.run_rounds(1, &cancel).await;
    let settled: Vec<DeviceStatus> = rt.registry.list().iter().map(|r| r.status).collect();
    let mut events = rt.events.subscribe();

    for summary in rt.monitor.run_rounds(4, &cancel).await {
        assert_eq!(summary.online, 2);
    }
    let after: Vec<DeviceStatus> = rt.registry.list().iter().map(|r| r.status).collect();
    assert_eq!(settled, after);

    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, lanwake_core::events::Event::StatusChanged { .. }),
            "unexpected change: {event}"
        );
    }
}

#[tokio::test]
async fn empty_configuration_runs_quietly() {
    let rt = runtime(Arc::new(ScriptedProber::default()), 0);
    let summaries = rt.monitor.run_rounds(3, &CancellationToken::new()).await;

    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.merged() == 0));
    assert!(rt.registry.list().is_empty());
}

#[tokio::test]
async fn background_loop_publishes_and_stops() {
    let prober = Arc::new(ScriptedProber::with(&[("10.0.0.2", ProbeOutcome::Reachable)]));
    let Runtime { registry, monitor, .. } = runtime(prober, 2);
    let cancel = CancellationToken::new();
    let mut revisions = registry.subscribe();

    let handle = monitor.spawn(cancel.clone());
    while *revisions.borrow_and_update() < 4 {
        revisions.changed().await.unwrap();
    }
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("monitor ignored cancellation")
        .unwrap();

    let rows = registry.list();
    assert_eq!(rows[0].status, DeviceStatus::Online);
    assert_eq!(rows[1].status, DeviceStatus::Offline);
}

/// Real sockets on loopback, using the unprivileged handshake prober.
#[tokio::test]
async fn handshake_prober_sees_loopback_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let cfg = config(vec![device("Loop", "127.0.0.1", "aa:bb:cc:dd:ee:ff")]);
    let rt = Runtime::with_parts(
        &cfg,
        Arc::new(HandshakeProber::new(port)),
        PacketTransmitter::new(Box::new(RecordingSink::default()), cfg.wake.target()),
    );

    rt.monitor.run_rounds(1, &CancellationToken::new()).await;
    assert_eq!(status(&rt, 0), DeviceStatus::Online);
}

/// Checking a named device before waking it must not probe the others.
#[tokio::test]
async fn single_device_check_before_wake() {
    let prober = Arc::new(ScriptedProber::with(&[("10.0.0.3", ProbeOutcome::Reachable)]));
    let rt = runtime(prober, 3);

    let merged = rt.monitor.check_device(DeviceId(0)).await.unwrap();

    assert_eq!(merged, Some(DeviceStatus::Offline));
    assert_eq!(status(&rt, 1), DeviceStatus::Unknown);
    assert_eq!(status(&rt, 2), DeviceStatus::Unknown);
    assert_eq!(rt.registry.revision(), 1);
    rt.wake.wake_device(DeviceId(0)).unwrap();
}
