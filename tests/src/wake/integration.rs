#![cfg(test)]
use std::sync::Arc;

use lanwake_common::config::WakeSettings;
use lanwake_common::error::TransmitError;
use lanwake_core::events::{Event, EventFeed};
use lanwake_core::registry::Registry;
use lanwake_core::wake::{PacketTransmitter, WakeService};
use lanwake_protocols::magic;

use crate::support::{RecordingSink, device};

fn service(sink: &Arc<RecordingSink>, settings: &WakeSettings) -> (WakeService, EventFeed) {
    let registry = Arc::new(Registry::new(vec![device("Desk", "10.0.0.2", "AA:BB:CC:DD:EE:FF")]));
    let feed = EventFeed::new();
    let tx = PacketTransmitter::new(Box::new(Arc::clone(sink)), settings.target());
    (WakeService::new(registry, tx, feed.clone()), feed)
}

#[test]
fn magic_packet_is_102_bytes_to_broadcast_port_9() {
    let sink = Arc::new(RecordingSink::default());
    let (svc, feed) = service(&sink, &WakeSettings::default());
    let mut events = feed.subscribe();

    assert!(svc.wake_host("AA:BB:CC:DD:EE:FF", "Desk"));

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (payload, target) = &sent[0];
    assert_eq!(payload.len(), 6 + 16 * 6);
    assert!(payload[..6].iter().all(|b| *b == 0xFF));
    assert_eq!(magic::target_of(payload).unwrap().to_string(), "aa:bb:cc:dd:ee:ff");
    assert_eq!(target.to_string(), "255.255.255.255:9");

    assert!(matches!(events.try_recv().unwrap(), Event::WakeSent { .. }));
}

#[test]
fn subnet_broadcast_is_honoured() {
    let sink = Arc::new(RecordingSink::default());
    let settings = WakeSettings {
        broadcast: "192.168.1.255".parse().unwrap(),
        port: 7,
    };
    let (svc, _feed) = service(&sink, &settings);

    assert!(svc.wake_host("aa-bb-cc-dd-ee-ff", "Desk"));
    assert_eq!(sink.sent.lock().unwrap()[0].1.to_string(), "192.168.1.255:7");
}

#[test]
fn malformed_address_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let (svc, feed) = service(&sink, &WakeSettings::default());
    let mut events = feed.subscribe();

    assert!(!svc.wake_host("not-a-mac", "Desk"));
    assert!(sink.sent.lock().unwrap().is_empty());
    match events.try_recv().unwrap() {
        Event::WakeFailed { name, reason } => {
            assert_eq!(name, "Desk");
            assert!(reason.contains("not-a-mac"));
        }
        other => panic!("unexpected event: {other}"),
    }

    let tx = PacketTransmitter::new(Box::new(Arc::clone(&sink)), WakeSettings::default().target());
    assert!(matches!(
        tx.send_wake_packet("not-a-mac"),
        Err(TransmitError::InvalidAddress(_))
    ));
    assert!(sink.sent.lock().unwrap().is_empty());
}
