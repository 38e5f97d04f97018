//! # Wake-on-LAN
//!
//! [`PacketTransmitter`] turns a hardware address into a magic packet and hands
//! it to a [`DatagramSink`]; [`WakeService`] is the operator-facing entry point
//! that also consults the registry and reports through the event feed.
//!
//! Sending is fire-and-forget: success only means the datagram reached the
//! local network stack.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use lanwake_common::config::WakeSettings;
use lanwake_common::device::{DeviceId, DeviceSnapshot};
use lanwake_common::error::TransmitError;
use lanwake_common::network::mac;
use lanwake_protocols::magic;
use pnet::util::MacAddr;
use thiserror::Error;
use tracing::debug;

use crate::events::{Event, EventFeed};
use crate::registry::Registry;

/// Connectionless transport for a single datagram.
pub trait DatagramSink: Send + Sync {
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransmitError>;
}

impl<T: DatagramSink + ?Sized> DatagramSink for Arc<T> {
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransmitError> {
        (**self).send_to(payload, target)
    }
}

/// Sends from a fresh ephemeral UDP socket with broadcast enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpBroadcastSink;

impl DatagramSink for UdpBroadcastSink {
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransmitError> {
        let socket: UdpSocket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(TransmitError::Socket)?;
        socket.set_broadcast(true).map_err(TransmitError::Socket)?;
        socket.send_to(payload, target).map_err(TransmitError::Send)?;
        Ok(())
    }
}

pub struct PacketTransmitter {
    sink: Box<dyn DatagramSink>,
    target: SocketAddr,
}

impl PacketTransmitter {
    pub fn new(sink: Box<dyn DatagramSink>, target: SocketAddr) -> Self {
        Self { sink, target }
    }

    /// Broadcasts through [`UdpBroadcastSink`] to the configured address.
    pub fn broadcast(settings: &WakeSettings) -> Self {
        Self::new(Box::new(UdpBroadcastSink), settings.target())
    }

    /// Parses `hardware_address` and sends its magic packet. A malformed
    /// address is rejected before anything touches the network.
    pub fn send_wake_packet(&self, hardware_address: &str) -> Result<(), TransmitError> {
        let target: MacAddr = mac::parse_mac(hardware_address)?;
        self.send_to_mac(target)
    }

    pub fn send_to_mac(&self, target: MacAddr) -> Result<(), TransmitError> {
        let payload = magic::create_packet(target);
        debug!(%target, destination = %self.target, "sending magic packet");
        self.sink.send_to(&payload, self.target)
    }
}

#[derive(Debug, Error)]
pub enum WakeError {
    #[error("no device with id {0}")]
    UnknownDevice(DeviceId),
    #[error("{0} is already online")]
    AlreadyOnline(String),
    #[error(transparent)]
    Transmit(#[from] TransmitError),
}

pub struct WakeService {
    registry: Arc<Registry>,
    transmitter: PacketTransmitter,
    events: EventFeed,
}

impl WakeService {
    pub fn new(registry: Arc<Registry>, transmitter: PacketTransmitter, events: EventFeed) -> Self {
        Self {
            registry,
            transmitter,
            events,
        }
    }

    /// Sends a magic packet to `hardware_address` and reports the outcome on
    /// the event feed. Returns whether the packet was handed to the network.
    pub fn wake_host(&self, hardware_address: &str, display_name: &str) -> bool {
        let result = mac::parse_mac(hardware_address)
            .map_err(TransmitError::from)
            .and_then(|target| self.transmitter.send_to_mac(target).map(|()| target));
        self.report(display_name, result).is_ok()
    }

    /// Wakes a registered device, refusing when its last probe found it online.
    pub fn wake_device(&self, id: DeviceId) -> Result<(), WakeError> {
        let row: DeviceSnapshot = self.registry.get(id).ok_or(WakeError::UnknownDevice(id))?;
        if !row.can_wake() {
            return Err(WakeError::AlreadyOnline(row.device.name));
        }

        let target: MacAddr = row.device.hardware_address;
        let result = self.transmitter.send_to_mac(target).map(|()| target);
        self.report(&row.device.name, result)?;
        Ok(())
    }

    fn report(
        &self,
        name: &str,
        result: Result<MacAddr, TransmitError>,
    ) -> Result<MacAddr, TransmitError> {
        match &result {
            Ok(mac) => self.events.publish(Event::WakeSent {
                name: name.to_string(),
                mac: *mac,
            }),
            Err(e) => self.events.publish(Event::WakeFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lanwake_common::device::{Device, DeviceStatus};
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    }

    impl DatagramSink for RecordingSink {
        fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransmitError> {
            self.sent.lock().unwrap().push((payload.to_vec(), target));
            Ok(())
        }
    }

    struct FailingSink;

    impl DatagramSink for FailingSink {
        fn send_to(&self, _payload: &[u8], _target: SocketAddr) -> Result<(), TransmitError> {
            Err(TransmitError::Send(io::Error::from(io::ErrorKind::PermissionDenied)))
        }
    }

    fn transmitter(sink: &Arc<RecordingSink>) -> PacketTransmitter {
        PacketTransmitter::new(Box::new(Arc::clone(sink)), WakeSettings::default().target())
    }

    #[test]
    fn valid_address_sends_one_broadcast_datagram() {
        let sink = Arc::new(RecordingSink::default());
        transmitter(&sink).send_wake_packet("AA:BB:CC:DD:EE:FF").unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (payload, target) = &sent[0];
        assert_eq!(payload.len(), 102);
        assert_eq!(*target, "255.255.255.255:9".parse().unwrap());
        assert_eq!(
            magic::target_of(payload),
            Some(MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff))
        );
    }

    #[test]
    fn malformed_address_never_reaches_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let err = transmitter(&sink).send_wake_packet("not-a-mac").unwrap_err();

        assert!(matches!(err, TransmitError::InvalidAddress(_)));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    fn service(sink: Box<dyn DatagramSink>, status: DeviceStatus) -> (WakeService, EventFeed) {
        let reg = Arc::new(Registry::new(vec![Device::new(
            "Desk",
            "10.0.0.2",
            MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
        )]));
        if status != DeviceStatus::Unknown {
            reg.update_status(DeviceId(0), status, Utc::now()).unwrap();
        }
        let feed = EventFeed::new();
        let tx = PacketTransmitter::new(sink, WakeSettings::default().target());
        (WakeService::new(reg, tx, feed.clone()), feed)
    }

    #[test]
    fn wake_host_reports_success_and_failure() {
        let (ok, feed) = service(Box::new(RecordingSink::default()), DeviceStatus::Offline);
        let mut rx = feed.subscribe();
        assert!(ok.wake_host("aa-bb-cc-dd-ee-ff", "Desk"));
        assert_eq!(
            rx.try_recv().unwrap().to_string(),
            "magic packet transmitted to Desk (aa:bb:cc:dd:ee:ff)"
        );

        let (failing, feed) = service(Box::new(FailingSink), DeviceStatus::Offline);
        let mut rx = feed.subscribe();
        assert!(!failing.wake_host("aa:bb:cc:dd:ee:ff", "Desk"));
        assert!(matches!(rx.try_recv().unwrap(), Event::WakeFailed { .. }));

        assert!(!failing.wake_host("nope", "Desk"));
    }

    #[test]
    fn online_devices_are_not_woken() {
        let (svc, _feed) = service(Box::new(RecordingSink::default()), DeviceStatus::Online);
        assert!(matches!(svc.wake_device(DeviceId(0)), Err(WakeError::AlreadyOnline(_))));
    }

    #[test]
    fn offline_and_errored_devices_are_woken() {
        for status in [DeviceStatus::Offline, DeviceStatus::Error, DeviceStatus::Unknown] {
            let (svc, _feed) = service(Box::new(RecordingSink::default()), status);
            svc.wake_device(DeviceId(0)).unwrap();
        }
    }

    #[test]
    fn unknown_device_id_is_reported() {
        let (svc, _feed) = service(Box::new(RecordingSink::default()), DeviceStatus::Offline);
        assert!(matches!(svc.wake_device(DeviceId(3)), Err(WakeError::UnknownDevice(_))));
    }

    #[test]
    fn udp_sink_hands_datagram_to_the_stack() {
        let tx = PacketTransmitter::new(Box::new(UdpBroadcastSink), "127.0.0.1:9".parse().unwrap());
        tx.send_wake_packet("aa:bb:cc:dd:ee:ff").unwrap();
    }
}
