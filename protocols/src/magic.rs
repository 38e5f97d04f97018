use pnet::util::MacAddr;

pub const SYNC_LEN: usize = 6;
pub const MAC_REPETITIONS: usize = 16;
pub const MAGIC_PACKET_LEN: usize = SYNC_LEN + MAC_REPETITIONS * 6;

/// Builds a Wake-on-LAN magic packet: six `0xFF` sync bytes followed by the
/// target hardware address repeated sixteen times.
pub fn create_packet(target: MacAddr) -> [u8; MAGIC_PACKET_LEN] {
    let mut buffer = [0xFFu8; MAGIC_PACKET_LEN];
    let MacAddr(a, b, c, d, e, f) = target;
    let octets: [u8; 6] = [a, b, c, d, e, f];
    for chunk in buffer[SYNC_LEN..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    buffer
}

/// Returns the address a magic packet targets, or `None` if `payload` is not one.
pub fn target_of(payload: &[u8]) -> Option<MacAddr> {
    if payload.len() != MAGIC_PACKET_LEN || payload[..SYNC_LEN].iter().any(|b| *b != 0xFF) {
        return None;
    }
    let first: &[u8] = &payload[SYNC_LEN..SYNC_LEN + 6];
    if !payload[SYNC_LEN..].chunks_exact(6).all(|chunk| chunk == first) {
        return None;
    }
    Some(MacAddr::new(first[0], first[1], first[2], first[3], first[4], first[5]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_layout() {
        let mac = MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff);
        let pkt = create_packet(mac);

        assert_eq!(pkt.len(), 102);
        assert_eq!(&pkt[..6], &[0xFF; 6]);
        for rep in 0..MAC_REPETITIONS {
            let start = SYNC_LEN + rep * 6;
            assert_eq!(&pkt[start..start + 6], &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        }
    }

    #[test]
    fn broadcast_mac_is_all_ones() {
        let pkt = create_packet(MacAddr::new(0xff, 0xff, 0xff, 0xff, 0xff, 0xff));
        assert!(pkt.iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn target_of_recovers_the_address() {
        let mac = MacAddr::new(0x00, 0x11, 0x22, 0x33, 0x44, 0x55);
        assert_eq!(target_of(&create_packet(mac)), Some(mac));
    }

    #[test]
    fn target_of_rejects_foreign_payloads() {
        let mut pkt = create_packet(MacAddr::new(0, 1, 2, 3, 4, 5));
        pkt[50] ^= 0x01;
        assert_eq!(target_of(&pkt), None);
        assert_eq!(target_of(&pkt[..96]), None);
        assert_eq!(target_of(&[0u8; MAGIC_PACKET_LEN]), None);
    }
}
