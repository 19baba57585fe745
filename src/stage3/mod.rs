use crate::config::{Configuration, Network, MAX_UDP_PAYLOAD};
use crate::error::{Error, Result};
use crate::structs::*;

use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, MutableIpv4Packet};
use pnet_packet::udp::{self, MutableUdpPacket};
use std::time::Duration;

/// IPv4 and UDP headers
pub const FRAMING_OVERHEAD: usize = IPV4_HEADER_LEN + UDP_HEADER_LEN;
const IPV4_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;

/// Stage 3: wraps segments into IPv4/UDP datagrams.
/// The addresses, ports and TTL are fixed by the configuration.
#[derive(Debug, Clone)]
pub struct Framer {
    network: Network,
    identification: u16,
}

impl Framer {
    pub fn new(config: &Configuration) -> Self {
        Framer {
            network: config.network.clone(),
            identification: 1,
        }
    }

    /// Sets up the IPv4 header: generic fields, addresses, TTL and checksum
    fn setup_ip_packet(&self, packet: &mut [u8]) -> Option<()> {
        let len = packet.len();
        let mut ipv4_packet = MutableIpv4Packet::new(packet)?;

        ipv4_packet.set_version(4);
        ipv4_packet.set_header_length((IPV4_HEADER_LEN / 4) as u8);
        ipv4_packet.set_total_length(len as u16);
        ipv4_packet.set_identification(self.identification);
        ipv4_packet.set_ttl(self.network.ttl);
        ipv4_packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        ipv4_packet.set_source(self.network.src_ip);
        ipv4_packet.set_destination(self.network.dst_ip);

        ipv4_packet.set_checksum(ipv4::checksum(&ipv4_packet.to_immutable()));
        Some(())
    }

    /// Sets up the UDP header and payload, then computes the checksum
    fn setup_udp_packet(&self, packet: &mut [u8], payload: &[u8]) -> Option<()> {
        let mut udp_packet = MutableUdpPacket::new(packet)?;

        udp_packet.set_source(self.network.src_port);
        udp_packet.set_destination(self.network.dst_port);
        udp_packet.set_length((payload.len() + UDP_HEADER_LEN) as u16);
        udp_packet.set_payload(payload);

        udp_packet.set_checksum(udp::ipv4_checksum(
            &udp_packet.to_immutable(),
            &self.network.src_ip,
            &self.network.dst_ip,
        ));
        Some(())
    }

    /// Build the datagram carrying a segment, stamped with its emission time
    pub fn frame(&mut self, segment: &Segment, timestamp: Duration) -> Result<Packet> {
        let payload = segment.payload();
        if payload.len() > MAX_UDP_PAYLOAD {
            return Err(Error::OversizedDatagram(payload.len()));
        }
        let mut data = vec![0u8; FRAMING_OVERHEAD + payload.len()];

        self.setup_ip_packet(&mut data[..])
            .expect("Incorrect IP packet");
        self.setup_udp_packet(&mut data[IPV4_HEADER_LEN..], &payload)
            .expect("Incorrect UDP packet");
        self.identification = self.identification.wrapping_add(1);

        Ok(Packet {
            timestamp,
            data,
            payload_len: payload.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet_packet::ipv4::Ipv4Packet;
    use pnet_packet::udp::UdpPacket;
    use pnet_packet::Packet as _;
    use std::net::Ipv4Addr;

    fn segment() -> Segment {
        Segment {
            runs: vec![
                TaggedRun::new(Parameter::RotorStatus, 3),
                TaggedRun::new(Parameter::ImuStatus, 2),
            ],
        }
    }

    #[test]
    fn test_frame_headers() {
        let mut framer = Framer::new(&Configuration::default());
        let ts = Duration::from_millis(1_590_000_000_123);
        let packet = framer.frame(&segment(), ts).unwrap();
        assert_eq!(packet.timestamp, ts);
        assert_eq!(packet.len(), 5 + FRAMING_OVERHEAD);
        assert_eq!(packet.payload_len, 5);

        let ip = Ipv4Packet::new(&packet.data).unwrap();
        assert_eq!(ip.get_version(), 4);
        assert_eq!(ip.get_total_length() as usize, packet.len());
        assert_eq!(ip.get_source(), Ipv4Addr::new(10, 0, 0, 201));
        assert_eq!(ip.get_destination(), Ipv4Addr::new(10, 0, 0, 208));
        assert_eq!(ip.get_next_level_protocol(), IpNextHeaderProtocols::Udp);
        assert_eq!(ip.get_checksum(), ipv4::checksum(&ip));

        let udp = UdpPacket::new(ip.payload()).unwrap();
        assert_eq!(udp.get_source(), 47813);
        assert_eq!(udp.get_destination(), 47814);
        assert_eq!(udp.get_length(), 13);
        assert_eq!(udp.payload(), b"oooii");
        assert_eq!(
            udp.get_checksum(),
            udp::ipv4_checksum(&udp, &ip.get_source(), &ip.get_destination())
        );
    }

    #[test]
    fn test_identification_increases() {
        let mut framer = Framer::new(&Configuration::default());
        let a = framer.frame(&segment(), Duration::ZERO).unwrap();
        let b = framer.frame(&segment(), Duration::ZERO).unwrap();
        let id = |p: &Packet| Ipv4Packet::new(&p.data).unwrap().get_identification();
        assert_eq!(id(&b), id(&a) + 1);
    }

    #[test]
    fn test_oversized_segment() {
        let mut framer = Framer::new(&Configuration::default());
        let segment = Segment {
            runs: vec![TaggedRun::new(Parameter::ThrottleYaw, MAX_UDP_PAYLOAD + 1)],
        };
        assert!(matches!(
            framer.frame(&segment, Duration::ZERO),
            Err(Error::OversizedDatagram(_))
        ));
    }
}
