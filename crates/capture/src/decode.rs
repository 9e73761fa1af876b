//! 프레임 디코딩 — 원시 링크 계층 바이트를 [`Frame`]으로 변환
//!
//! 이더넷 II 헤더가 온전하지 않은 경우에만 `None`을 반환합니다.
//! IP 계층이 없거나 잘려 있으면 MAC과 바이트 수만 채운 프레임을 돌려줍니다.
//! 전송 계층만 잘린 경우에는 IP 주소를 유지합니다.

use std::net::IpAddr;

use etherparse::{Ethernet2HeaderSlice, LaxNetSlice, LaxSlicedPacket, TransportSlice};

use speedy_core::types::{Frame, IpVersion, MacAddr};

/// 원시 바이트를 디코딩합니다.
///
/// - `byte_length`: 이더넷 헤더 뒤의 바이트 수 (u16 최대값으로 포화)
/// - `payload_length`: TCP/UDP 페이로드 크기, 그 외 0
pub fn decode_frame(data: &[u8]) -> Option<Frame> {
    let eth = Ethernet2HeaderSlice::from_slice(data).ok()?;
    let byte_length = saturate_u16(data.len() - eth.slice().len());

    let mut frame = Frame {
        byte_length,
        source_mac: MacAddr::new(eth.source()),
        dest_mac: MacAddr::new(eth.destination()),
        ..Frame::default()
    };

    // 상위 계층이 손상되어도 그 아래 계층 정보는 유지
    let Ok(packet) = LaxSlicedPacket::from_ethernet(data) else {
        return Some(frame);
    };

    match &packet.net {
        Some(LaxNetSlice::Ipv4(ipv4)) => {
            let header = ipv4.header();
            frame.source_ip = Some(IpAddr::V4(header.source_addr()));
            frame.dest_ip = Some(IpAddr::V4(header.destination_addr()));
            frame.ip_version = IpVersion::V4;
        }
        Some(LaxNetSlice::Ipv6(ipv6)) => {
            let header = ipv6.header();
            frame.source_ip = Some(IpAddr::V6(header.source_addr()));
            frame.dest_ip = Some(IpAddr::V6(header.destination_addr()));
            frame.ip_version = IpVersion::V6;
        }
        _ => {}
    }

    frame.payload_length = match &packet.transport {
        Some(TransportSlice::Tcp(tcp)) => saturate_u16(tcp.payload().len()),
        Some(TransportSlice::Udp(udp)) => saturate_u16(udp.payload().len()),
        _ => 0,
    };

    Some(frame)
}

fn saturate_u16(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherparse::PacketBuilder;

    const SRC: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
    const DST: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

    fn udp_v4(payload: &[u8]) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .ipv4([192, 168, 1, 10], [10, 0, 0, 1], 64)
            .udp(5353, 53);
        let mut out = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut out, payload).unwrap();
        out
    }

    #[test]
    fn ipv4_udp_frame_is_fully_decoded() {
        let bytes = udp_v4(&[0u8; 32]);
        let frame = decode_frame(&bytes).unwrap();

        assert_eq!(frame.source_mac, MacAddr::new(SRC));
        assert_eq!(frame.dest_mac, MacAddr::new(DST));
        assert_eq!(frame.ip_version, IpVersion::V4);
        assert_eq!(frame.source_ip, Some("192.168.1.10".parse().unwrap()));
        assert_eq!(frame.dest_ip, Some("10.0.0.1".parse().unwrap()));
        // 20 (IPv4) + 8 (UDP) + 32
        assert_eq!(frame.byte_length, 60);
        assert_eq!(frame.payload_length, 32);
    }

    #[test]
    fn ipv6_tcp_frame_is_decoded() {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .ipv6(
                [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
                [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2],
                64,
            )
            .tcp(40000, 443, 1, 1024);
        let payload = [7u8; 100];
        let mut bytes = Vec::new();
        builder.write(&mut bytes, &payload).unwrap();

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.ip_version, IpVersion::V6);
        assert_eq!(frame.source_ip, Some("fe80::1".parse().unwrap()));
        assert_eq!(frame.dest_ip, Some("fe80::2".parse().unwrap()));
        assert_eq!(frame.payload_length, 100);
        assert_eq!(usize::from(frame.byte_length), bytes.len() - 14);
    }

    #[test]
    fn non_ip_frame_has_no_addresses() {
        // ARP (ethertype 0x0806) 헤더 + 28바이트 본문
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&DST);
        bytes.extend_from_slice(&SRC);
        bytes.extend_from_slice(&[0x08, 0x06]);
        bytes.extend_from_slice(&[0u8; 28]);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.ip_version, IpVersion::None);
        assert_eq!(frame.source_ip, None);
        assert_eq!(frame.byte_length, 28);
        assert_eq!(frame.payload_length, 0);
    }

    #[test]
    fn truncated_ip_layer_keeps_link_layer_fields() {
        let mut bytes = udp_v4(&[0u8; 8]);
        bytes.truncate(14 + 10);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.source_mac, MacAddr::new(SRC));
        assert_eq!(frame.ip_version, IpVersion::None);
        assert_eq!(frame.byte_length, 10);
    }

    #[test]
    fn truncated_transport_layer_keeps_ip_addresses() {
        let mut bytes = udp_v4(&[0u8; 8]);
        // IPv4 헤더는 온전하고 UDP 헤더 중간에서 잘림
        bytes.truncate(14 + 20 + 4);

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.ip_version, IpVersion::V4);
        assert_eq!(frame.source_ip, Some("192.168.1.10".parse().unwrap()));
        assert_eq!(frame.dest_ip, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(frame.byte_length, 24);
        assert_eq!(frame.payload_length, 0);
    }

    #[test]
    fn short_buffer_is_undecodable() {
        assert!(decode_frame(&[]).is_none());
        assert!(decode_frame(&[0u8; 13]).is_none());
    }

    #[test]
    fn header_only_frame_has_zero_length() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&DST);
        bytes.extend_from_slice(&SRC);
        bytes.extend_from_slice(&[0x88, 0xb5]);
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.byte_length, 0);
    }

    #[test]
    fn oversized_length_saturates() {
        assert_eq!(saturate_u16(70_000), u16::MAX);
        assert_eq!(saturate_u16(1500), 1500);
    }
}
