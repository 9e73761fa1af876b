//! 통합 테스트 -- 원시 프레임 재생부터 Frame 채널 수신까지

use etherparse::PacketBuilder;
use tokio::sync::mpsc;

use speedy_capture::{CaptureEngine, CaptureSettings, ReplaySource};
use speedy_core::pipeline::Pipeline;
use speedy_core::types::{Frame, IpVersion, MacAddr};

const ROUTER: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
const LAPTOP: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

fn ipv4_udp(src: [u8; 6], dst: [u8; 6], payload: usize) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(src, dst)
        .ipv4([192, 168, 1, 20], [1, 1, 1, 1], 64)
        .udp(40000, 53);
    let mut out = Vec::new();
    builder.write(&mut out, &vec![0u8; payload]).unwrap();
    out
}

fn ipv6_tcp(src: [u8; 6], dst: [u8; 6], payload: usize) -> Vec<u8> {
    let mut src_ip = [0u8; 16];
    src_ip[0] = 0xfe;
    src_ip[1] = 0x80;
    src_ip[15] = 0x20;
    let mut dst_ip = src_ip;
    dst_ip[15] = 0x01;
    let builder = PacketBuilder::ethernet2(src, dst)
        .ipv6(src_ip, dst_ip, 64)
        .tcp(51000, 443, 7, 4096);
    let mut out = Vec::new();
    builder.write(&mut out, &vec![0u8; payload]).unwrap();
    out
}

async fn collect(mut rx: mpsc::Receiver<Frame>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(frame);
    }
    frames
}

/// 재생된 프레임이 순서대로, 디코딩되어 전달됨
#[tokio::test]
async fn frames_are_delivered_in_capture_order() {
    let source = ReplaySource::new([
        ipv4_udp(LAPTOP, ROUTER, 100),
        ipv6_tcp(ROUTER, LAPTOP, 1200),
        vec![0xde, 0xad],
        ipv4_udp(LAPTOP, [0xFF; 6], 10),
    ]);
    let (mut engine, rx) = CaptureEngine::builder()
        .settings(CaptureSettings {
            channel_capacity: 1,
            ..CaptureSettings::default()
        })
        .source(source)
        .build()
        .unwrap();
    engine.start().await.unwrap();

    let frames = collect(rx).await;
    assert_eq!(frames.len(), 3);

    assert_eq!(frames[0].source_mac, MacAddr::new(LAPTOP));
    assert_eq!(frames[0].ip_version, IpVersion::V4);
    assert_eq!(frames[0].payload_length, 100);
    assert_eq!(frames[0].byte_length, 20 + 8 + 100);

    assert_eq!(frames[1].source_mac, MacAddr::new(ROUTER));
    assert_eq!(frames[1].ip_version, IpVersion::V6);
    assert_eq!(frames[1].source_ip, Some("fe80::20".parse().unwrap()));
    assert_eq!(frames[1].payload_length, 1200);

    // 브로드캐스트도 캡처 단계에서는 걸러지지 않음
    assert!(frames[2].dest_mac.is_broadcast());

    let stats = engine.stats();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.undecodable, 1);
    engine.stop().await.unwrap();
}

/// 수신측이 닫히면 읽기 루프도 종료됨
#[tokio::test]
async fn dropping_receiver_ends_capture() {
    let frames: Vec<_> = (0..64).map(|_| ipv4_udp(LAPTOP, ROUTER, 10)).collect();
    let (mut engine, rx) = CaptureEngine::builder()
        .settings(CaptureSettings {
            channel_capacity: 1,
            ..CaptureSettings::default()
        })
        .source(ReplaySource::new(frames))
        .build()
        .unwrap();
    drop(rx);
    engine.start().await.unwrap();
    engine.stop().await.unwrap();
    assert!(engine.stats().frames <= 64);
}
