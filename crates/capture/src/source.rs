//! 패킷 소스 — 캡처 루프가 읽어들이는 원시 프레임 공급자
//!
//! [`PacketSource`]는 블로킹 읽기 한 번의 결과를 [`SourceEvent`]로 돌려줍니다.
//! 운영 환경에서는 libpcap 핸들을 감싼 [`PcapSource`]를, 테스트에서는 미리 준비한
//! 바이트열을 재생하는 [`ReplaySource`]를 사용합니다.

use std::collections::VecDeque;

use tracing::info;

use speedy_core::types::Frame;

use crate::config::CaptureSettings;
use crate::decode::decode_frame;
use crate::error::CaptureEngineError;

/// 한 번의 읽기 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// 디코딩된 프레임
    Frame(Frame),
    /// 이더넷 헤더조차 없는 프레임
    Undecodable,
    /// 읽기 타임아웃 (에러 아님)
    Timeout,
    /// 더 이상 읽을 프레임이 없음
    Exhausted,
}

/// 원시 프레임 공급자
///
/// 구현체는 블로킹 스레드에서 호출되므로 `Send + 'static`이어야 합니다.
pub trait PacketSource: Send + 'static {
    /// 다음 프레임을 읽습니다. 타임아웃까지 블로킹할 수 있습니다.
    fn next_event(&mut self) -> Result<SourceEvent, CaptureEngineError>;
}

fn classify_bytes(data: &[u8]) -> SourceEvent {
    match decode_frame(data) {
        Some(frame) => SourceEvent::Frame(frame),
        None => SourceEvent::Undecodable,
    }
}

/// libpcap 라이브 캡처 소스
pub struct PcapSource {
    capture: pcap::Capture<pcap::Active>,
}

impl PcapSource {
    /// 설정에 따라 라이브 캡처 핸들을 엽니다.
    ///
    /// 캡처 권한(root 또는 `CAP_NET_RAW`)이 필요합니다.
    pub fn open(settings: &CaptureSettings) -> Result<Self, CaptureEngineError> {
        let open_err = |e: pcap::Error| CaptureEngineError::Open {
            interface: settings.interface.clone(),
            reason: e.to_string(),
        };

        let capture = pcap::Capture::from_device(settings.interface.as_str())
            .map_err(open_err)?
            .promisc(settings.promiscuous)
            .snaplen(settings.snaplen)
            .timeout(settings.read_timeout_ms_i32())
            .immediate_mode(true)
            .open()
            .map_err(open_err)?;

        info!(
            interface = %settings.interface,
            snaplen = settings.snaplen,
            promiscuous = settings.promiscuous,
            "capture handle opened"
        );
        Ok(Self { capture })
    }
}

impl PacketSource for PcapSource {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureEngineError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(classify_bytes(packet.data)),
            Err(pcap::Error::TimeoutExpired) => Ok(SourceEvent::Timeout),
            Err(pcap::Error::NoMorePackets) => Ok(SourceEvent::Exhausted),
            Err(e) => Err(CaptureEngineError::Read(e.to_string())),
        }
    }
}

/// 미리 준비한 원시 프레임을 순서대로 재생하는 소스
///
/// 모두 재생한 뒤에는 [`SourceEvent::Exhausted`]를 반환합니다.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<Vec<u8>>,
}

impl ReplaySource {
    /// 원시 프레임 목록으로 소스를 만듭니다.
    pub fn new(frames: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// 남은 프레임 수
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PacketSource for ReplaySource {
    fn next_event(&mut self) -> Result<SourceEvent, CaptureEngineError> {
        Ok(match self.frames.pop_front() {
            Some(data) => classify_bytes(&data),
            None => SourceEvent::Exhausted,
        })
    }
}
