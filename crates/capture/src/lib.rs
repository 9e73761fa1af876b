//! # speedy-capture
//!
//! libpcap 라이브 캡처로 링크 계층 프레임을 읽어 [`Frame`](speedy_core::Frame)으로
//! 디코딩하고, bounded 채널로 집계기에 전달합니다.
//!
//! - [`decode`]: etherparse 기반 프레임 디코딩
//! - [`interface`]: 활성 인터페이스 목록, 인터페이스 MAC 조회
//! - [`source`]: 읽기 루프가 사용하는 [`PacketSource`] 추상화
//! - [`engine`]: [`CaptureEngine`] (`Pipeline` 구현)

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod interface;
pub mod source;
pub mod stats;

pub use config::CaptureSettings;
pub use decode::decode_frame;
pub use engine::{CaptureEngine, CaptureEngineBuilder};
pub use error::CaptureEngineError;
pub use interface::{active_interfaces, ensure_active, interface_mac};
pub use source::{PacketSource, PcapSource, ReplaySource, SourceEvent};
pub use stats::{CaptureStats, CaptureStatsSnapshot};
