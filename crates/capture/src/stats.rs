//! 캡처 통계
//!
//! 캡처 스레드가 갱신하고 데몬의 상태 확인 주기에 메트릭으로 내보냅니다.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use speedy_core::metrics as m;

/// 캡처 스레드와 공유되는 원자 카운터
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames: AtomicU64,
    bytes: AtomicU64,
    undecodable: AtomicU64,
    read_errors: AtomicU64,
}

/// 캡처 통계 복사본
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStatsSnapshot {
    /// 디코딩된 프레임 수
    pub frames: u64,
    /// 디코딩된 이더넷 페이로드 바이트
    pub bytes: u64,
    /// 디코딩 불가 프레임 수
    pub undecodable: u64,
    /// 읽기 에러 수
    pub read_errors: u64,
}

impl CaptureStats {
    /// 제로 초기화된 통계
    pub fn new() -> Self {
        Self::default()
    }

    /// 디코딩된 프레임 하나를 기록합니다.
    pub fn record_frame(&self, byte_length: u16) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(u64::from(byte_length), Ordering::Relaxed);
    }

    /// 디코딩 불가 프레임 하나를 기록합니다.
    pub fn record_undecodable(&self) {
        self.undecodable.fetch_add(1, Ordering::Relaxed);
    }

    /// 읽기 에러 하나를 기록합니다.
    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// 현재 값의 복사본
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            undecodable: self.undecodable.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }

    /// 현재 값을 Prometheus 메트릭으로 내보냅니다.
    pub fn publish(&self) {
        let s = self.snapshot();
        metrics::counter!(m::CAPTURE_FRAMES_TOTAL).absolute(s.frames);
        metrics::counter!(m::CAPTURE_BYTES_TOTAL).absolute(s.bytes);
        metrics::counter!(m::CAPTURE_UNDECODABLE_TOTAL).absolute(s.undecodable);
    }
}
