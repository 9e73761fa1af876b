//! 캡처 엔진 설정
//!
//! [`CaptureSettings`]는 core의 [`CaptureConfig`]에서 파생됩니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use speedy_core::config::CaptureConfig;

use crate::error::CaptureEngineError;

/// 캡처 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// 캡처할 인터페이스
    pub interface: String,
    /// 프레임당 최대 캡처 바이트
    pub snaplen: i32,
    /// promiscuous 모드
    pub promiscuous: bool,
    /// 읽기 타임아웃 (밀리초). 정지 요청을 확인하는 주기이기도 합니다.
    pub read_timeout_ms: u64,
    /// Frame 채널 용량
    pub channel_capacity: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::from_core(&CaptureConfig::default())
    }
}

impl CaptureSettings {
    /// core의 `CaptureConfig`에서 설정을 생성합니다.
    pub fn from_core(core: &CaptureConfig) -> Self {
        Self {
            interface: core.interface.clone(),
            snaplen: core.snaplen,
            promiscuous: core.promiscuous,
            read_timeout_ms: core.read_timeout_ms,
            channel_capacity: core.channel_capacity,
        }
    }

    /// 읽기 타임아웃
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// libpcap에 넘길 타임아웃 값 (i32 밀리초로 포화)
    pub(crate) fn read_timeout_ms_i32(&self) -> i32 {
        i32::try_from(self.read_timeout_ms).unwrap_or(i32::MAX)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CaptureEngineError> {
        if self.snaplen <= 0 {
            return Err(CaptureEngineError::Config {
                field: "snaplen".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.read_timeout_ms == 0 {
            return Err(CaptureEngineError::Config {
                field: "read_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(CaptureEngineError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}
