//! 캡처 엔진 에러 타입
//!
//! [`CaptureEngineError`]는 `From<CaptureEngineError> for SpeedyError` 변환을 제공합니다.

use speedy_core::error::{CaptureError, ConfigError, SpeedyError};

/// 캡처 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CaptureEngineError {
    /// 캡처 핸들 열기 실패 (권한 부족, 존재하지 않는 장치 등)
    #[error("failed to open '{interface}': {reason}")]
    Open {
        /// 인터페이스 이름
        interface: String,
        /// 실패 사유
        reason: String,
    },

    /// 패킷 읽기 실패
    #[error("read failed: {0}")]
    Read(String),

    /// 인터페이스 목록 조회 실패 또는 비활성 인터페이스
    #[error("interface error: {0}")]
    Interface(String),

    /// 인터페이스 MAC 조회 실패
    #[error("cannot resolve mac of '{interface}': {reason}")]
    Mac {
        /// 인터페이스 이름
        interface: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<CaptureEngineError> for SpeedyError {
    fn from(err: CaptureEngineError) -> Self {
        match err {
            CaptureEngineError::Open { interface, reason } => {
                CaptureError::OpenFailed { interface, reason }.into()
            }
            CaptureEngineError::Read(reason) => CaptureError::ReadFailed(reason).into(),
            CaptureEngineError::Interface(reason) => CaptureError::InterfaceNotFound(reason).into(),
            CaptureEngineError::Mac { interface, reason } => {
                CaptureError::MacUnavailable { interface, reason }.into()
            }
            CaptureEngineError::Config { field, reason } => ConfigError::InvalidValue {
                field: format!("capture.{field}"),
                reason,
            }
            .into(),
        }
    }
}
