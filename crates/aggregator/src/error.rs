//! 집계기 에러 타입
//!
//! [`AggregatorError`]는 `From<AggregatorError> for SpeedyError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use speedy_core::error::{ConfigError, PipelineError, SpeedyError};

/// 집계기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 빌더에 필수 구성요소가 빠짐
    #[error("missing component: {0}")]
    MissingComponent(&'static str),

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<AggregatorError> for SpeedyError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::Config { field, reason } => ConfigError::InvalidValue {
                field: format!("aggregator.{field}"),
                reason,
            }
            .into(),
            other => SpeedyError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
