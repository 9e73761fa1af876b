//! 집계기 설정
//!
//! [`AggregatorSettings`]는 core의 [`AggregatorConfig`]를 기반으로
//! 시간 값을 [`Duration`]으로 변환해 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use speedy_core::config::SpeedyConfig;
//! use speedy_aggregator::config::AggregatorSettings;
//!
//! let core_config = SpeedyConfig::default();
//! let settings = AggregatorSettings::from_core(&core_config.aggregator);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use speedy_core::config::AggregatorConfig;

use crate::error::AggregatorError;

/// 집계기 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorSettings {
    /// 플러시 주기 (초)
    pub flush_interval_secs: u64,
    /// 이 시간 이상 트래픽이 없는 장치는 제거 (초)
    pub stale_after_secs: u64,
    /// 정지 시 프레임 소비 태스크 종료를 기다리는 최대 시간 (초)
    pub shutdown_timeout_secs: u64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from_core(&AggregatorConfig::default())
    }
}

impl AggregatorSettings {
    /// core의 `AggregatorConfig`에서 설정을 생성합니다.
    pub fn from_core(core: &AggregatorConfig) -> Self {
        Self {
            flush_interval_secs: core.flush_interval_secs,
            stale_after_secs: core.stale_after_secs,
            shutdown_timeout_secs: core.shutdown_timeout_secs,
        }
    }

    /// 플러시 주기
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// 장치 제거 임계값
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// 정지 대기 시간
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.flush_interval_secs == 0 {
            return Err(AggregatorError::Config {
                field: "flush_interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.stale_after_secs == 0 {
            return Err(AggregatorError::Config {
                field: "stale_after_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}
