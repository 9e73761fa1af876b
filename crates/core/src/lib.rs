//! # speedy-core
//!
//! speedy 워크스페이스의 공통 기반 크레이트입니다.
//!
//! - [`types`]: MAC 주소, 프레임, 장치 리포트 등 도메인 타입
//! - [`pipeline`]: 모듈 생명주기([`Pipeline`])와 영속화 싱크([`Sink`]) trait
//! - [`config`]: `speedy.toml` 설정 로딩 및 검증
//! - [`error`]: 도메인별 에러
//! - [`metrics`]: Prometheus 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CaptureError, ConfigError, PipelineError, SinkError, SpeedyError};

// 설정
pub use config::SpeedyConfig;

// 파이프라인 trait
pub use pipeline::{DynPipeline, HealthStatus, Pipeline, Sink};

// 도메인 타입
pub use types::{DeviceMetadata, DeviceReport, Frame, IpVersion, MacAddr};
