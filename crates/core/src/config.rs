//! 설정 관리 — speedy.toml 파싱 및 런타임 설정
//!
//! [`SpeedyConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SPEEDY_CAPTURE_INTERFACE=eth0` 형식)
//! 3. 설정 파일 (`speedy.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), speedy_core::error::SpeedyError> {
//! use speedy_core::config::SpeedyConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SpeedyConfig::load("speedy.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SpeedyConfig::parse("[capture]\ninterface = \"eth0\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SpeedyError};

/// 지원하는 싱크 백엔드 이름
pub const SINK_BACKENDS: [&str; 3] = ["influxdb", "timescaledb", "stdout"];

/// SQL 테이블 이름으로 쓸 수 있는지 검사합니다.
///
/// `name` 또는 `schema.name` 형식이며, 각 부분은 ASCII 영문자나 `_`로 시작하고
/// 영숫자와 `_`만 포함해야 합니다.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// speedy 통합 설정
///
/// `speedy.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedyConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 패킷 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 집계기 설정
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// 영속화 싱크 설정
    #[serde(default)]
    pub sink: SinkConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SpeedyConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SpeedyError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 없이 기본값에 환경변수 오버라이드만 적용합니다.
    pub fn from_env() -> Result<Self, SpeedyError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SpeedyError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeedyError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SpeedyError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SpeedyError> {
        toml::from_str(toml_str).map_err(|e| {
            SpeedyError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SPEEDY_{SECTION}_{FIELD}`
    /// 예: `SPEEDY_CAPTURE_INTERFACE=eth0`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SPEEDY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SPEEDY_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "SPEEDY_GENERAL_PID_FILE");

        // Capture
        override_string(&mut self.capture.interface, "SPEEDY_CAPTURE_INTERFACE");
        override_i32(&mut self.capture.snaplen, "SPEEDY_CAPTURE_SNAPLEN");
        override_bool(&mut self.capture.promiscuous, "SPEEDY_CAPTURE_PROMISCUOUS");
        override_u64(
            &mut self.capture.read_timeout_ms,
            "SPEEDY_CAPTURE_READ_TIMEOUT_MS",
        );
        override_usize(
            &mut self.capture.channel_capacity,
            "SPEEDY_CAPTURE_CHANNEL_CAPACITY",
        );

        // Aggregator
        override_u64(
            &mut self.aggregator.flush_interval_secs,
            "SPEEDY_AGGREGATOR_FLUSH_INTERVAL_SECS",
        );
        override_u64(
            &mut self.aggregator.stale_after_secs,
            "SPEEDY_AGGREGATOR_STALE_AFTER_SECS",
        );
        override_u64(
            &mut self.aggregator.shutdown_timeout_secs,
            "SPEEDY_AGGREGATOR_SHUTDOWN_TIMEOUT_SECS",
        );

        // Sink
        override_string(&mut self.sink.backend, "SPEEDY_SINK_BACKEND");
        override_string(&mut self.sink.url, "SPEEDY_SINK_URL");
        override_string(&mut self.sink.database, "SPEEDY_SINK_DATABASE");
        override_string(&mut self.sink.username, "SPEEDY_SINK_USERNAME");
        override_string(&mut self.sink.password, "SPEEDY_SINK_PASSWORD");
        override_u64(&mut self.sink.timeout_secs, "SPEEDY_SINK_TIMEOUT_SECS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "SPEEDY_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "SPEEDY_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "SPEEDY_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// `capture.interface`는 여기서 검사하지 않습니다. 인터페이스가 비어 있으면
    /// 데몬이 사용 가능한 인터페이스 목록을 안내하고 종료합니다.
    pub fn validate(&self) -> Result<(), SpeedyError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.capture.snaplen <= 0 {
            return Err(invalid("capture.snaplen", "must be greater than 0".to_owned()));
        }
        if self.capture.read_timeout_ms == 0 {
            return Err(invalid(
                "capture.read_timeout_ms",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.capture.channel_capacity == 0 {
            return Err(invalid(
                "capture.channel_capacity",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.aggregator.flush_interval_secs == 0 {
            return Err(invalid(
                "aggregator.flush_interval_secs",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.aggregator.stale_after_secs == 0 {
            return Err(invalid(
                "aggregator.stale_after_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if !SINK_BACKENDS.contains(&self.sink.backend.as_str()) {
            return Err(invalid(
                "sink.backend",
                format!("must be one of: {}", SINK_BACKENDS.join(", ")),
            ));
        }
        if self.sink.backend == "influxdb" {
            if !(self.sink.url.starts_with("http://") || self.sink.url.starts_with("https://")) {
                return Err(invalid(
                    "sink.url",
                    "must start with http:// or https://".to_owned(),
                ));
            }
            if self.sink.database.is_empty() {
                return Err(invalid("sink.database", "must not be empty".to_owned()));
            }
        }
        if self.sink.backend == "timescaledb" {
            if !(self.sink.url.starts_with("postgres://")
                || self.sink.url.starts_with("postgresql://"))
            {
                return Err(invalid(
                    "sink.url",
                    "must start with postgres:// or postgresql://".to_owned(),
                ));
            }
            if !is_valid_table_name(&self.sink.database) {
                return Err(invalid(
                    "sink.database",
                    "must be a table name ([schema.]name)".to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> SpeedyError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 패킷 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 감시할 네트워크 인터페이스
    pub interface: String,
    /// 패킷당 최대 캡처 길이 (바이트)
    pub snaplen: i32,
    /// 무차별 모드 사용 여부
    pub promiscuous: bool,
    /// 캡처 읽기 타임아웃 (밀리초). 정지 요청 확인 주기이기도 합니다.
    pub read_timeout_ms: u64,
    /// 캡처 → 집계기 프레임 채널 용량
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            snaplen: 65535,
            promiscuous: true,
            read_timeout_ms: 100,
            channel_capacity: 4096,
        }
    }
}

/// 집계기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// 플러시 주기 (초)
    pub flush_interval_secs: u64,
    /// 이 시간 동안 트래픽이 없는 장치는 제거 (초)
    pub stale_after_secs: u64,
    /// 정지 시 프레임 스트림 종료를 기다리는 최대 시간 (초)
    pub shutdown_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 1,
            stale_after_secs: 3600,
            shutdown_timeout_secs: 5,
        }
    }
}

/// 영속화 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 백엔드 (influxdb, timescaledb, stdout)
    pub backend: String,
    /// 데이터베이스 URL (timescaledb는 `postgres://` 연결 문자열)
    pub url: String,
    /// 데이터베이스 이름 (timescaledb는 측정값 테이블 이름)
    pub database: String,
    /// 사용자명 (빈 문자열이면 인증 없음)
    pub username: String,
    /// 비밀번호
    pub password: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            backend: "influxdb".to_owned(),
            url: "http://localhost:8086".to_owned(),
            database: "speedy".to_owned(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_i32(target: &mut i32, env_key: &str) {
    override_parsed(target, env_key, "i32");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}
