//! 에러 타입 — 도메인별 에러 정의

/// speedy 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SpeedyError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 패킷 캡처 에러
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// 영속화 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 채널 수신 실패
    #[error("channel receive failed: {0}")]
    ChannelRecv(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,
}

/// 패킷 캡처 에러
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 인터페이스를 찾을 수 없거나 비활성 상태
    #[error("interface not found or inactive: {0}")]
    InterfaceNotFound(String),

    /// 캡처 핸들 열기 실패
    #[error("failed to open capture on '{interface}': {reason}")]
    OpenFailed { interface: String, reason: String },

    /// 패킷 읽기 실패
    #[error("capture read failed: {0}")]
    ReadFailed(String),

    /// 인터페이스 MAC 주소 조회 실패
    #[error("mac address unavailable for '{interface}': {reason}")]
    MacUnavailable { interface: String, reason: String },
}

/// 영속화 싱크 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 쓰기 실패
    #[error("write failed: {0}")]
    Write(String),

    /// 지원하지 않는 백엔드
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: SpeedyError = ConfigError::InvalidValue {
            field: "capture.interface".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, SpeedyError::Config(_)));
        assert_eq!(
            err.to_string(),
            "config error: invalid config value for 'capture.interface': must not be empty"
        );
    }

    #[test]
    fn pipeline_state_errors_have_stable_messages() {
        let err: SpeedyError = PipelineError::AlreadyRunning.into();
        assert_eq!(err.to_string(), "pipeline error: pipeline is already running");

        let err: SpeedyError = PipelineError::NotRunning.into();
        assert_eq!(err.to_string(), "pipeline error: pipeline is not running");
    }

    #[test]
    fn io_error_converts_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SpeedyError = io.into();
        assert!(matches!(err, SpeedyError::Io(_)));
    }
}
