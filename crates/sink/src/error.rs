//! 싱크 백엔드 에러 타입
//!
//! [`SinkBackendError`]는 `From<SinkBackendError> for SpeedyError` 변환을 제공합니다.

use speedy_core::error::{ConfigError, SinkError, SpeedyError};

/// 싱크 백엔드 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkBackendError {
    /// HTTP 요청 실패 (연결 거부, 타임아웃 등)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 2xx가 아닌 응답
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 (앞부분만)
        body: String,
    },

    /// PostgreSQL 연결 실패
    #[error("postgres connect failed: {0}")]
    PostgresConnect(tokio_postgres::Error),

    /// PostgreSQL 쿼리 실패
    #[error("postgres query failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// 레코드 직렬화 실패
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// 출력 스트림 쓰기 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 지원하지 않는 백엔드 이름
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<SinkBackendError> for SpeedyError {
    fn from(err: SinkBackendError) -> Self {
        match err {
            SinkBackendError::Http(e) if e.is_connect() || e.is_timeout() => {
                SinkError::Connection(e.to_string()).into()
            }
            SinkBackendError::PostgresConnect(e) => SinkError::Connection(e.to_string()).into(),
            SinkBackendError::Postgres(e) if e.is_closed() => {
                SinkError::Connection(e.to_string()).into()
            }
            SinkBackendError::UnsupportedBackend(name) => {
                SinkError::UnsupportedBackend(name).into()
            }
            SinkBackendError::Config { field, reason } => ConfigError::InvalidValue {
                field: format!("sink.{field}"),
                reason,
            }
            .into(),
            other => SinkError::Write(other.to_string()).into(),
        }
    }
}
