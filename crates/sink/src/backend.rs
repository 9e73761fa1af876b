//! 설정의 `sink.backend` 값으로 싱크 구현을 선택합니다.

use tracing::info;

use speedy_core::config::SinkConfig;
use speedy_core::error::SpeedyError;
use speedy_core::pipeline::Sink;
use speedy_core::types::{DeviceMetadata, DeviceReport};

use crate::error::SinkBackendError;
use crate::influxdb::InfluxDbSink;
use crate::stdout::StdoutSink;
use crate::timescaledb::TimescaleDbSink;

/// 런타임에 선택되는 싱크
///
/// `Sink` 트레이트는 RPITIT를 쓰므로 트레이트 객체 대신 열거형으로 분기합니다.
pub enum SinkBackend {
    /// InfluxDB 1.x HTTP
    InfluxDb(InfluxDbSink),
    /// TimescaleDB (PostgreSQL)
    TimescaleDb(TimescaleDbSink),
    /// 표준 출력 JSON Lines
    Stdout(StdoutSink),
}

impl SinkBackend {
    /// 설정으로부터 싱크를 생성합니다.
    pub fn from_config(config: &SinkConfig) -> Result<Self, SinkBackendError> {
        let backend = match config.backend.as_str() {
            "influxdb" => Self::InfluxDb(InfluxDbSink::new(config)?),
            "timescaledb" => Self::TimescaleDb(TimescaleDbSink::new(config)?),
            "stdout" => Self::Stdout(StdoutSink::stdout()),
            other => return Err(SinkBackendError::UnsupportedBackend(other.to_owned())),
        };
        info!(backend = backend.name(), "sink backend selected");
        Ok(backend)
    }
}

impl Sink for SinkBackend {
    fn name(&self) -> &str {
        match self {
            Self::InfluxDb(sink) => sink.name(),
            Self::TimescaleDb(sink) => sink.name(),
            Self::Stdout(sink) => sink.name(),
        }
    }

    async fn store_batch(&self, reports: Vec<DeviceReport>) -> Result<(), SpeedyError> {
        match self {
            Self::InfluxDb(sink) => sink.store_batch(reports).await,
            Self::TimescaleDb(sink) => sink.store_batch(reports).await,
            Self::Stdout(sink) => sink.store_batch(reports).await,
        }
    }

    async fn store_metadata(&self, metadata: DeviceMetadata) -> Result<(), SpeedyError> {
        match self {
            Self::InfluxDb(sink) => sink.store_metadata(metadata).await,
            Self::TimescaleDb(sink) => sink.store_metadata(metadata).await,
            Self::Stdout(sink) => sink.store_metadata(metadata).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_influxdb_by_default() {
        let backend = SinkBackend::from_config(&SinkConfig::default()).unwrap();
        assert_eq!(backend.name(), "influxdb");
    }

    #[test]
    fn selects_stdout() {
        let config = SinkConfig {
            backend: "stdout".to_owned(),
            ..SinkConfig::default()
        };
        let backend = SinkBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), "stdout");
    }

    #[test]
    fn selects_timescaledb() {
        let config = SinkConfig {
            backend: "timescaledb".to_owned(),
            url: "postgres://speedy@localhost/home".to_owned(),
            database: "measures".to_owned(),
            ..SinkConfig::default()
        };
        let backend = SinkBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), "timescaledb");
    }

    #[test]
    fn timescaledb_rejects_influx_url() {
        let config = SinkConfig {
            backend: "timescaledb".to_owned(),
            ..SinkConfig::default()
        };
        assert!(matches!(
            SinkBackend::from_config(&config),
            Err(SinkBackendError::Config { field, .. }) if field == "url"
        ));
    }

    #[test]
    fn rejects_unknown_backend() {
        let config = SinkConfig {
            backend: "mongodb".to_owned(),
            ..SinkConfig::default()
        };
        assert!(matches!(
            SinkBackend::from_config(&config),
            Err(SinkBackendError::UnsupportedBackend(name)) if name == "mongodb"
        ));
    }
}
