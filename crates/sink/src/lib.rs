//! # speedy-sink
//!
//! 집계 결과를 외부 저장소로 내보내는 [`Sink`](speedy_core::Sink) 구현체들입니다.
//!
//! - [`influxdb`]: InfluxDB 1.x HTTP line protocol
//! - [`timescaledb`]: TimescaleDB(PostgreSQL) 트랜잭션 배치 삽입과 메타데이터 upsert
//! - [`stdout`]: JSON Lines 표준 출력
//! - [`backend`]: 설정 이름으로 구현을 고르는 [`SinkBackend`]

pub mod backend;
pub mod error;
pub mod influxdb;
pub mod stdout;
pub mod timescaledb;

pub use backend::SinkBackend;
pub use error::SinkBackendError;
pub use influxdb::{InfluxDbSink, encode_line_protocol};
pub use stdout::{JsonLinesSink, StdoutSink};
pub use timescaledb::TimescaleDbSink;
