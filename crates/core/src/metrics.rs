//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `speedy_`
//! - 모듈명: `capture_`, `aggregator_`, `sink_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(speedy_core::metrics::AGGREGATOR_FLUSHES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 트래픽 방향 레이블 키 (upload, download)
pub const LABEL_DIRECTION: &str = "direction";

/// 드롭 사유 레이블 키 (broadcast, ipv6_multicast)
pub const LABEL_REASON: &str = "reason";

/// 싱크 연산 레이블 키 (batch, metadata)
pub const LABEL_OPERATION: &str = "operation";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 싱크 백엔드 레이블 키 (influxdb, timescaledb, stdout)
pub const LABEL_BACKEND: &str = "backend";

// ─── Capture 메트릭 ────────────────────────────────────────────────

/// Capture: 디코딩된 전체 프레임 수 (counter)
pub const CAPTURE_FRAMES_TOTAL: &str = "speedy_capture_frames_total";

/// Capture: 디코딩된 이더넷 페이로드 바이트 수 (counter)
pub const CAPTURE_BYTES_TOTAL: &str = "speedy_capture_bytes_total";

/// Capture: 이더넷 헤더조차 없어 버려진 프레임 수 (counter)
pub const CAPTURE_UNDECODABLE_TOTAL: &str = "speedy_capture_undecodable_total";

// ─── Aggregator 메트릭 ─────────────────────────────────────────────

/// Aggregator: 장치에 귀속된 프레임 수 (counter)
pub const AGGREGATOR_FRAMES_ATTRIBUTED_TOTAL: &str = "speedy_aggregator_frames_attributed_total";

/// Aggregator: 분류기에서 버려진 프레임 수 (counter, label: reason)
pub const AGGREGATOR_FRAMES_DROPPED_TOTAL: &str = "speedy_aggregator_frames_dropped_total";

/// Aggregator: 방향별 귀속 바이트 수 (counter, label: direction)
pub const AGGREGATOR_BYTES_TOTAL: &str = "speedy_aggregator_bytes_total";

/// Aggregator: 현재 추적 중인 장치 수 (gauge)
pub const AGGREGATOR_DEVICES: &str = "speedy_aggregator_devices";

/// Aggregator: 오래되어 제거된 장치 수 (counter)
pub const AGGREGATOR_DEVICES_EVICTED_TOTAL: &str = "speedy_aggregator_devices_evicted_total";

/// Aggregator: 수행된 플러시 수 (counter)
pub const AGGREGATOR_FLUSHES_TOTAL: &str = "speedy_aggregator_flushes_total";

/// Aggregator: 감지된 IP 주소 변경 수 (counter)
pub const AGGREGATOR_METADATA_CHANGES_TOTAL: &str = "speedy_aggregator_metadata_changes_total";

// ─── Sink 메트릭 ────────────────────────────────────────────────────

/// Sink: 싱크 호출 수 (counter, labels: operation, result)
pub const SINK_WRITES_TOTAL: &str = "speedy_sink_writes_total";

/// Sink: 싱크 호출 소요 시간 (histogram, 초, label: operation)
pub const SINK_WRITE_DURATION_SECONDS: &str = "speedy_sink_write_duration_seconds";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "speedy_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, labels: version, backend)
pub const DAEMON_BUILD_INFO: &str = "speedy_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `speedy-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Capture
    describe_counter!(
        CAPTURE_FRAMES_TOTAL,
        "Total number of frames decoded from the capture handle"
    );
    describe_counter!(CAPTURE_BYTES_TOTAL, "Total ethernet payload bytes decoded");
    describe_counter!(
        CAPTURE_UNDECODABLE_TOTAL,
        "Frames discarded because no ethernet header could be decoded"
    );

    // Aggregator
    describe_counter!(
        AGGREGATOR_FRAMES_ATTRIBUTED_TOTAL,
        "Frames attributed to a device record"
    );
    describe_counter!(
        AGGREGATOR_FRAMES_DROPPED_TOTAL,
        "Frames dropped by the classifier (broadcast, ipv6_multicast)"
    );
    describe_counter!(
        AGGREGATOR_BYTES_TOTAL,
        "Attributed bytes per direction (upload, download)"
    );
    describe_gauge!(AGGREGATOR_DEVICES, "Device records currently tracked");
    describe_counter!(
        AGGREGATOR_DEVICES_EVICTED_TOTAL,
        "Device records removed after exceeding the staleness threshold"
    );
    describe_counter!(AGGREGATOR_FLUSHES_TOTAL, "Completed flush ticks");
    describe_counter!(
        AGGREGATOR_METADATA_CHANGES_TOTAL,
        "Observed device IP address transitions"
    );

    // Sink
    describe_counter!(
        SINK_WRITES_TOTAL,
        "Sink operations by operation (batch, metadata) and result (success, failure)"
    );
    describe_histogram!(
        SINK_WRITE_DURATION_SECONDS,
        "Sink operation latency in seconds"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
    describe_gauge!(DAEMON_BUILD_INFO, "Build information (always 1)");
}
