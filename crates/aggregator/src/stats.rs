//! 집계기 통계
//!
//! [`AggregatorStats`]는 프레임 소비 태스크, 플러시 스케줄러, 메타데이터 디스패처가
//! 공유하는 원자 카운터 묶음입니다. 플러시 주기마다 [`AggregatorStats::publish`]로
//! Prometheus 메트릭에 반영됩니다.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use speedy_core::metrics as m;

use crate::classifier::{Direction, DropReason};

/// 공유 통계 카운터
#[derive(Debug, Default)]
pub struct AggregatorStats {
    frames_attributed: AtomicU64,
    dropped_broadcast: AtomicU64,
    dropped_ipv6_multicast: AtomicU64,
    upload_bytes: AtomicU64,
    download_bytes: AtomicU64,
    devices: AtomicU64,
    devices_evicted: AtomicU64,
    flushes: AtomicU64,
    metadata_changes: AtomicU64,
    consecutive_sink_failures: AtomicU64,
}

/// 통계의 특정 시점 복사본
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// 장치에 귀속된 프레임 수
    pub frames_attributed: u64,
    /// 브로드캐스트 목적지로 버려진 프레임 수
    pub dropped_broadcast: u64,
    /// IPv6 멀티캐스트 목적지로 버려진 프레임 수
    pub dropped_ipv6_multicast: u64,
    /// 누적 업로드 바이트
    pub upload_bytes: u64,
    /// 누적 다운로드 바이트
    pub download_bytes: u64,
    /// 마지막 플러시 시점의 장치 수
    pub devices: u64,
    /// 제거된 장치 수
    pub devices_evicted: u64,
    /// 완료된 플러시 수
    pub flushes: u64,
    /// 감지된 IP 변경 수
    pub metadata_changes: u64,
    /// 연속된 배치 저장 실패 수
    pub consecutive_sink_failures: u64,
}

impl AggregatorStats {
    /// 제로 초기화된 통계
    pub fn new() -> Self {
        Self::default()
    }

    /// 귀속된 프레임 하나를 기록합니다.
    pub fn record_attributed(&self, direction: Direction, bytes: u64) {
        self.frames_attributed.fetch_add(1, Ordering::Relaxed);
        let counter = match direction {
            Direction::Upload => &self.upload_bytes,
            Direction::Download => &self.download_bytes,
        };
        counter.fetch_add(bytes, Ordering::Relaxed);
    }

    /// 버려진 프레임 하나를 기록합니다.
    pub fn record_dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::Broadcast => &self.dropped_broadcast,
            DropReason::Ipv6Multicast => &self.dropped_ipv6_multicast,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// IP 변경 하나를 기록합니다.
    pub fn record_metadata_change(&self) {
        self.metadata_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// 완료된 플러시를 기록합니다.
    pub fn record_flush(&self, devices_after_evict: usize, evicted: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.devices.store(devices_after_evict as u64, Ordering::Relaxed);
        self.devices_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    /// 배치 저장 결과를 기록합니다. 성공하면 연속 실패 수가 초기화됩니다.
    pub fn record_sink_result(&self, success: bool) {
        if success {
            self.consecutive_sink_failures.store(0, Ordering::Relaxed);
        } else {
            self.consecutive_sink_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 연속된 배치 저장 실패 수
    pub fn consecutive_sink_failures(&self) -> u64 {
        self.consecutive_sink_failures.load(Ordering::Relaxed)
    }

    /// 현재 값의 복사본
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_attributed: self.frames_attributed.load(Ordering::Relaxed),
            dropped_broadcast: self.dropped_broadcast.load(Ordering::Relaxed),
            dropped_ipv6_multicast: self.dropped_ipv6_multicast.load(Ordering::Relaxed),
            upload_bytes: self.upload_bytes.load(Ordering::Relaxed),
            download_bytes: self.download_bytes.load(Ordering::Relaxed),
            devices: self.devices.load(Ordering::Relaxed),
            devices_evicted: self.devices_evicted.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            metadata_changes: self.metadata_changes.load(Ordering::Relaxed),
            consecutive_sink_failures: self.consecutive_sink_failures.load(Ordering::Relaxed),
        }
    }

    /// 현재 값을 Prometheus 메트릭으로 내보냅니다.
    pub fn publish(&self) {
        let s = self.snapshot();

        metrics::counter!(m::AGGREGATOR_FRAMES_ATTRIBUTED_TOTAL).absolute(s.frames_attributed);
        for (reason, value) in [
            (DropReason::Broadcast, s.dropped_broadcast),
            (DropReason::Ipv6Multicast, s.dropped_ipv6_multicast),
        ] {
            metrics::counter!(
                m::AGGREGATOR_FRAMES_DROPPED_TOTAL,
                m::LABEL_REASON => reason.as_str()
            )
            .absolute(value);
        }
        for (direction, value) in [
            (Direction::Upload, s.upload_bytes),
            (Direction::Download, s.download_bytes),
        ] {
            metrics::counter!(
                m::AGGREGATOR_BYTES_TOTAL,
                m::LABEL_DIRECTION => direction.as_str()
            )
            .absolute(value);
        }
        metrics::gauge!(m::AGGREGATOR_DEVICES).set(s.devices as f64);
        metrics::counter!(m::AGGREGATOR_DEVICES_EVICTED_TOTAL).absolute(s.devices_evicted);
        metrics::counter!(m::AGGREGATOR_FLUSHES_TOTAL).absolute(s.flushes);
        metrics::counter!(m::AGGREGATOR_METADATA_CHANGES_TOTAL).absolute(s.metadata_changes);
    }
}

/// 싱크 호출 하나의 결과와 소요 시간을 메트릭으로 기록합니다.
pub(crate) fn record_sink_call(
    backend: &str,
    operation: &'static str,
    success: bool,
    elapsed: std::time::Duration,
) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(
        m::SINK_WRITES_TOTAL,
        m::LABEL_BACKEND => backend.to_owned(),
        m::LABEL_OPERATION => operation,
        m::LABEL_RESULT => result
    )
    .increment(1);
    metrics::histogram!(
        m::SINK_WRITE_DURATION_SECONDS,
        m::LABEL_BACKEND => backend.to_owned(),
        m::LABEL_OPERATION => operation
    )
    .record(elapsed.as_secs_f64());
}
