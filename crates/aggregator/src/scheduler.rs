//! 플러시/제거 스케줄러
//!
//! 고정 주기마다 한 번의 틱을 수행합니다.
//!
//! 1. 저장소 스냅샷 + 카운터 초기화 (원자적)
//! 2. 스냅샷을 독립 태스크에서 [`Sink::store_batch`]로 전달 (결과를 기다리지 않음)
//! 3. 오래된 장치 제거
//!
//! 싱크 저장이 실패하거나 늦어져도 스케줄러는 멈추지 않으며,
//! 해당 주기의 카운트는 재시도 없이 버려집니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use speedy_core::pipeline::Sink;

use crate::stats::{AggregatorStats, record_sink_call};
use crate::store::DeviceStore;

/// 한 번의 틱 결과
#[derive(Debug)]
pub struct TickOutcome {
    /// 싱크로 넘긴 장치 리포트 수
    pub flushed: usize,
    /// 제거된 장치 수
    pub evicted: usize,
    /// 배치 저장 태스크 핸들 (스케줄러는 기다리지 않음)
    pub store_task: JoinHandle<()>,
}

/// 주기적 플러시/제거 스케줄러
pub struct FlushScheduler<S: Sink> {
    store: Arc<DeviceStore>,
    sink: Arc<S>,
    flush_interval: Duration,
    stale_after: Duration,
    stats: Arc<AggregatorStats>,
}

impl<S: Sink> FlushScheduler<S> {
    /// 새 스케줄러를 생성합니다.
    pub fn new(
        store: Arc<DeviceStore>,
        sink: Arc<S>,
        flush_interval: Duration,
        stale_after: Duration,
        stats: Arc<AggregatorStats>,
    ) -> Self {
        Self {
            store,
            sink,
            flush_interval,
            stale_after,
            stats,
        }
    }

    /// 틱 하나를 수행합니다.
    pub async fn tick(&self) -> TickOutcome {
        let now = Instant::now();

        let batch = self.store.snapshot_and_reset().await;
        let flushed = batch.len();
        let store_task = {
            let sink = Arc::clone(&self.sink);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                let started = std::time::Instant::now();
                let result = sink.store_batch(batch).await;
                record_sink_call(sink.name(), "batch", result.is_ok(), started.elapsed());
                stats.record_sink_result(result.is_ok());
                match result {
                    Ok(()) => debug!(devices = flushed, backend = sink.name(), "batch stored"),
                    Err(e) => warn!(
                        devices = flushed,
                        backend = sink.name(),
                        error = %e,
                        "failed to store batch, counts for this interval are lost"
                    ),
                }
            })
        };

        let evicted = self.store.evict(now, self.stale_after).await;
        if evicted > 0 {
            info!(evicted, "evicted stale devices");
        }

        self.stats.record_flush(self.store.len().await, evicted);
        self.stats.publish();

        TickOutcome {
            flushed,
            evicted,
            store_task,
        }
    }

    /// 스케줄러 루프를 시작합니다.
    ///
    /// 첫 틱은 시작 후 한 주기 뒤에 실행됩니다. `cancel`이 취소되면 진행 중인 틱을
    /// 마친 뒤 루프가 종료되며, 이후 추가 플러시는 수행하지 않습니다.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.flush_interval, self.flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_secs = self.flush_interval.as_secs(),
                stale_after_secs = self.stale_after.as_secs(),
                "flush scheduler started"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let outcome = self.tick().await;
                        debug!(flushed = outcome.flushed, evicted = outcome.evicted, "flush tick");
                    }
                }
            }

            info!("flush scheduler stopped");
        })
    }
}
