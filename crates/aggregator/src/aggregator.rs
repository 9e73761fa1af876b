//! 집계기 오케스트레이션 -- 프레임 소비, 플러시 스케줄러, 메타데이터 디스패처를 관리합니다.
//!
//! [`Aggregator`]는 core의 [`Pipeline`] trait을 구현하여
//! `speedy-daemon`에서 캡처 엔진과 동일한 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! capture ──mpsc<Frame>──▶ consumer ──classify──▶ DeviceStore ◀──tick── FlushScheduler ──spawn──▶ Sink::store_batch
//!                                                     │
//!                                                     └─notify──▶ dispatcher ──spawn──▶ Sink::store_metadata
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use speedy_core::config::AggregatorConfig;
use speedy_core::error::{PipelineError, SpeedyError};
use speedy_core::pipeline::{HealthStatus, Pipeline, Sink};
use speedy_core::types::{DeviceMetadata, Frame, MacAddr};

use crate::classifier::{Verdict, classify};
use crate::config::AggregatorSettings;
use crate::error::AggregatorError;
use crate::notifier::{MetadataNotifier, spawn_dispatcher};
use crate::scheduler::FlushScheduler;
use crate::stats::{AggregatorStats, StatsSnapshot};
use crate::store::DeviceStore;

/// 이 횟수 이상 연속으로 배치 저장이 실패하면 Degraded로 보고합니다.
const SINK_FAILURE_DEGRADED_THRESHOLD: u64 = 3;

/// 집계기 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum AggregatorState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 장치별 트래픽 집계기
///
/// # 사용 예시
/// ```ignore
/// use speedy_aggregator::AggregatorBuilder;
///
/// let mut aggregator = AggregatorBuilder::new()
///     .config(&config.aggregator)
///     .sink(sink)
///     .interface_mac(mac)
///     .frame_receiver(frame_rx)  // from capture
///     .build()?;
///
/// aggregator.start().await?;
/// ```
pub struct Aggregator<S: Sink> {
    settings: AggregatorSettings,
    interface_mac: MacAddr,
    state: AggregatorState,
    sink: Arc<S>,
    store: Arc<DeviceStore>,
    stats: Arc<AggregatorStats>,
    frame_rx: Option<mpsc::Receiver<Frame>>,
    metadata_rx: Option<mpsc::UnboundedReceiver<DeviceMetadata>>,
    stream_closed: Arc<AtomicBool>,
    cancel: CancellationToken,
    consumer: Option<JoinHandle<()>>,
    scheduler: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl<S: Sink> Aggregator<S> {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            AggregatorState::Initialized => "initialized",
            AggregatorState::Running => "running",
            AggregatorState::Stopped => "stopped",
        }
    }

    /// 집계 저장소
    pub fn store(&self) -> Arc<DeviceStore> {
        Arc::clone(&self.store)
    }

    /// 통계 복사본
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// 감시 인터페이스의 MAC
    pub fn interface_mac(&self) -> MacAddr {
        self.interface_mac
    }

    fn spawn_consumer(&self, mut rx: mpsc::Receiver<Frame>) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let closed = Arc::clone(&self.stream_closed);
        let own_mac = self.interface_mac;

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                match classify(frame, own_mac) {
                    Verdict::Attribute(attribution) => {
                        stats.record_attributed(
                            attribution.direction,
                            u64::from(attribution.bytes),
                        );
                        if store.attribute(&attribution, Instant::now()).await.is_some() {
                            stats.record_metadata_change();
                        }
                    }
                    Verdict::Drop(reason) => {
                        trace!(reason = reason.as_str(), "frame dropped");
                        stats.record_dropped(reason);
                    }
                }
            }
            closed.store(true, Ordering::Release);
            info!("frame stream closed");
        })
    }
}

impl<S: Sink> Pipeline for Aggregator<S> {
    async fn start(&mut self) -> Result<(), SpeedyError> {
        if self.state == AggregatorState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let frame_rx = self.frame_rx.take().ok_or_else(|| {
            PipelineError::InitFailed("frame receiver already consumed".to_owned())
        })?;
        let metadata_rx = self.metadata_rx.take().ok_or_else(|| {
            PipelineError::InitFailed("metadata receiver already consumed".to_owned())
        })?;

        info!(
            interface_mac = %self.interface_mac,
            backend = self.sink.name(),
            "starting aggregator"
        );

        self.cancel = CancellationToken::new();
        self.consumer = Some(self.spawn_consumer(frame_rx));
        self.dispatcher = Some(spawn_dispatcher(
            metadata_rx,
            Arc::clone(&self.sink),
            self.cancel.clone(),
        ));
        let scheduler = FlushScheduler::new(
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
            self.settings.flush_interval(),
            self.settings.stale_after(),
            Arc::clone(&self.stats),
        );
        self.scheduler = Some(scheduler.spawn(self.cancel.clone()));

        self.state = AggregatorState::Running;
        info!("aggregator started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SpeedyError> {
        if self.state != AggregatorState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping aggregator");

        // 1. 업스트림이 닫히며 남은 프레임을 소비할 때까지 대기
        if let Some(mut consumer) = self.consumer.take() {
            let timeout = self.settings.shutdown_timeout();
            match tokio::time::timeout(timeout, &mut consumer).await {
                Ok(_) => debug!("frame consumer drained"),
                Err(_) => {
                    warn!(
                        timeout_secs = timeout.as_secs(),
                        "frame stream still open, aborting consumer"
                    );
                    consumer.abort();
                }
            }
        }

        // 2. 스케줄러 정지 (진행 중인 틱은 완료됨)
        self.cancel.cancel();
        if let Some(scheduler) = self.scheduler.take() {
            if let Err(e) = scheduler.await {
                warn!(error = %e, "flush scheduler task failed");
            }
        }

        // 3. 디스패처 정지 (큐에 남은 메타데이터 알림까지 저장)
        if let Some(mut dispatcher) = self.dispatcher.take() {
            let timeout = self.settings.shutdown_timeout();
            match tokio::time::timeout(timeout, &mut dispatcher).await {
                Ok(_) => debug!("metadata dispatcher drained"),
                Err(_) => {
                    warn!(
                        timeout_secs = timeout.as_secs(),
                        "metadata sink still busy, aborting dispatcher"
                    );
                    dispatcher.abort();
                }
            }
        }

        self.stats.publish();
        self.state = AggregatorState::Stopped;
        info!("aggregator stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            AggregatorState::Running => {
                let failures = self.stats.consecutive_sink_failures();
                if self.stream_closed.load(Ordering::Acquire) {
                    HealthStatus::Degraded("frame stream closed".to_owned())
                } else if failures >= SINK_FAILURE_DEGRADED_THRESHOLD {
                    HealthStatus::Degraded(format!(
                        "sink '{}' failed {failures} consecutive batches",
                        self.sink.name()
                    ))
                } else {
                    HealthStatus::Healthy
                }
            }
            AggregatorState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            AggregatorState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 집계기 빌더
pub struct AggregatorBuilder<S: Sink> {
    settings: AggregatorSettings,
    sink: Option<Arc<S>>,
    interface_mac: Option<MacAddr>,
    frame_rx: Option<mpsc::Receiver<Frame>>,
}

impl<S: Sink> AggregatorBuilder<S> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            settings: AggregatorSettings::default(),
            sink: None,
            interface_mac: None,
            frame_rx: None,
        }
    }

    /// core 설정으로부터 집계기 설정을 지정합니다.
    pub fn config(mut self, config: &AggregatorConfig) -> Self {
        self.settings = AggregatorSettings::from_core(config);
        self
    }

    /// 집계기 설정을 직접 지정합니다.
    pub fn settings(mut self, settings: AggregatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 영속화 싱크를 설정합니다.
    pub fn sink(mut self, sink: Arc<S>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 감시 인터페이스의 MAC을 설정합니다.
    pub fn interface_mac(mut self, mac: MacAddr) -> Self {
        self.interface_mac = Some(mac);
        self
    }

    /// 캡처 엔진의 Frame 수신 채널을 설정합니다.
    pub fn frame_receiver(mut self, rx: mpsc::Receiver<Frame>) -> Self {
        self.frame_rx = Some(rx);
        self
    }

    /// 집계기를 빌드합니다.
    pub fn build(self) -> Result<Aggregator<S>, AggregatorError> {
        self.settings.validate()?;

        let sink = self.sink.ok_or(AggregatorError::MissingComponent("sink"))?;
        let interface_mac = self
            .interface_mac
            .ok_or(AggregatorError::MissingComponent("interface_mac"))?;
        let frame_rx = self
            .frame_rx
            .ok_or(AggregatorError::MissingComponent("frame_receiver"))?;

        let (notifier, metadata_rx) = MetadataNotifier::channel();

        Ok(Aggregator {
            settings: self.settings,
            interface_mac,
            state: AggregatorState::Initialized,
            sink,
            store: Arc::new(DeviceStore::with_notifier(notifier)),
            stats: Arc::new(AggregatorStats::new()),
            frame_rx: Some(frame_rx),
            metadata_rx: Some(metadata_rx),
            stream_closed: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            consumer: None,
            scheduler: None,
            dispatcher: None,
        })
    }
}

impl<S: Sink> Default for AggregatorBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
