//! 캡처 엔진 — 라이브 캡처 핸들 관리 및 프레임 전달
//!
//! [`CaptureEngine`]은 빌더 패턴([`CaptureEngineBuilder`])으로 생성하며,
//! [`Pipeline`] trait을 구현합니다.
//!
//! # 아키텍처
//! ```text
//! ┌──────────────┐  blocking  ┌──────────────┐  mpsc<Frame>  ┌──────────────┐
//! │ PacketSource │──────────▶│ capture loop │──────────────▶│  aggregator  │
//! │ (libpcap)    │  read      │ (decode)     │               │              │
//! └──────────────┘            └──────┬───────┘               └──────────────┘
//!                                    ▼
//!                              CaptureStats
//! ```
//!
//! 읽기 루프는 블로킹 스레드(`spawn_blocking`)에서 실행되며 Frame 송신측을 소유합니다.
//! 루프가 끝나면 송신측이 드롭되어 하류의 프레임 스트림이 닫힙니다.
//!
//! # 사용 예시
//! ```ignore
//! let (mut engine, frame_rx) = CaptureEngine::builder()
//!     .settings(CaptureSettings::from_core(&config.capture))
//!     .build()?;
//!
//! engine.start().await?;
//! // frame_rx를 집계기에 연결
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use speedy_core::error::{PipelineError, SpeedyError};
use speedy_core::pipeline::{HealthStatus, Pipeline};
use speedy_core::types::Frame;

use crate::config::CaptureSettings;
use crate::source::{PacketSource, PcapSource, SourceEvent};
use crate::stats::{CaptureStats, CaptureStatsSnapshot};

/// 정지 시 읽기 스레드 종료를 기다리는 최소 시간
const MIN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 읽기 루프가 끝난 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderExit {
    /// 정지 요청
    Stopped,
    /// 소스 소진
    Exhausted,
    /// 하류 수신측이 닫힘
    ReceiverClosed,
    /// 읽기 에러
    Failed,
}

/// 캡처 엔진
pub struct CaptureEngine {
    settings: CaptureSettings,
    source: Mutex<Option<Box<dyn PacketSource>>>,
    frame_tx: Option<mpsc::Sender<Frame>>,
    running: Arc<AtomicBool>,
    reader_failed: Arc<AtomicBool>,
    reader_done: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
    reader: Option<JoinHandle<ReaderExit>>,
}

/// 캡처 엔진 빌더
///
/// `build()`는 `(CaptureEngine, mpsc::Receiver<Frame>)` 튜플을 반환하여
/// 프레임 수신자를 호출자에게 전달합니다.
pub struct CaptureEngineBuilder {
    settings: CaptureSettings,
    source: Option<Box<dyn PacketSource>>,
}

impl CaptureEngineBuilder {
    fn new() -> Self {
        Self {
            settings: CaptureSettings::default(),
            source: None,
        }
    }

    /// 캡처 설정을 지정합니다.
    pub fn settings(mut self, settings: CaptureSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 패킷 소스를 지정합니다.
    ///
    /// 지정하지 않으면 `start()` 시 설정의 인터페이스로 libpcap 핸들을 엽니다.
    pub fn source(mut self, source: impl PacketSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// 엔진과 프레임 수신 채널을 생성합니다.
    pub fn build(self) -> Result<(CaptureEngine, mpsc::Receiver<Frame>), SpeedyError> {
        self.settings.validate()?;
        if self.source.is_none() && self.settings.interface.is_empty() {
            return Err(
                PipelineError::InitFailed("capture interface is required".to_owned()).into(),
            );
        }

        let (frame_tx, frame_rx) = mpsc::channel(self.settings.channel_capacity);

        let engine = CaptureEngine {
            settings: self.settings,
            source: Mutex::new(self.source),
            frame_tx: Some(frame_tx),
            running: Arc::new(AtomicBool::new(false)),
            reader_failed: Arc::new(AtomicBool::new(false)),
            reader_done: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(CaptureStats::new()),
            reader: None,
        };

        Ok((engine, frame_rx))
    }
}

impl CaptureEngine {
    /// 빌더를 반환합니다.
    pub fn builder() -> CaptureEngineBuilder {
        CaptureEngineBuilder::new()
    }

    /// 현재 설정
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// 캡처 통계 복사본
    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }

    /// 엔진이 이동된 뒤에도 통계를 읽고 내보낼 수 있는 공유 핸들
    pub fn stats_handle(&self) -> Arc<CaptureStats> {
        Arc::clone(&self.stats)
    }

    /// 통계를 메트릭으로 내보냅니다.
    pub fn publish_stats(&self) {
        self.stats.publish();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// 블로킹 읽기 루프
fn capture_loop(
    mut source: Box<dyn PacketSource>,
    tx: &mpsc::Sender<Frame>,
    running: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
) -> ReaderExit {
    while running.load(Ordering::Acquire) {
        match source.next_event() {
            Ok(SourceEvent::Frame(frame)) => {
                stats.record_frame(frame.byte_length);
                if tx.blocking_send(frame).is_err() {
                    warn!("frame receiver closed, stopping capture loop");
                    return ReaderExit::ReceiverClosed;
                }
            }
            Ok(SourceEvent::Undecodable) => stats.record_undecodable(),
            Ok(SourceEvent::Timeout) => {}
            Ok(SourceEvent::Exhausted) => {
                info!("packet source exhausted");
                return ReaderExit::Exhausted;
            }
            Err(e) => {
                stats.record_read_error();
                error!(error = %e, "capture read failed, stopping capture loop");
                return ReaderExit::Failed;
            }
        }
    }
    ReaderExit::Stopped
}

impl Pipeline for CaptureEngine {
    /// 캡처 핸들을 열고 읽기 스레드를 시작합니다.
    async fn start(&mut self) -> Result<(), SpeedyError> {
        if self.is_running() {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let tx = self.frame_tx.take().ok_or_else(|| {
            PipelineError::InitFailed("frame channel already consumed".to_owned())
        })?;

        let source = match self.source.get_mut().take() {
            Some(source) => source,
            None => {
                info!(interface = %self.settings.interface, "opening capture handle");
                Box::new(PcapSource::open(&self.settings)?)
            }
        };

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);
        let failed = Arc::clone(&self.reader_failed);
        let done = Arc::clone(&self.reader_done);

        self.reader = Some(tokio::task::spawn_blocking(move || {
            let exit = capture_loop(source, &tx, running, stats);
            if exit == ReaderExit::Failed {
                failed.store(true, Ordering::Release);
            }
            done.store(true, Ordering::Release);
            // 상태 플래그를 먼저 기록한 뒤 스트림을 닫는다
            drop(tx);
            exit
        }));

        info!(interface = %self.settings.interface, "capture engine started");
        Ok(())
    }

    /// 읽기 스레드에 정지를 요청하고 종료를 기다립니다.
    ///
    /// 읽기 스레드는 다음 읽기 타임아웃에서 정지 플래그를 확인합니다.
    async fn stop(&mut self) -> Result<(), SpeedyError> {
        if !self.is_running() {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping capture engine");
        self.running.store(false, Ordering::Release);

        if let Some(reader) = self.reader.take() {
            let timeout = (self.settings.read_timeout() * 4).max(MIN_JOIN_TIMEOUT);
            match tokio::time::timeout(timeout, reader).await {
                Ok(Ok(exit)) => debug!(?exit, "capture loop exited"),
                Ok(Err(e)) => warn!(error = %e, "capture thread panicked"),
                Err(_) => warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "capture thread did not exit in time, detaching"
                ),
            }
        }

        self.stats.publish();
        info!("capture engine stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        if !self.is_running() {
            return HealthStatus::Unhealthy("not running".to_owned());
        }
        if self.reader_failed.load(Ordering::Acquire) {
            return HealthStatus::Unhealthy("capture read failed".to_owned());
        }
        if self.reader_done.load(Ordering::Acquire) {
            return HealthStatus::Degraded("capture loop ended".to_owned());
        }
        HealthStatus::Healthy
    }
}
