//! 메타데이터 변경 알림
//!
//! 장치의 IP 주소가 바뀌면 저장소가 [`MetadataNotifier::notify`]를 호출합니다.
//! 알림은 무제한 채널에 넣기만 하므로 프레임 처리 경로를 막지 않습니다.
//! [`spawn_dispatcher`]가 채널을 비우며 알림마다 별도 태스크에서
//! [`Sink::store_metadata`]를 호출합니다. 종료 시에는 큐에 남은 알림까지
//! 저장을 마친 뒤 끝납니다.
//!
//! ```text
//! DeviceStore::attribute ──notify──▶ unbounded mpsc ──▶ dispatcher ──spawn──▶ Sink::store_metadata
//! ```
//!
//! 알림 사이의 순서는 보장되지 않으며, 실패는 로그와 메트릭으로만 보고됩니다.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use speedy_core::pipeline::Sink;
use speedy_core::types::DeviceMetadata;

use crate::stats::record_sink_call;

/// 메타데이터 변경 알림 송신측
#[derive(Debug, Clone)]
pub struct MetadataNotifier {
    tx: mpsc::UnboundedSender<DeviceMetadata>,
}

impl MetadataNotifier {
    /// 알림 송신측과 수신측을 생성합니다.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DeviceMetadata>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// 변경된 메타데이터를 전달합니다. 절대 블로킹하지 않습니다.
    ///
    /// 수신측이 이미 닫혔으면(종료 중) 알림을 버립니다.
    pub fn notify(&self, metadata: DeviceMetadata) {
        if let Err(e) = self.tx.send(metadata) {
            debug!(mac = %e.0.mac, "metadata dispatcher closed, dropping notification");
        }
    }
}

/// 알림을 받아 싱크로 전달하는 디스패처 태스크를 시작합니다.
///
/// 모든 송신측이 닫히거나 `cancel`이 취소되면 채널을 닫고,
/// 이미 큐에 들어온 알림까지 저장 태스크로 넘긴 뒤
/// 진행 중인 저장 태스크가 모두 끝나면 종료합니다.
pub fn spawn_dispatcher<S: Sink>(
    mut rx: mpsc::UnboundedReceiver<DeviceMetadata>,
    sink: Arc<S>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(metadata) => {
                        in_flight.spawn(store_one(Arc::clone(&sink), metadata));
                    }
                    None => break,
                },
                _ = cancel.cancelled() => break,
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        rx.close();
        let mut drained = 0usize;
        while let Some(metadata) = rx.recv().await {
            in_flight.spawn(store_one(Arc::clone(&sink), metadata));
            drained += 1;
        }
        while in_flight.join_next().await.is_some() {}
        debug!(drained, "metadata dispatcher stopped");
    })
}

async fn store_one<S: Sink>(sink: Arc<S>, metadata: DeviceMetadata) {
    let started = Instant::now();
    let mac = metadata.mac;
    let result = sink.store_metadata(metadata).await;
    record_sink_call(sink.name(), "metadata", result.is_ok(), started.elapsed());
    if let Err(e) = result {
        warn!(%mac, backend = sink.name(), error = %e, "failed to store device metadata");
    }
}
