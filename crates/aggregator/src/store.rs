//! 집계 저장소 — MAC 키 기반 장치 레코드 맵
//!
//! [`DeviceStore`]는 프레임 소비 태스크(쓰기)와 플러시 스케줄러(스냅샷/제거)가
//! 동시에 접근하는 유일한 공유 상태입니다. 모든 연산은 하나의 `RwLock` 아래에서
//! 원자적으로 수행되므로, 어떤 귀속도 두 플러시에 중복 집계되거나 누락되지 않습니다.
//!
//! IP 변경 알림은 락을 놓은 뒤 [`MetadataNotifier`]로 전달됩니다.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use speedy_core::types::{DeviceMetadata, DeviceReport, MacAddr};

use crate::classifier::Attribution;
use crate::device::DeviceRecord;
use crate::notifier::MetadataNotifier;

/// 장치별 집계 저장소
#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: RwLock<HashMap<MacAddr, DeviceRecord>>,
    notifier: Option<MetadataNotifier>,
}

impl DeviceStore {
    /// 알림 없이 동작하는 저장소
    pub fn new() -> Self {
        Self::default()
    }

    /// IP 변경 시 `notifier`로 알림을 보내는 저장소
    pub fn with_notifier(notifier: MetadataNotifier) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            notifier: Some(notifier),
        }
    }

    /// 귀속 결과를 해당 장치 레코드에 누적합니다.
    ///
    /// 레코드가 없으면 만들고, IP 주소가 바뀌었으면 현재 주소 쌍을 반환하며
    /// 알림도 보냅니다.
    pub async fn attribute(
        &self,
        attribution: &Attribution,
        now: Instant,
    ) -> Option<DeviceMetadata> {
        let changed = {
            let mut devices = self.devices.write().await;
            let record = devices
                .entry(attribution.mac)
                .or_insert_with(|| DeviceRecord::new(attribution.mac, now));
            let changed = record.record(
                attribution.direction,
                u64::from(attribution.bytes),
                attribution.ip,
                now,
            );
            changed.then(|| record.metadata())
        };

        if let Some(metadata) = &changed {
            debug!(%metadata, "device address changed");
            if let Some(notifier) = &self.notifier {
                notifier.notify(metadata.clone());
            }
        }
        changed
    }

    /// 모든 장치의 현재 카운터를 복사하고 0으로 초기화합니다.
    ///
    /// 주소와 마지막 갱신 시각은 유지되므로 플러시만으로는 장치가 제거되지 않습니다.
    pub async fn snapshot_and_reset(&self) -> Vec<DeviceReport> {
        let mut devices = self.devices.write().await;
        devices
            .values_mut()
            .map(|record| {
                let report = record.report();
                record.reset_counters();
                report
            })
            .collect()
    }

    /// 마지막 갱신 이후 `threshold`보다 오래된 장치를 제거하고 제거 수를 반환합니다.
    pub async fn evict(&self, now: Instant, threshold: Duration) -> usize {
        let mut devices = self.devices.write().await;
        let before = devices.len();
        devices.retain(|mac, record| {
            let stale = record.is_stale(now, threshold);
            if stale {
                debug!(%mac, "evicting stale device");
            }
            !stale
        });
        before - devices.len()
    }

    /// 추적 중인 장치 수
    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    /// 추적 중인 장치가 없는지 여부
    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// 한 장치의 현재 카운터 복사본
    pub async fn get(&self, mac: &MacAddr) -> Option<DeviceReport> {
        self.devices.read().await.get(mac).map(DeviceRecord::report)
    }
}
