//! 장치 레코드 — MAC 하나에 대한 누적 카운터와 마지막 관측 주소

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use tokio::time::Instant;

use speedy_core::types::{DeviceMetadata, DeviceReport, MacAddr};

use crate::classifier::Direction;

/// 장치 레코드
///
/// 집계 저장소가 소유하며 외부에는 [`DeviceReport`] / [`DeviceMetadata`]
/// 값 복사본으로만 노출됩니다.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    mac: MacAddr,
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
    upload_bytes: u64,
    download_bytes: u64,
    last_modified: Instant,
}

impl DeviceRecord {
    /// 카운터 0, 주소 없음 상태의 새 레코드
    pub fn new(mac: MacAddr, now: Instant) -> Self {
        Self {
            mac,
            ipv4: None,
            ipv6: None,
            upload_bytes: 0,
            download_bytes: 0,
            last_modified: now,
        }
    }

    /// 귀속된 바이트를 누적하고 주소를 갱신합니다.
    ///
    /// 해당 주소 계열의 IP가 이전 값과 다르면 `true`를 반환합니다.
    /// 이전 값이 없던 경우(첫 관측)도 변경으로 취급합니다.
    pub fn record(
        &mut self,
        direction: Direction,
        bytes: u64,
        ip: Option<IpAddr>,
        now: Instant,
    ) -> bool {
        match direction {
            Direction::Upload => self.upload_bytes = self.upload_bytes.saturating_add(bytes),
            Direction::Download => {
                self.download_bytes = self.download_bytes.saturating_add(bytes);
            }
        }
        self.last_modified = now;

        match ip {
            Some(IpAddr::V4(v4)) => replace_if_changed(&mut self.ipv4, v4),
            Some(IpAddr::V6(v6)) => replace_if_changed(&mut self.ipv6, v6),
            None => false,
        }
    }

    /// 현재 카운터와 주소의 스냅샷
    pub fn report(&self) -> DeviceReport {
        DeviceReport {
            mac: self.mac,
            ipv4: self.ipv4,
            ipv6: self.ipv6,
            upload_bytes: self.upload_bytes,
            download_bytes: self.download_bytes,
        }
    }

    /// 현재 주소 쌍
    pub fn metadata(&self) -> DeviceMetadata {
        DeviceMetadata {
            mac: self.mac,
            ipv4: self.ipv4,
            ipv6: self.ipv6,
        }
    }

    /// 카운터만 0으로 되돌립니다. 주소와 마지막 갱신 시각은 유지됩니다.
    pub fn reset_counters(&mut self) {
        self.upload_bytes = 0;
        self.download_bytes = 0;
    }

    /// 마지막 갱신 이후 `threshold`보다 오래 지났는지 여부
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_modified) > threshold
    }

    /// 장치 MAC
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// 누적 업로드 바이트
    pub fn upload_bytes(&self) -> u64 {
        self.upload_bytes
    }

    /// 누적 다운로드 바이트
    pub fn download_bytes(&self) -> u64 {
        self.download_bytes
    }

    /// 마지막 갱신 시각
    pub fn last_modified(&self) -> Instant {
        self.last_modified
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}
