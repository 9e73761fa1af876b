//! 프레임 분류기 — 방향 정규화, 브로드캐스트/멀티캐스트 필터, 방향 결정
//!
//! 분류는 순수 함수 [`classify`]로 수행됩니다.
//!
//! 1. 출발지 MAC이 감시 인터페이스의 MAC과 같으면 출발지/목적지를 교환합니다.
//!    귀속 키와 IP 메타데이터가 항상 원격 장치를 가리키도록 하기 위함입니다.
//! 2. 정규화 후 목적지가 `FF:..`(브로드캐스트) 또는 `33:33:..`(IPv6 멀티캐스트)이면 버립니다.
//! 3. 교환된 프레임은 다운로드, 나머지는 업로드로 귀속합니다.
//! 4. 귀속 키는 (정규화된) 출발지 MAC, 기록할 IP는 (정규화된) 출발지 IP입니다.
//!
//! 어떤 입력도 에러가 되지 않습니다. IP 계층이 없는 프레임도 바이트는 집계됩니다.

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use speedy_core::types::{Frame, MacAddr};

/// 트래픽 방향
///
/// 감시 지점에서 장치 쪽으로 흐르는 트래픽이 다운로드,
/// 장치에서 시작되어 감시 지점을 지나 나가는 트래픽이 업로드입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 장치 → 외부
    Upload,
    /// 외부 → 장치
    Download,
}

impl Direction {
    /// 메트릭 레이블용 문자열
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 프레임을 버린 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// 목적지가 링크 계층 브로드캐스트 범위
    Broadcast,
    /// 목적지가 IPv6 멀티캐스트 범위
    Ipv6Multicast,
}

impl DropReason {
    /// 메트릭 레이블용 문자열
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Ipv6Multicast => "ipv6_multicast",
        }
    }
}

/// 한 프레임을 한 장치에 귀속한 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// 원격 장치 MAC (귀속 키)
    pub mac: MacAddr,
    /// 트래픽 방향
    pub direction: Direction,
    /// 누적할 바이트 수
    pub bytes: u16,
    /// 장치에 기록할 IP (IP 계층이 있을 때만)
    pub ip: Option<IpAddr>,
}

/// 분류 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 장치에 귀속
    Attribute(Attribution),
    /// 어떤 장치에도 귀속하지 않음
    Drop(DropReason),
}

/// 프레임을 분류합니다.
///
/// 프레임을 값으로 받으므로 방향 정규화(교환)는 프레임당 정확히 한 번만 일어납니다.
pub fn classify(mut frame: Frame, interface_mac: MacAddr) -> Verdict {
    let swapped = frame.source_mac == interface_mac;
    if swapped {
        frame.swap_endpoints();
    }

    if frame.dest_mac.is_broadcast() {
        return Verdict::Drop(DropReason::Broadcast);
    }
    if frame.dest_mac.is_ipv6_multicast() {
        return Verdict::Drop(DropReason::Ipv6Multicast);
    }

    let direction = if swapped {
        Direction::Download
    } else {
        Direction::Upload
    };

    let ip = if frame.ip_version.has_ip() {
        frame.source_ip
    } else {
        None
    };

    Verdict::Attribute(Attribution {
        mac: frame.source_mac,
        direction,
        bytes: frame.byte_length,
        ip,
    })
}
