//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 캡처 모듈이 생산하는 [`Frame`], 집계 모듈이 내보내는 [`DeviceReport`] /
//! [`DeviceMetadata`], 그리고 장치 식별자인 [`MacAddr`]를 정의합니다.
//! 모듈 간에는 항상 이 타입들의 값 복사본만 오갑니다.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 48비트 하드웨어(MAC) 주소
///
/// 정규 문자열 표현은 소문자 콜론 구분 형식(`aa:bb:cc:dd:ee:ff`)이며,
/// 직렬화 시에도 이 형식을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// 6바이트 배열로부터 주소를 생성합니다.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// 원시 바이트를 반환합니다.
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// 링크 계층 브로드캐스트 범위 여부 (첫 바이트가 0xFF)
    pub const fn is_broadcast(&self) -> bool {
        self.0[0] == 0xFF
    }

    /// IPv6 멀티캐스트 범위 여부 (`33:33:xx:xx:xx:xx`)
    pub const fn is_ipv6_multicast(&self) -> bool {
        self.0[0] == 0x33 && self.0[1] == 0x33
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// MAC 주소 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mac address '{input}': expected six hex octets separated by ':' or '-'")]
pub struct ParseMacError {
    /// 파싱에 실패한 원본 문자열
    pub input: String,
}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMacError {
            input: s.to_owned(),
        };

        let trimmed = s.trim();
        let mut octets = [0u8; 6];
        let mut parts = trimmed.split([':', '-']);
        for octet in &mut octets {
            let part = parts.next().ok_or_else(err)?;
            if part.len() != 2 {
                return Err(err());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 프레임에서 디코딩된 IP 계층 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IP 계층 없음 (ARP 등) 또는 디코딩 실패
    #[default]
    None,
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl IpVersion {
    /// 숫자 표현 (0, 4, 6)
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }

    /// IP 계층이 존재하는지 여부
    pub const fn has_ip(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// 디코딩된 링크 계층 프레임
///
/// 캡처 모듈이 생산하고 분류기가 소비합니다.
/// 유일하게 허용되는 변경은 분류기의 방향 정규화(출발지/목적지 교환)이며,
/// 프레임을 값으로 넘겨받아 한 번만 수행됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// 이더넷 페이로드 크기 (헤더 제외, 바이트)
    pub byte_length: u16,
    /// 전송 계층(TCP/UDP) 페이로드 크기 — 참고용
    pub payload_length: u16,
    /// 출발지 MAC
    pub source_mac: MacAddr,
    /// 목적지 MAC
    pub dest_mac: MacAddr,
    /// 출발지 IP (`ip_version`이 4 또는 6일 때만 존재)
    pub source_ip: Option<IpAddr>,
    /// 목적지 IP (`ip_version`이 4 또는 6일 때만 존재)
    pub dest_ip: Option<IpAddr>,
    /// IP 계층 버전
    pub ip_version: IpVersion,
}

impl Frame {
    /// 출발지와 목적지(MAC, IP)를 서로 교환합니다.
    pub fn swap_endpoints(&mut self) {
        std::mem::swap(&mut self.source_mac, &mut self.dest_mac);
        std::mem::swap(&mut self.source_ip, &mut self.dest_ip);
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ipv{} bytes={}",
            self.source_mac, self.dest_mac, self.ip_version, self.byte_length,
        )
    }
}

/// 플러시 시점의 장치별 카운터 스냅샷
///
/// 싱크의 배치 저장 연산에 전달되는 값 복사본입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    /// 장치 MAC
    pub mac: MacAddr,
    /// 마지막으로 관측된 IPv4 주소
    pub ipv4: Option<Ipv4Addr>,
    /// 마지막으로 관측된 IPv6 주소
    pub ipv6: Option<Ipv6Addr>,
    /// 직전 플러시 이후 누적 업로드 바이트
    pub upload_bytes: u64,
    /// 직전 플러시 이후 누적 다운로드 바이트
    pub download_bytes: u64,
}

impl DeviceReport {
    /// 주소 메타데이터 부분만 추출합니다.
    pub fn metadata(&self) -> DeviceMetadata {
        DeviceMetadata {
            mac: self.mac,
            ipv4: self.ipv4,
            ipv6: self.ipv6,
        }
    }
}

/// 장치 주소 메타데이터
///
/// IP 주소가 바뀌었을 때 싱크의 메타데이터 저장 연산에 전달됩니다.
/// 변경된 필드만이 아니라 현재 IPv4/IPv6 쌍 전체를 담습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// 장치 MAC
    pub mac: MacAddr,
    /// 현재 IPv4 주소
    pub ipv4: Option<Ipv4Addr>,
    /// 현재 IPv6 주소
    pub ipv6: Option<Ipv6Addr>,
}

impl fmt::Display for DeviceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mac)?;
        if let Some(ip) = self.ipv4 {
            write!(f, " ipv4={ip}")?;
        }
        if let Some(ip) = self.ipv6 {
            write!(f, " ipv6={ip}")?;
        }
        Ok(())
    }
}
