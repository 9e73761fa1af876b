//! 네트워크 인터페이스 조회
//!
//! - [`active_interfaces`]: 주소가 하나 이상 할당된 캡처 가능 장치 목록
//! - [`interface_mac`]: `/sys/class/net/<name>/address`에서 읽은 하드웨어 주소

use std::path::{Component, Path};

use tracing::debug;

use speedy_core::types::MacAddr;

use crate::error::CaptureEngineError;

/// sysfs 네트워크 클래스 디렉토리
pub const SYSFS_NET_DIR: &str = "/sys/class/net";

/// 주소가 하나 이상 할당된 인터페이스 이름을 반환합니다.
pub fn active_interfaces() -> Result<Vec<String>, CaptureEngineError> {
    let devices =
        pcap::Device::list().map_err(|e| CaptureEngineError::Interface(e.to_string()))?;

    let names: Vec<String> = devices
        .into_iter()
        .filter(|d| !d.addresses.is_empty())
        .map(|d| d.name)
        .collect();
    debug!(count = names.len(), "enumerated active interfaces");
    Ok(names)
}

/// `name`이 활성 인터페이스인지 확인합니다.
pub fn ensure_active(name: &str) -> Result<(), CaptureEngineError> {
    let active = active_interfaces()?;
    if active.iter().any(|n| n == name) {
        Ok(())
    } else {
        Err(CaptureEngineError::Interface(format!(
            "'{name}' is not an active interface (active: {})",
            active.join(", ")
        )))
    }
}

/// 인터페이스의 MAC 주소를 조회합니다.
pub fn interface_mac(name: &str) -> Result<MacAddr, CaptureEngineError> {
    interface_mac_in(Path::new(SYSFS_NET_DIR), name)
}

/// `sys_net_dir` 아래에서 인터페이스의 MAC 주소를 조회합니다.
pub fn interface_mac_in(sys_net_dir: &Path, name: &str) -> Result<MacAddr, CaptureEngineError> {
    let mac_err = |reason: String| CaptureEngineError::Mac {
        interface: name.to_owned(),
        reason,
    };

    // 인터페이스 이름은 단일 경로 컴포넌트여야 함
    let mut components = Path::new(name).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(mac_err("invalid interface name".to_owned()));
    }

    let path = sys_net_dir.join(name).join("address");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| mac_err(format!("{}: {e}", path.display())))?;
    content
        .parse::<MacAddr>()
        .map_err(|e| mac_err(e.to_string()))
}
