//! Orchestrator integration tests.
//!
//! Drives the full module wiring (capture -> aggregator -> sink) from a
//! replayed packet source, without libpcap or a live interface.

use std::sync::Arc;
use std::time::Duration;

use etherparse::PacketBuilder;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use speedy_capture::ReplaySource;
use speedy_core::config::SpeedyConfig;
use speedy_core::types::{DeviceReport, MacAddr};
use speedy_daemon::orchestrator::Orchestrator;

const ROUTER: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
const LAPTOP: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

const LAPTOP_IP: [u8; 4] = [192, 168, 1, 20];
const RESOLVER_IP: [u8; 4] = [1, 1, 1, 1];

fn udp_frame(src: [u8; 6], dst: [u8; 6], ips: ([u8; 4], [u8; 4]), payload: usize) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(src, dst)
        .ipv4(ips.0, ips.1, 64)
        .udp(40000, 53);
    let mut out = Vec::new();
    builder.write(&mut out, &vec![0u8; payload]).unwrap();
    out
}

fn empty_source() -> ReplaySource {
    ReplaySource::new(Vec::<Vec<u8>>::new())
}

/// Helper to create a config that needs no live interface or database.
fn stdout_config(pid_file: &str) -> SpeedyConfig {
    let toml_str = format!(
        r#"
[general]
log_level = "info"
pid_file = "{pid_file}"

[capture]
channel_capacity = 16

[aggregator]
flush_interval_secs = 60

[sink]
backend = "stdout"
"#
    );
    SpeedyConfig::parse(&toml_str).expect("failed to parse test config")
}

async fn wait_for_device(store: &speedy_aggregator::DeviceStore, mac: &MacAddr) -> DeviceReport {
    loop {
        if let Some(report) = store.get(mac).await {
            return report;
        }
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_replayed_frames_are_attributed_end_to_end() {
    // Given: An orchestrator reading two laptop uploads and one router reply
    let source = ReplaySource::new([
        udp_frame(LAPTOP, ROUTER, (LAPTOP_IP, RESOLVER_IP), 100),
        udp_frame(LAPTOP, ROUTER, (LAPTOP_IP, RESOLVER_IP), 50),
        udp_frame(ROUTER, LAPTOP, (RESOLVER_IP, LAPTOP_IP), 400),
    ]);
    let mut orchestrator = Orchestrator::build_with_source(
        stdout_config(""),
        MacAddr::new(ROUTER),
        source,
    )
    .expect("should build orchestrator");
    let store = orchestrator.store();
    let observed = Arc::new(Mutex::new(None));

    // When: Running until the laptop's counters include all three frames
    let slot = Arc::clone(&observed);
    let run = orchestrator.run_until(async move {
        let laptop = MacAddr::new(LAPTOP);
        loop {
            let report = wait_for_device(&store, &laptop).await;
            if report.download_bytes > 0 {
                *slot.lock().await = Some(report);
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        "test"
    });
    timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .expect("run should succeed");

    // Then: Uploads and the download were credited to the laptop
    let report = observed.lock().await.take().expect("report observed");
    assert_eq!(report.upload_bytes, 2 * (20 + 8) + 150);
    assert_eq!(report.download_bytes, 20 + 8 + 400);
    assert_eq!(report.ipv4, Some("192.168.1.20".parse().unwrap()));
}

#[tokio::test]
async fn test_pid_file_exists_only_while_running() {
    // Given: A configured PID file path
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("speedy.pid");
    let config = stdout_config(pid_path.to_str().unwrap());
    let mut orchestrator =
        Orchestrator::build_with_source(config, MacAddr::new(ROUTER), empty_source())
            .expect("should build orchestrator");

    // When: Checking the file from inside the run
    let seen = pid_path.clone();
    let run = orchestrator.run_until(async move {
        assert!(seen.exists(), "PID file should exist while running");
        "test"
    });
    timeout(Duration::from_secs(5), run)
        .await
        .expect("run should finish")
        .expect("run should succeed");

    // Then: The file is removed after shutdown
    assert!(!pid_path.exists(), "PID file should be removed on shutdown");
}

#[tokio::test]
async fn test_existing_pid_file_prevents_start() {
    // Given: A PID file left by another instance
    let temp_dir = TempDir::new().expect("should create temp dir");
    let pid_path = temp_dir.path().join("speedy.pid");
    std::fs::write(&pid_path, "4242").unwrap();
    let config = stdout_config(pid_path.to_str().unwrap());
    let mut orchestrator =
        Orchestrator::build_with_source(config, MacAddr::new(ROUTER), empty_source())
            .expect("should build orchestrator");

    // When: Running
    let err = orchestrator
        .run_until(async { "test" })
        .await
        .expect_err("second instance should not start");

    // Then: The other instance's file is untouched
    assert!(err.to_string().contains("4242"));
    assert_eq!(std::fs::read_to_string(&pid_path).unwrap(), "4242");
}

#[tokio::test]
async fn test_health_before_start_is_unhealthy() {
    // Given: A built but not started orchestrator
    let orchestrator = Orchestrator::build_with_source(
        stdout_config(""),
        MacAddr::new(ROUTER),
        empty_source(),
    )
    .expect("should build orchestrator");

    // When: Querying health
    let health = orchestrator.health().await;

    // Then: Both modules report and the daemon is unhealthy
    assert_eq!(health.modules.len(), 2);
    assert_eq!(health.modules[0].name, "capture");
    assert_eq!(health.modules[1].name, "aggregator");
    assert!(health.status.is_unhealthy());
    assert_eq!(health.devices, 0);
}

#[test]
fn test_invalid_backend_is_rejected_at_build() {
    // Given: A config naming an unsupported backend
    let mut config = stdout_config("");
    config.sink.backend = "mongodb".to_owned();

    // When: Building
    let result = Orchestrator::build_with_source(config, MacAddr::new(ROUTER), empty_source());

    // Then: Validation fails
    let err = result.err().expect("build should fail").to_string();
    assert!(err.contains("sink.backend"), "got: {err}");
}

#[test]
fn test_live_build_requires_interface() {
    // Given: A config without an interface
    let config = stdout_config("");

    // When/Then: The live build refuses to start
    let err = Orchestrator::build_from_config(config)
        .err()
        .expect("build should fail")
        .to_string();
    assert!(err.contains("no capture interface"), "got: {err}");
}
