//! Configuration precedence tests.
//!
//! defaults < file < `SPEEDY_*` environment < command line

use std::io::Write;

use clap::Parser;
use serial_test::serial;
use tempfile::NamedTempFile;

use speedy_core::config::SpeedyConfig;
use speedy_daemon::cli::DaemonCli;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(contents.as_bytes()).expect("should write config");
    file
}

async fn load(cli: &DaemonCli) -> SpeedyConfig {
    let mut config = match &cli.config {
        Some(path) => SpeedyConfig::from_file(path)
            .await
            .expect("should read config"),
        None => SpeedyConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
}

#[tokio::test]
#[serial]
async fn test_file_values_are_used() {
    // Given: A config file naming an interface and database
    let file = write_config(
        r#"
[capture]
interface = "enp3s0"

[sink]
database = "home"
"#,
    );
    let cli = DaemonCli::parse_from(["speedy", "--config", file.path().to_str().unwrap()]);

    // When: Loading
    let config = load(&cli).await;

    // Then: File values win over defaults
    assert_eq!(config.capture.interface, "enp3s0");
    assert_eq!(config.sink.database, "home");
    assert_eq!(config.sink.url, "http://localhost:8086");
    config.validate().expect("should be valid");
}

#[tokio::test]
#[serial]
async fn test_environment_overrides_file() {
    // Given: A file and an environment override for the same field
    let file = write_config("[capture]\ninterface = \"enp3s0\"\n");
    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::set_var("SPEEDY_CAPTURE_INTERFACE", "wlan0") };
    let cli = DaemonCli::parse_from(["speedy", "--config", file.path().to_str().unwrap()]);

    // When: Loading
    let config = load(&cli).await;
    unsafe { std::env::remove_var("SPEEDY_CAPTURE_INTERFACE") };

    // Then: The environment wins
    assert_eq!(config.capture.interface, "wlan0");
}

#[tokio::test]
#[serial]
async fn test_cli_overrides_environment() {
    // Given: Environment and CLI both set the interface and URL
    unsafe {
        std::env::set_var("SPEEDY_CAPTURE_INTERFACE", "wlan0");
        std::env::set_var("SPEEDY_SINK_URL", "http://env-influx:8086");
    }
    let cli = DaemonCli::parse_from(["speedy", "-i", "eth1", "--db-url", "http://cli-influx:8086"]);

    // When: Loading without a config file
    let config = load(&cli).await;
    unsafe {
        std::env::remove_var("SPEEDY_CAPTURE_INTERFACE");
        std::env::remove_var("SPEEDY_SINK_URL");
    }

    // Then: The command line wins
    assert_eq!(config.capture.interface, "eth1");
    assert_eq!(config.sink.url, "http://cli-influx:8086");
}

#[tokio::test]
#[serial]
async fn test_cli_backend_override_is_validated() {
    // Given: An unknown backend on the command line
    let cli = DaemonCli::parse_from(["speedy", "--db", "mongodb"]);

    // When: Loading and validating
    let config = load(&cli).await;

    // Then: Validation names the field
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("sink.backend"), "got: {err}");
}
