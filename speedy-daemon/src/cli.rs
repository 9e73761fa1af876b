//! CLI argument definitions for the `speedy` binary.
//!
//! Uses `clap` v4 derive macros. Every flag that maps onto a configuration
//! field takes precedence over the config file and `SPEEDY_*` environment
//! variables.

use std::path::PathBuf;

use clap::Parser;

use speedy_core::config::SpeedyConfig;

/// Per-device network usage monitor.
///
/// Captures traffic on one interface, accumulates upload/download byte
/// counts per device MAC address and writes them to a time-series backend
/// once per flush interval.
#[derive(Parser, Debug, Default)]
#[command(name = "speedy")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to a speedy.toml configuration file.
    ///
    /// When omitted, built-in defaults and environment variables are used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Network interface to capture on (e.g. eth0).
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Persistence backend (influxdb, timescaledb, stdout).
    #[arg(long = "db")]
    pub backend: Option<String>,

    /// Backend URL (`http://` for influxdb, `postgres://` for timescaledb).
    #[arg(long)]
    pub db_url: Option<String>,

    /// Database name, or the measures table for timescaledb.
    #[arg(long)]
    pub db_name: Option<String>,

    /// Database user. Leave empty to disable authentication.
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password.
    #[arg(long)]
    pub db_pass: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override PID file path.
    #[arg(long)]
    pub pid_file: Option<String>,

    /// Validate configuration and exit without starting capture.
    #[arg(long)]
    pub validate: bool,

    /// List interfaces that can be captured on and exit.
    #[arg(long)]
    pub list_interfaces: bool,

    /// List supported persistence backends and exit.
    #[arg(long)]
    pub list_backends: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut SpeedyConfig) {
        override_with(&mut config.capture.interface, &self.interface);
        override_with(&mut config.sink.backend, &self.backend);
        override_with(&mut config.sink.url, &self.db_url);
        override_with(&mut config.sink.database, &self.db_name);
        override_with(&mut config.sink.username, &self.db_user);
        override_with(&mut config.sink.password, &self.db_pass);
        override_with(&mut config.general.log_level, &self.log_level);
        override_with(&mut config.general.log_format, &self.log_format);
        override_with(&mut config.general.pid_file, &self.pid_file);
    }
}

fn override_with(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_interface_and_db_flags() {
        let cli = DaemonCli::parse_from([
            "speedy",
            "-i",
            "enp3s0",
            "--db",
            "stdout",
            "--db-url",
            "http://influx:8086",
            "--db-user",
            "admin",
        ]);
        assert_eq!(cli.interface.as_deref(), Some("enp3s0"));
        assert_eq!(cli.backend.as_deref(), Some("stdout"));
        assert_eq!(cli.db_url.as_deref(), Some("http://influx:8086"));
        assert_eq!(cli.db_user.as_deref(), Some("admin"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn overrides_only_given_fields() {
        let cli = DaemonCli {
            interface: Some("wlan0".to_owned()),
            db_name: Some("home".to_owned()),
            ..DaemonCli::default()
        };
        let mut config = SpeedyConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.capture.interface, "wlan0");
        assert_eq!(config.sink.database, "home");
        assert_eq!(config.sink.url, "http://localhost:8086");
        assert_eq!(config.sink.backend, "influxdb");
    }

    #[test]
    fn list_flags_default_to_false() {
        let cli = DaemonCli::parse_from(["speedy"]);
        assert!(!cli.list_interfaces);
        assert!(!cli.list_backends);
        assert!(!cli.validate);
    }
}
