//! Module orchestration -- assembly, channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] validates the configuration, resolves the capture
//! interface, builds the capture engine, sink backend and aggregator, and
//! runs them until a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Capture engine (produces Frames)
//! 2. Aggregator (consumes Frames, writes to the sink)
//!
//! # Shutdown Order (same as startup)
//!
//! 1. Capture engine stops reading and closes the frame stream
//! 2. Aggregator drains queued frames, then stops its flush scheduler

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::time::MissedTickBehavior;

use speedy_aggregator::DeviceStore;
use speedy_capture::{CaptureStats, PacketSource};
use speedy_core::config::SpeedyConfig;
use speedy_core::metrics as m;
use speedy_core::types::MacAddr;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;
use crate::modules::{self, ModuleRegistry};
use crate::pid_file;

/// Interval between health log lines and uptime/capture metric updates.
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Validated configuration.
    config: SpeedyConfig,
    /// Capture and aggregator modules, in start/stop order.
    modules: ModuleRegistry,
    /// Capture statistics, published on every health tick.
    capture_stats: Arc<CaptureStats>,
    /// Aggregator device table.
    store: Arc<DeviceStore>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Build the orchestrator for live capture.
    ///
    /// # Errors
    ///
    /// - Configuration validation fails
    /// - `capture.interface` is empty, unknown, or has no addresses
    /// - The interface's MAC address cannot be read
    /// - The sink backend or a module cannot be constructed
    pub fn build_from_config(config: SpeedyConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let interface = config.capture.interface.as_str();
        if interface.is_empty() {
            return Err(anyhow::anyhow!("no capture interface configured"));
        }
        speedy_capture::ensure_active(interface)
            .map_err(|e| anyhow::anyhow!("cannot capture on '{}': {}", interface, e))?;
        let interface_mac = speedy_capture::interface_mac(interface)
            .map_err(|e| anyhow::anyhow!("failed to resolve MAC of '{}': {}", interface, e))?;
        tracing::info!(interface = %interface, mac = %interface_mac, "capture interface resolved");

        Self::install_metrics(&config)?;
        let capture = modules::capture::init(&config)?;
        Self::assemble(config, interface_mac, capture)
    }

    /// Build the orchestrator around an explicit packet source.
    ///
    /// No interface lookup happens and no metrics recorder is installed;
    /// `interface_mac` stands in for the capturing interface's address.
    pub fn build_with_source(
        config: SpeedyConfig,
        interface_mac: MacAddr,
        source: impl PacketSource,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        let capture = modules::capture::init_with_source(&config, source)?;
        Self::assemble(config, interface_mac, capture)
    }

    fn install_metrics(config: &SpeedyConfig) -> Result<()> {
        if !config.metrics.enabled {
            return Ok(());
        }
        metrics_server::install_metrics_recorder(&config.metrics)?;
        metrics::gauge!(
            m::DAEMON_BUILD_INFO,
            "version" => env!("CARGO_PKG_VERSION"),
            m::LABEL_BACKEND => config.sink.backend.clone()
        )
        .set(1.0);
        Ok(())
    }

    fn assemble(
        config: SpeedyConfig,
        interface_mac: MacAddr,
        capture: modules::capture::CaptureModule,
    ) -> Result<Self> {
        let aggregator = modules::aggregator::init(&config, interface_mac, capture.frame_rx)?;

        let mut registry = ModuleRegistry::new();
        registry.register(capture.handle);
        registry.register(aggregator.handle);

        tracing::info!(
            modules = ?registry.names(),
            backend = %aggregator.backend,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            modules: registry,
            capture_stats: capture.stats,
            store: aggregator.store,
            start_time: Instant::now(),
        })
    }

    /// Start all modules and run until SIGINT or SIGTERM.
    pub async fn run(&mut self) -> Result<()> {
        let signals = ShutdownSignals::install()?;
        self.run_until(signals.recv()).await
    }

    /// Start all modules and run until `shutdown` resolves.
    ///
    /// The PID file, when configured, exists exactly while modules run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = &'static str>,
    {
        let pid_path = self.pid_path();
        if let Some(path) = &pid_path {
            pid_file::write_pid_file(path)?;
        }

        if let Err(e) = self.modules.start_all().await {
            if let Some(path) = &pid_path {
                pid_file::remove_pid_file(path);
            }
            return Err(e);
        }

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + HEALTH_CHECK_INTERVAL,
            HEALTH_CHECK_INTERVAL,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("entering main event loop");
        tokio::pin!(shutdown);
        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break signal,
                _ = ticker.tick() => self.log_health().await,
            }
        };
        tracing::info!(signal = signal, "shutdown signal received");

        let result = self.shutdown().await;

        if let Some(path) = &pid_path {
            pid_file::remove_pid_file(path);
        }
        result
    }

    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all modules");
        let result = self.modules.stop_all().await;
        self.capture_stats.publish();
        result
    }

    async fn log_health(&self) {
        let report = self.health().await;
        self.capture_stats.publish();

        match &report.status {
            speedy_core::pipeline::HealthStatus::Healthy => tracing::debug!(
                uptime_secs = report.uptime_secs,
                devices = report.devices,
                "daemon healthy"
            ),
            status => tracing::warn!(
                uptime_secs = report.uptime_secs,
                devices = report.devices,
                status = ?status,
                "daemon not healthy"
            ),
        }
    }

    /// Current aggregated health; also refreshes the uptime gauge.
    pub async fn health(&self) -> DaemonHealth {
        let modules: Vec<ModuleHealth> = self
            .modules
            .health_statuses()
            .await
            .into_iter()
            .map(|(name, status)| ModuleHealth { name, status })
            .collect();

        let uptime_secs = self.start_time.elapsed().as_secs();
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);

        DaemonHealth {
            status: aggregate_status(&modules),
            uptime_secs,
            devices: self.store.len().await,
            modules,
        }
    }

    /// The validated configuration.
    pub fn config(&self) -> &SpeedyConfig {
        &self.config
    }

    /// The aggregator's device table.
    pub fn store(&self) -> Arc<DeviceStore> {
        Arc::clone(&self.store)
    }

    fn pid_path(&self) -> Option<PathBuf> {
        let pid_file = self.config.general.pid_file.as_str();
        (!pid_file.is_empty()).then(|| Path::new(pid_file).to_path_buf())
    }
}

/// Installed SIGTERM/SIGINT handlers.
struct ShutdownSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for either signal and return its name.
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}
