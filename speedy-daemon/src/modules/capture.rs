//! Capture engine module initialization.
//!
//! Converts `SpeedyConfig.capture` into `CaptureSettings`, builds the
//! `CaptureEngine` and wraps it in a `ModuleHandle`.
//!
//! # Channel Wiring
//!
//! ```text
//! libpcap --raw frame--> CaptureEngine --Frame--> frame_rx --> aggregator
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use speedy_capture::{
    CaptureEngine, CaptureEngineBuilder, CaptureSettings, CaptureStats, PacketSource,
};
use speedy_core::config::SpeedyConfig;
use speedy_core::types::Frame;

use super::ModuleHandle;

/// Module name used in logs and health reports.
pub const NAME: &str = "capture";

/// An initialized capture module.
pub struct CaptureModule {
    /// Registry handle.
    pub handle: ModuleHandle,
    /// Receiving side of the frame stream, for the aggregator.
    pub frame_rx: mpsc::Receiver<Frame>,
    /// Shared capture statistics.
    pub stats: Arc<CaptureStats>,
}

/// Initialize the capture module on the configured live interface.
pub fn init(config: &SpeedyConfig) -> Result<CaptureModule> {
    finish(builder(config))
}

/// Initialize the capture module reading from an explicit packet source.
pub fn init_with_source(config: &SpeedyConfig, source: impl PacketSource) -> Result<CaptureModule> {
    finish(builder(config).source(source))
}

fn builder(config: &SpeedyConfig) -> CaptureEngineBuilder {
    tracing::info!(interface = %config.capture.interface, "initializing capture engine");
    CaptureEngine::builder().settings(CaptureSettings::from_core(&config.capture))
}

fn finish(builder: CaptureEngineBuilder) -> Result<CaptureModule> {
    let (engine, frame_rx) = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build capture engine: {}", e))?;
    let stats = engine.stats_handle();

    Ok(CaptureModule {
        handle: ModuleHandle::new(NAME, Box::new(engine)),
        frame_rx,
        stats,
    })
}
