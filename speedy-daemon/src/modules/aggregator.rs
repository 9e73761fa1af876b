//! Aggregator module initialization.
//!
//! Selects the sink backend from `SpeedyConfig.sink`, builds the
//! `Aggregator` around the capture frame stream and wraps it in a
//! `ModuleHandle`.
//!
//! # Channel Wiring
//!
//! ```text
//! frame_rx --> Aggregator --batch / metadata--> SinkBackend
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use speedy_aggregator::{AggregatorBuilder, DeviceStore};
use speedy_core::config::SpeedyConfig;
use speedy_core::types::{Frame, MacAddr};
use speedy_sink::SinkBackend;

use super::ModuleHandle;

/// Module name used in logs and health reports.
pub const NAME: &str = "aggregator";

/// An initialized aggregator module.
pub struct AggregatorModule {
    /// Registry handle.
    pub handle: ModuleHandle,
    /// Shared device table, for health reporting.
    pub store: Arc<DeviceStore>,
    /// Name of the selected sink backend.
    pub backend: String,
}

/// Initialize the aggregator module.
///
/// `interface_mac` is the capturing interface's own address; frames sent
/// from it are attributed to their destination as download traffic.
pub fn init(
    config: &SpeedyConfig,
    interface_mac: MacAddr,
    frame_rx: mpsc::Receiver<Frame>,
) -> Result<AggregatorModule> {
    let sink = SinkBackend::from_config(&config.sink)
        .map_err(|e| anyhow::anyhow!("failed to create sink backend: {}", e))?;
    let backend = config.sink.backend.clone();

    tracing::info!(
        interface_mac = %interface_mac,
        backend = %backend,
        flush_interval_secs = config.aggregator.flush_interval_secs,
        "initializing aggregator"
    );

    let aggregator = AggregatorBuilder::new()
        .config(&config.aggregator)
        .sink(Arc::new(sink))
        .interface_mac(interface_mac)
        .frame_receiver(frame_rx)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build aggregator: {}", e))?;
    let store = aggregator.store();

    Ok(AggregatorModule {
        handle: ModuleHandle::new(NAME, Box::new(aggregator)),
        store,
        backend,
    })
}
