//! rhino-device entry point.
//!
//! Samples the (simulated) board and serves the REST API and the `/ws`
//! endpoint dashboards connect to.

use std::sync::Arc;

use rhino_panel::api;
use rhino_panel::app_state::AppState;
use rhino_panel::config::{DeviceConfig, init_tracing};
use rhino_panel::domain::{EventBus, IoState, SimulatedIo};
use rhino_panel::service::IoService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = DeviceConfig::from_env().map_err(|err| anyhow::anyhow!("{err}"))?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        adc_channels = config.adc_channels,
        "starting rhino-device"
    );

    // Build domain and service layers
    let event_bus = EventBus::new(config.event_bus_capacity);
    let io_service = Arc::new(IoService::new(IoState::new(config.adc_channels), event_bus));

    // Start sampling
    let _sampler = Arc::clone(&io_service).spawn_sampler(
        Box::new(SimulatedIo::new(config.adc_channels)),
        config.sample_interval,
    );

    // Build router
    let app = api::build_app(AppState::new(io_service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
