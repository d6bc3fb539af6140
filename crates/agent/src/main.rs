use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use client::{ReverseGeocoder, TrackingApiClient};
use domain::services::{InMemoryTrackingApi, TrackingApi};
use edutrack_agent::config::Config;
use edutrack_agent::logging;
use edutrack_agent::position::{PositionSource, ReplayPositionSource};
use edutrack_agent::sampler::PositionSampler;
use edutrack_agent::tracker::DeviceTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting Edutrack agent v{}", env!("CARGO_PKG_VERSION"));

    // Expose Prometheus metrics if enabled
    if config.metrics.enabled {
        let addr = config.metrics.socket_addr()?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Metrics listening on {}", addr);
    }

    // Wire the tracking backend
    let api: Arc<dyn TrackingApi> = match config.backend.kind.as_str() {
        "memory" => {
            warn!("Using the in-memory backend: state is lost on exit (demo mode)");
            Arc::new(InMemoryTrackingApi::new())
        }
        _ => Arc::new(TrackingApiClient::new(&config.backend.api_config())?),
    };

    // Wire the position source
    let source: Arc<dyn PositionSource> = match &config.agent.replay_path {
        Some(path) => {
            let source = ReplayPositionSource::from_jsonl_file(path)
                .with_context(|| format!("failed to load replay trace {}", path.display()))?;
            info!(path = %path.display(), "Loaded replay position trace");
            Arc::new(source)
        }
        None => {
            warn!("No position source configured; samples will read as unavailable");
            Arc::new(ReplayPositionSource::empty())
        }
    };

    let geocoder = ReverseGeocoder::new(config.geocoder.clone())?;
    let tracker = DeviceTracker::new(api, PositionSampler::new(source), geocoder);

    // Start tracking the configured devices
    for device_id in &config.agent.device_ids {
        match tracker.start_tracking(*device_id).await {
            Ok(()) => info!(device_id = %device_id, "Tracking started"),
            Err(e) => error!(device_id = %device_id, error = %e, "Failed to start tracking"),
        }
    }

    info!("Agent running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown: stop every loop and mark devices inactive
    info!("Shutting down");
    for device_id in &config.agent.device_ids {
        if let Err(e) = tracker.stop_tracking(*device_id).await {
            warn!(device_id = %device_id, error = %e, "Failed to stop tracking cleanly");
        }
    }
    info!("Shutdown complete");

    Ok(())
}
