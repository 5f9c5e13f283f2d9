//! PlateGuard Console - headless runner
//!
//! Runs the dashboard core against the configured backend and logs the
//! reconciled view and operator notifications. A rendering layer would
//! consume the same snapshots.

use plateguard_console::api_client::ApiClient;
use plateguard_console::config::AppConfig;
use plateguard_console::dashboard::{DashboardConfig, DashboardController};
use plateguard_console::notifier::Notifier;
use plateguard_console::status_classifier::display_priority;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plateguard_console=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PlateGuard console v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default();
    tracing::info!(
        api_base_url = %config.api_base_url,
        push_url = %config.push_channel_url(),
        feed_poll_sec = config.feed_poll_interval.as_secs(),
        telemetry_poll_sec = config.telemetry_poll_interval.as_secs(),
        "Configuration loaded"
    );

    let api = Arc::new(ApiClient::with_timeout(
        config.api_base_url.clone(),
        config.request_timeout,
    ));
    let notifier = Notifier::default();
    let mut notifications = notifier.subscribe();

    let dashboard = DashboardController::new(api, DashboardConfig::from(&config), notifier);
    dashboard.activate().await;

    tracing::info!("Dashboard active, press Ctrl-C to stop");

    let mut render_interval = tokio::time::interval(Duration::from_secs(10));
    render_interval.tick().await;

    loop {
        tokio::select! {
            _ = render_interval.tick() => {
                let feed = dashboard.feed().await;
                if let Some(latest) = feed.first() {
                    let still_bytes = latest
                        .decode_image()
                        .and_then(|r| r.ok())
                        .map(|bytes| bytes.len())
                        .unwrap_or(0);
                    tracing::info!(
                        entries = feed.len(),
                        plate = %latest.plate,
                        outcome = %latest.status,
                        still_bytes = still_bytes,
                        "Detection feed head"
                    );
                }

                let mut states = dashboard.camera_states().await;
                states.sort_by_key(|s| display_priority(s.status));
                for state in states {
                    tracing::info!(
                        camera_id = %state.camera_id,
                        phase = ?state.phase,
                        status = ?state.status,
                        "Camera"
                    );
                }
            }
            notification = notifications.recv() => {
                match notification {
                    Ok(n) => {
                        tracing::info!(
                            level = ?n.level,
                            camera_id = ?n.camera_id,
                            "{}",
                            n.message
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed = missed, "Notification stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    dashboard.deactivate().await;

    let stats = dashboard.stats().await;
    tracing::info!(
        total_today = stats.total_today,
        allowed_today = stats.allowed_today,
        blocked_today = stats.blocked_today,
        unknown_today = stats.unknown_today,
        "Final counters"
    );

    tracing::info!("Console stopped");
    Ok(())
}
