use anyhow::Result;
use fwmonitor::config::AppConfig;
use fwmonitor::{ConnectionManager, ConnectionStatus};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    let url = app_config.server.url();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        url = %url,
        "{} starting",
        env!("CARGO_PKG_NAME")
    );

    let (client, connection) = ConnectionManager::connect(url, app_config.connection_options());

    let mut stats_tick = interval(Duration::from_secs(
        app_config.monitoring.stats_log_interval_secs,
    ));
    stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = stats_tick.tick() => {
                let connected = client.status() == ConnectionStatus::Connected;
                match client.latest_view() {
                    Some(view) => {
                        let s = &view.summary;
                        tracing::info!(
                            connected,
                            total_packets = s.total_packets,
                            total_bytes = s.total_bytes,
                            day_packets = s.day_packets,
                            day_bytes = s.day_bytes,
                            inc_packets = s.inc_packets,
                            inc_bytes = s.inc_bytes,
                            sources = s.input.len(),
                            top_country = s.country.first().map(|e| e.key.as_str()).unwrap_or("-"),
                            "traffic stats"
                        );
                    }
                    None => tracing::info!(connected, "traffic stats: no snapshot yet"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                client.close().await;
                break;
            }
        }
    }

    let _ = connection.await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
