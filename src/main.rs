use application::PanelApp;
use config::Config;
use domain::summarize;
use futures::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("piece_watch=info,domain=info,application=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting piece map watcher");

    // Load configuration from environment variables
    let config = Config::from_env()?;
    let hash = std::env::args().nth(1).or_else(|| config.watch_hash.clone());
    let Some(hash) = hash else {
        anyhow::bail!("No torrent hash given: pass it as the first argument or set WATCH_HASH");
    };

    let app = PanelApp::from_config(&config)?;
    info!("⚙️  Backend settings: {}", app.settings().await.into_inner());

    let mut piece_maps = Box::pin(app.piece_maps());
    app.watch(&hash);
    info!("👀 Watching {} every {}ms", hash, config.poll_interval.as_millis());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_summary = None;
    loop {
        tokio::select! {
            map = piece_maps.next() => {
                let Some(map) = map else {
                    warn!("Piece map stream ended");
                    break;
                };
                let summary = summarize(&map);
                if last_summary != Some(summary) {
                    info!(
                        "📊 {} pieces: {} complete ({:.1}%), {} loading, {} empty, {} readers, {} in reader range",
                        summary.total,
                        summary.complete,
                        summary.complete_ratio() * 100.0,
                        summary.loading,
                        summary.empty,
                        summary.reader_positions,
                        summary.in_reader_range,
                    );
                    last_summary = Some(summary);
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    app.stop();
    info!("👋 Stopped watching {}", hash);

    Ok(())
}
